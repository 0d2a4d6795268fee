//! Mail account and alias administration
//!
//! - **resolver**: classify an address by what the directory holds for it
//! - **manager**: the user/alias state machine and its mutations
//! - **dn**: naming patterns for new entries
//! - **events**: records of applied mutations and their sinks
//! - **session**: connect a manager from configuration

mod cache;
mod dn;
mod events;
mod manager;
pub mod resolver;
pub mod schema;
mod session;
mod status;

pub use cache::LookupCache;
pub use dn::{DnPattern, DnPatternError};
pub use events::{Event, EventKind, EventSink, TracingSink};
pub use manager::{AccountManager, ManagerSettings};
pub use session::{connect, with_session};
pub use status::{Resolution, Snapshot, Status};
