//! Distinguished-name patterns
//!
//! A pattern is a DN template with positional placeholders that consume the
//! tokenized address fields `[local, domain, label_n, ..., label_1]`:
//!
//! ```
//! use mailadm::account::DnPattern;
//! use mailadm::address::tokenize;
//!
//! let pattern = DnPattern::new("uid={0},ou=users,dc={3},dc={2}");
//! let addr = tokenize("bob@example.org").unwrap();
//! assert_eq!(pattern.render(&addr).unwrap(), "uid=bob,ou=users,dc=example,dc=org");
//! ```
//!
//! `{}` takes the next field in order, `{{` and `}}` are literal braces.
//! Patterns are only checked when rendered.

use crate::address::Address;
use mail_directory::escape_dn_value;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DnPatternError {
    #[error("pattern '{pattern}' uses field {index} but the address only has {available}")]
    MissingField {
        pattern: String,
        index: usize,
        available: usize,
    },

    #[error("pattern '{pattern}' has an invalid placeholder '{{{placeholder}}}'")]
    InvalidPlaceholder { pattern: String, placeholder: String },

    #[error("pattern '{0}' has an unbalanced brace")]
    UnbalancedBrace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DnPattern(String);

impl DnPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute the address fields into the pattern, escaping each one
    pub fn render(&self, address: &Address) -> Result<String, DnPatternError> {
        let fields: Vec<String> = address.fields().into_iter().map(escape_dn_value).collect();
        self.render_fields(&fields)
    }

    fn render_fields(&self, fields: &[String]) -> Result<String, DnPatternError> {
        let pattern = self.0.as_str();
        let mut out = String::with_capacity(pattern.len() + 32);
        let mut chars = pattern.chars().peekable();
        let mut next_auto = 0;

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut placeholder = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(DnPatternError::UnbalancedBrace(pattern.to_string()))
                            }
                            Some(ch) => placeholder.push(ch),
                        }
                    }

                    let index = if placeholder.is_empty() {
                        next_auto += 1;
                        next_auto - 1
                    } else {
                        placeholder.trim().parse::<usize>().map_err(|_| {
                            DnPatternError::InvalidPlaceholder {
                                pattern: pattern.to_string(),
                                placeholder: placeholder.clone(),
                            }
                        })?
                    };

                    let field = fields.get(index).ok_or(DnPatternError::MissingField {
                        pattern: pattern.to_string(),
                        index,
                        available: fields.len(),
                    })?;
                    out.push_str(field);
                }
                '}' => return Err(DnPatternError::UnbalancedBrace(pattern.to_string())),
                _ => out.push(c),
            }
        }

        Ok(out)
    }
}

impl fmt::Display for DnPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DnPattern {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
