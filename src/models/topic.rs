//! Topic identifier.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Opaque, caller-supplied topic name.
///
/// The only rule is that it is non-empty; no trimming, case folding, or
/// hierarchy is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Build a topic from any string-like value.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCommand`] if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(AppError::InvalidCommand("topic must not be empty".into()));
        }
        Ok(Self(name))
    }

    /// Borrow the topic name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Topic {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
