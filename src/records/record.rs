//! # Log record data model.
//!
//! [`LogRecord`] mirrors the wire form published by producers:
//! ```text
//! {"id":"42","timestamp":"2024-05-01T10:00:00Z","level":"warning","message":"disk at 91%"}
//! ```
//! Fields are caller-supplied and passed through unchanged; missing fields decode
//! as empty strings. The [`Category`] tag is transient: set by dispatch, never
//! serialized, never read back from storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Severity category; selects the sink destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Every record, regardless of level.
    General,
    Info,
    Warning,
    Error,
    Debug,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 5] = [
        Category::General,
        Category::Info,
        Category::Warning,
        Category::Error,
        Category::Debug,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Info => "info",
            Category::Warning => "warning",
            Category::Error => "error",
            Category::Debug => "debug",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category {s:?}"))
    }
}

/// A single log event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    /// Caller-assigned identifier; used as the stored document key.
    #[serde(deserialize_with = "null_as_empty")]
    pub id: String,
    /// Caller-formatted timestamp.
    #[serde(deserialize_with = "null_as_empty")]
    pub timestamp: String,
    /// Severity level as published.
    #[serde(deserialize_with = "null_as_empty")]
    pub level: String,
    /// Message body.
    #[serde(deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(skip)]
    category: Option<Category>,
}

impl LogRecord {
    /// Creates an untagged record.
    pub fn new(
        id: impl Into<String>,
        timestamp: impl Into<String>,
        level: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: timestamp.into(),
            level: level.into(),
            message: message.into(),
            category: None,
        }
    }

    /// Category tag set by dispatch, if any.
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Returns the record tagged with `category`.
    #[inline]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

/// `null` reads as an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
