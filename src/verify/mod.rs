//! Verification of search hits against the authoritative message record
//!
//! A hit only counts when the looked-up message really carries the target
//! reaction; the reaction's own count becomes the ranking key.

mod names;
mod verifier;

pub use names::DisplayNames;
pub use verifier::{text_preview, MessageVerifier, DEFAULT_PREVIEW_CHARS, NO_TEXT};

use crate::search::retry_hint;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Message not found")]
    NotFound,

    #[error("Channel not accessible: {0}")]
    ChannelNotAccessible(String),

    #[error("Lookup API rate limited{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<u64> },

    #[error("Lookup not authorized: {0}")]
    Unauthorized(String),

    #[error("Lookup failed: {0}")]
    Other(String),
}

/// Non-recoverable lookup failure, tagged with the hit it happened on
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Verification of message {id} failed: {source}")]
pub struct VerifyError {
    pub id: String,
    pub source: LookupError,
}

impl LookupError {
    /// Whether the hit can simply be skipped
    ///
    /// Private channels the token cannot read and messages deleted since the
    /// search are expected in normal operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LookupError::NotFound | LookupError::ChannelNotAccessible(_)
        )
    }
}

/// One reaction entry on a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Emoji name without colons
    pub name: String,
    pub count: u32,
}

impl Reaction {
    pub fn new(name: impl Into<String>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Authoritative message as returned by the detail lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    /// Channel display name
    pub channel: String,
    /// Raw author identifier
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub permalink: String,
    pub reactions: Vec<Reaction>,
}

impl MessageRecord {
    /// Count of the reaction named exactly `marker`, if present
    pub fn reaction_count(&self, marker: &str) -> Option<u32> {
        self.reactions
            .iter()
            .find(|r| r.name == marker)
            .map(|r| r.count)
            .filter(|&count| count > 0)
    }
}

/// A hit confirmed to carry the target reaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedMessage {
    pub id: String,
    pub channel: String,
    /// Display name, or the raw author id when it could not be resolved
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub text_preview: String,
    pub permalink: String,
    /// Count of the target reaction only, always >= 1
    pub reaction_count: u32,
}

/// Per-message detail lookup capability
#[async_trait]
pub trait DetailLookup: Send + Sync {
    async fn lookup(&self, id: &str) -> Result<MessageRecord, LookupError>;
}

/// Author id → display name capability
///
/// Callers go through [`DisplayNames`], which never fails.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn display_name(&self, author_id: &str) -> Result<String, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(reactions: Vec<Reaction>) -> MessageRecord {
        MessageRecord {
            id: "C1/1.0".to_string(),
            channel: "general".to_string(),
            author: "U1".to_string(),
            timestamp: Utc::now(),
            text: "thanks :pray:".to_string(),
            permalink: String::new(),
            reactions,
        }
    }

    #[test]
    fn test_reaction_count_exact_match_only() {
        let rec = record(vec![
            Reaction::new("pray::skin-tone-2", 4),
            Reaction::new("praying", 9),
            Reaction::new("pray", 7),
        ]);
        assert_eq!(rec.reaction_count("pray"), Some(7));
        assert_eq!(rec.reaction_count("pra"), None);
    }

    #[test]
    fn test_zero_count_treated_as_absent() {
        let rec = record(vec![Reaction::new("pray", 0)]);
        assert_eq!(rec.reaction_count("pray"), None);
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(LookupError::NotFound.is_recoverable());
        assert!(LookupError::ChannelNotAccessible("C1".to_string()).is_recoverable());
        assert!(!LookupError::RateLimited { retry_after: None }.is_recoverable());
        assert!(!LookupError::Other("x".to_string()).is_recoverable());
    }
}
