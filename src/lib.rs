//! Reaction Finder - most-reacted Slack messages for an emoji
//!
//! Searches a Slack workspace for messages carrying a given reaction inside a
//! date window, verifies each search hit against the authoritative message
//! record (the keyword search also matches messages that merely mention the
//! emoji), and ranks the verified messages by that reaction's count.

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod ranking;
pub mod report;
pub mod search;
pub mod slack;
pub mod verify;

pub use error::{ReactionFinderError, Result};
