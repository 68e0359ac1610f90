//! Slack Web API response shapes and small helpers

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;

/// Message identity: `<channel id>/<ts>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId {
    pub channel: String,
    pub ts: String,
}

impl MessageId {
    pub fn new(channel: impl Into<String>, ts: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            ts: ts.into(),
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        let (channel, ts) = id.split_once('/')?;
        if channel.is_empty() || ts.is_empty() {
            return None;
        }
        Some(Self::new(channel, ts))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.ts)
    }
}

/// Convert a Slack `ts` ("1609459200.000100") to a UTC timestamp
pub fn parse_ts(ts: &str) -> Option<DateTime<Utc>> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, "0"));
    let secs: i64 = secs.parse().ok()?;
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let micros: u32 = if frac.is_empty() {
        0
    } else {
        format!("{:0<6}", &frac[..frac.len().min(6)]).parse().ok()?
    };
    Utc.timestamp_opt(secs, micros * 1_000).single()
}

/// `thread_ts` from a search match permalink; replies carry their parent's
/// ts there
pub(crate) fn permalink_thread_ts(permalink: &str) -> Option<String> {
    let (_, query) = permalink.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, value)| *key == "thread_ts" && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchMessagesResponse {
    pub messages: SearchMessages,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchMessages {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub matches: Vec<SearchMatch>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchMatch {
    pub ts: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub permalink: String,
    pub channel: MatchChannel,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MatchChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryMessage {
    pub ts: String,
    #[serde(default)]
    pub text: String,
    pub user: Option<String>,
    pub bot_id: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub reactions: Vec<RawReaction>,
}

impl HistoryMessage {
    /// Best available author identifier; bots have no `user`
    pub fn author_id(&self) -> String {
        self.user
            .clone()
            .or_else(|| self.bot_id.clone())
            .or_else(|| self.username.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawReaction {
    pub name: String,
    #[serde(default)]
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersInfoResponse {
    pub user: SlackUser,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SlackUser {
    #[serde(default)]
    pub name: String,
    pub real_name: Option<String>,
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserProfile {
    pub display_name: Option<String>,
    pub real_name: Option<String>,
}

impl SlackUser {
    /// `real_name`, then the profile's display or real name, then the handle
    pub fn best_name(&self) -> String {
        let profile = self.profile.as_ref();
        [
            self.real_name.as_deref(),
            profile.and_then(|p| p.display_name.as_deref()),
            profile.and_then(|p| p.real_name.as_deref()),
        ]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or(self.name.as_str())
        .to_string()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PermalinkResponse {
    pub permalink: String,
}
