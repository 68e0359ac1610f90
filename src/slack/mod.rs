//! Slack Web API client
//!
//! One [`SlackClient`] serves all three collaborator roles of the pipeline:
//!
//! | Capability | Slack method |
//! |------------|--------------|
//! | [`SearchCollaborator`] | `search.messages` |
//! | [`DetailLookup`] | `conversations.history` (+ `conversations.replies`, `chat.getPermalink`) |
//! | [`IdentityLookup`] | `users.info` |
//!
//! Requests are not retried; a rate limit is reported with its
//! `Retry-After` hint and the run ends.

mod retry_after;
mod types;

pub use retry_after::parse_retry_after;
pub use types::{parse_ts, MessageId};

use crate::search::{SearchCollaborator, SearchError, SearchHit, SearchPage, SEARCH_PAGE_CEILING};
use crate::verify::{DetailLookup, IdentityLookup, LookupError, MessageRecord, Reaction};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use types::{
    permalink_thread_ts, HistoryMessage, HistoryResponse, PermalinkResponse,
    SearchMessagesResponse, UsersInfoResponse,
};

pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Slack error codes meaning the token itself is the problem
const AUTH_ERRORS: &[&str] = &[
    "not_authed",
    "invalid_auth",
    "account_inactive",
    "token_revoked",
    "token_expired",
    "missing_scope",
    "no_permission",
    "not_allowed_token_type",
];

/// Slack error codes for channels the token cannot read
const CHANNEL_ERRORS: &[&str] = &["channel_not_found", "not_in_channel", "is_archived"];

/// Raw failure of a single Web API call
#[derive(Debug, Clone, PartialEq, Eq)]
enum ApiFailure {
    RateLimited(Option<u64>),
    /// `ok: false` with Slack's error code
    Api(String),
    Transport(String),
}

impl From<ApiFailure> for SearchError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::RateLimited(retry_after) => SearchError::RateLimited { retry_after },
            ApiFailure::Api(code) if AUTH_ERRORS.contains(&code.as_str()) => {
                SearchError::Unauthorized(code)
            }
            ApiFailure::Api(code) => SearchError::Failed(code),
            ApiFailure::Transport(message) => SearchError::Failed(message),
        }
    }
}

impl From<ApiFailure> for LookupError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::RateLimited(retry_after) => LookupError::RateLimited { retry_after },
            ApiFailure::Api(code) if CHANNEL_ERRORS.contains(&code.as_str()) => {
                LookupError::ChannelNotAccessible(code)
            }
            ApiFailure::Api(code) if code == "message_not_found" => LookupError::NotFound,
            ApiFailure::Api(code) if AUTH_ERRORS.contains(&code.as_str()) => {
                LookupError::Unauthorized(code)
            }
            ApiFailure::Api(code) => LookupError::Other(code),
            ApiFailure::Transport(message) => LookupError::Other(message),
        }
    }
}

/// Channel name and permalink seen in a search match
#[derive(Debug, Clone)]
struct MatchContext {
    channel_name: String,
    permalink: String,
    /// Parent ts when the match is a thread reply
    thread_ts: Option<String>,
}

pub struct SlackClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    /// Search match context by hit id, for the lifetime of this client
    matches: Mutex<HashMap<String, MatchContext>>,
}

impl SlackClient {
    pub fn new(token: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::with_options(
            token,
            DEFAULT_API_BASE_URL,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    pub fn with_options(
        token: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            matches: Mutex::new(HashMap::new()),
        })
    }

    /// Call a Web API method and decode its body on `ok: true`
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiFailure> {
        let url = format!("{}/{}", self.base_url, method);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(params)
            .send()
            .await
            .map_err(|e| ApiFailure::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            tracing::warn!(method, ?retry_after, "Slack API rate limited");
            return Err(ApiFailure::RateLimited(retry_after));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiFailure::Transport(format!(
                "{} returned HTTP {}: {}",
                method,
                status.as_u16(),
                body
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ApiFailure::Transport(format!("{}: invalid JSON: {}", method, e)))?;

        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let code = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_string();
            tracing::debug!(method, error = %code, "Slack API call failed");
            if code == "ratelimited" {
                return Err(ApiFailure::RateLimited(None));
            }
            return Err(ApiFailure::Api(code));
        }

        serde_json::from_value(body).map_err(|e| {
            ApiFailure::Transport(format!("{}: unexpected response shape: {}", method, e))
        })
    }

    fn match_context(&self, id: &str) -> Option<MatchContext> {
        self.matches
            .lock()
            .ok()
            .and_then(|matches| matches.get(id).cloned())
    }

    async fn permalink(&self, id: &MessageId) -> Result<String, LookupError> {
        let resp: PermalinkResponse = self
            .call(
                "chat.getPermalink",
                &[
                    ("channel", id.channel.clone()),
                    ("message_ts", id.ts.clone()),
                ],
            )
            .await?;
        Ok(resp.permalink)
    }

    /// The channel-level message with exactly this ts, if history has it
    async fn history_message(
        &self,
        id: &MessageId,
    ) -> Result<Option<HistoryMessage>, LookupError> {
        let resp: HistoryResponse = self
            .call(
                "conversations.history",
                &[
                    ("channel", id.channel.clone()),
                    ("latest", id.ts.clone()),
                    ("inclusive", "true".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        // `latest` returns the closest older message when the exact one is
        // gone or lives in a thread
        Ok(resp.messages.into_iter().next().filter(|m| m.ts == id.ts))
    }

    /// A reply inside the thread started by `parent_ts`
    async fn thread_reply(
        &self,
        id: &MessageId,
        parent_ts: &str,
    ) -> Result<HistoryMessage, LookupError> {
        // Same shape as a history page; the parent always comes first
        let resp: HistoryResponse = self
            .call(
                "conversations.replies",
                &[
                    ("channel", id.channel.clone()),
                    ("ts", parent_ts.to_string()),
                    ("oldest", id.ts.clone()),
                    ("latest", id.ts.clone()),
                    ("inclusive", "true".to_string()),
                ],
            )
            .await?;

        resp.messages
            .into_iter()
            .find(|m| m.ts == id.ts)
            .ok_or(LookupError::NotFound)
    }
}

#[async_trait]
impl SearchCollaborator for SlackClient {
    async fn search_page(
        &self,
        query: &str,
        page_size: usize,
        page: u32,
    ) -> Result<SearchPage, SearchError> {
        // Slack pages are `count`-sized windows, so the count stays fixed at
        // the ceiling and the page is cut down locally.
        let resp: SearchMessagesResponse = self
            .call(
                "search.messages",
                &[
                    ("query", query.to_string()),
                    ("count", SEARCH_PAGE_CEILING.to_string()),
                    ("page", page.to_string()),
                    ("sort", "timestamp".to_string()),
                    ("sort_dir", "desc".to_string()),
                ],
            )
            .await?;

        let messages = resp.messages;
        let truncated = messages.matches.len() > page_size;
        let has_more = truncated
            || messages
                .paging
                .as_ref()
                .map(|p| p.page < p.pages)
                .unwrap_or(false);

        let mut items = Vec::with_capacity(page_size.min(messages.matches.len()));
        let mut contexts = Vec::with_capacity(items.capacity());
        for m in messages.matches.into_iter().take(page_size) {
            let id = MessageId::new(m.channel.id, m.ts).to_string();
            contexts.push((
                id.clone(),
                MatchContext {
                    channel_name: m.channel.name,
                    thread_ts: permalink_thread_ts(&m.permalink),
                    permalink: m.permalink,
                },
            ));
            items.push(SearchHit::new(id, m.text));
        }

        if let Ok(mut matches) = self.matches.lock() {
            matches.extend(contexts);
        }

        Ok(SearchPage {
            items,
            has_more,
            total: Some(messages.total),
        })
    }
}

#[async_trait]
impl DetailLookup for SlackClient {
    async fn lookup(&self, id: &str) -> Result<MessageRecord, LookupError> {
        let message_id = MessageId::parse(id).ok_or_else(|| {
            LookupError::Other(format!("malformed message id '{}'", id))
        })?;
        let context = self.match_context(id);
        let thread_ts = context.as_ref().and_then(|c| c.thread_ts.clone());

        let message = match (self.history_message(&message_id).await?, thread_ts) {
            (Some(message), _) => message,
            (None, Some(parent)) if parent != message_id.ts => {
                tracing::debug!(id, parent = %parent, "Looking up thread reply");
                self.thread_reply(&message_id, &parent).await?
            }
            (None, _) => return Err(LookupError::NotFound),
        };

        let timestamp = parse_ts(&message.ts).ok_or_else(|| {
            LookupError::Other(format!("invalid message ts '{}'", message.ts))
        })?;

        let channel = context
            .as_ref()
            .map(|c| c.channel_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| message_id.channel.clone());
        let permalink = match context.map(|c| c.permalink).filter(|p| !p.is_empty()) {
            Some(permalink) => permalink,
            None => self.permalink(&message_id).await?,
        };

        let author = message.author_id();
        Ok(MessageRecord {
            id: id.to_string(),
            channel,
            author,
            timestamp,
            text: message.text,
            permalink,
            reactions: message
                .reactions
                .into_iter()
                .map(|r| Reaction::new(r.name, r.count))
                .collect(),
        })
    }
}

#[async_trait]
impl IdentityLookup for SlackClient {
    async fn display_name(&self, author_id: &str) -> Result<String, LookupError> {
        let resp: UsersInfoResponse = self
            .call("users.info", &[("user", author_id.to_string())])
            .await?;
        Ok(resp.user.best_name())
    }
}
