use crate::search::SearchHit;
use crate::verify::{
    DetailLookup, DisplayNames, IdentityLookup, LookupError, VerifiedMessage, VerifyError,
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Default preview length in characters
pub const DEFAULT_PREVIEW_CHARS: usize = 150;

/// Preview shown for messages without a text body
pub const NO_TEXT: &str = "(no text)";

/// Confirms search hits and extracts the target reaction's count
pub struct MessageVerifier {
    details: Arc<dyn DetailLookup>,
    names: DisplayNames,
    preview_chars: usize,
}

impl MessageVerifier {
    pub fn new(
        details: Arc<dyn DetailLookup>,
        identities: Arc<dyn IdentityLookup>,
        preview_chars: usize,
    ) -> Self {
        Self {
            details,
            names: DisplayNames::new(identities),
            preview_chars,
        }
    }

    /// Verify one hit
    ///
    /// `Ok(None)` when the message does not carry `marker` as a reaction
    /// (the search matched its text only), when it was deleted, or when its
    /// channel is not readable. Rate limits and transport failures are errors.
    pub async fn verify(
        &self,
        hit: &SearchHit,
        marker: &str,
    ) -> Result<Option<VerifiedMessage>, LookupError> {
        let record = match self.details.lookup(&hit.id).await {
            Ok(record) => record,
            Err(e) if e.is_recoverable() => {
                tracing::debug!(id = %hit.id, error = %e, "Skipping unreadable search hit");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(reaction_count) = record.reaction_count(marker) else {
            tracing::debug!(
                id = %hit.id,
                marker,
                "Reaction not attached, text match only"
            );
            return Ok(None);
        };

        let author = self.names.resolve(&record.author).await;

        Ok(Some(VerifiedMessage {
            id: record.id,
            channel: record.channel,
            author,
            timestamp: record.timestamp,
            text_preview: text_preview(&record.text, self.preview_chars),
            permalink: record.permalink,
            reaction_count,
        }))
    }

    /// Verify every hit, keeping the order the hits arrived in
    ///
    /// Up to `concurrency` lookups run at once; results are still yielded in
    /// hit order. The first non-recoverable error aborts the whole batch.
    pub async fn verify_all(
        &self,
        hits: &[SearchHit],
        marker: &str,
        concurrency: usize,
    ) -> Result<Vec<VerifiedMessage>, VerifyError> {
        let total = hits.len();
        let mut results = stream::iter(hits.iter().map(|hit| async move {
            self.verify(hit, marker).await.map_err(|source| VerifyError {
                id: hit.id.clone(),
                source,
            })
        }))
        .buffered(concurrency.max(1));

        let mut verified = Vec::new();
        let mut checked = 0usize;
        while let Some(result) = results.next().await {
            checked += 1;
            if let Some(message) = result? {
                verified.push(message);
            }
            if checked % 50 == 0 || checked == total {
                tracing::info!(checked, total, verified = verified.len(), "Verifying hits");
            }
        }

        Ok(verified)
    }
}

/// Text preview of at most `max_chars` characters, `...` marks truncation
pub fn text_preview(text: &str, max_chars: usize) -> String {
    if text.trim().is_empty() {
        return NO_TEXT.to_string();
    }

    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::{MessageRecord, Reaction};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Archive {
        records: HashMap<String, Result<MessageRecord, LookupError>>,
    }

    #[async_trait]
    impl DetailLookup for Archive {
        async fn lookup(&self, id: &str) -> Result<MessageRecord, LookupError> {
            self.records
                .get(id)
                .cloned()
                .unwrap_or(Err(LookupError::NotFound))
        }
    }

    struct Names;

    #[async_trait]
    impl IdentityLookup for Names {
        async fn display_name(&self, author_id: &str) -> Result<String, LookupError> {
            match author_id {
                "U1" => Ok("John Doe".to_string()),
                _ => Err(LookupError::Other("user_not_found".to_string())),
            }
        }
    }

    fn record(id: &str, author: &str, text: &str, reactions: Vec<Reaction>) -> MessageRecord {
        MessageRecord {
            id: id.to_string(),
            channel: "general".to_string(),
            author: author.to_string(),
            timestamp: Utc.timestamp_opt(1_609_459_200, 0).unwrap(),
            text: text.to_string(),
            permalink: format!("https://example.slack.com/archives/{}", id),
            reactions,
        }
    }

    fn verifier(entries: Vec<(&str, Result<MessageRecord, LookupError>)>) -> MessageVerifier {
        let records = entries
            .into_iter()
            .map(|(id, r)| (id.to_string(), r))
            .collect();
        MessageVerifier::new(
            Arc::new(Archive { records }),
            Arc::new(Names),
            DEFAULT_PREVIEW_CHARS,
        )
    }

    #[tokio::test]
    async fn test_verified_with_target_count() {
        let v = verifier(vec![(
            "C1/1",
            Ok(record(
                "C1/1",
                "U1",
                "Great work!",
                vec![Reaction::new("tada", 3), Reaction::new("pray", 7)],
            )),
        )]);

        let msg = v
            .verify(&SearchHit::new("C1/1", "Great work!"), "pray")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(msg.reaction_count, 7);
        assert_eq!(msg.author, "John Doe");
        assert_eq!(msg.channel, "general");
        assert_eq!(msg.text_preview, "Great work!");
    }

    #[tokio::test]
    async fn test_text_mention_is_not_a_reaction() {
        let v = verifier(vec![(
            "C1/1",
            Ok(record(
                "C1/1",
                "U1",
                "please :pray: for the deploy",
                vec![Reaction::new("eyes", 2)],
            )),
        )]);

        let result = v
            .verify(&SearchHit::new("C1/1", "please :pray:"), "pray")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_no_reactions_at_all() {
        let v = verifier(vec![("C1/1", Ok(record("C1/1", "U1", "hi", vec![])))]);
        assert!(v
            .verify(&SearchHit::new("C1/1", "hi"), "pray")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_inaccessible_channel_skipped() {
        let v = verifier(vec![(
            "G1/1",
            Err(LookupError::ChannelNotAccessible(
                "channel_not_found".to_string(),
            )),
        )]);
        assert!(v
            .verify(&SearchHit::new("G1/1", ""), "pray")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_missing_message_skipped() {
        let v = verifier(vec![]);
        assert!(v
            .verify(&SearchHit::new("C1/9", ""), "pray")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_propagates() {
        let v = verifier(vec![(
            "C1/1",
            Err(LookupError::RateLimited {
                retry_after: Some(20),
            }),
        )]);
        assert_eq!(
            v.verify(&SearchHit::new("C1/1", ""), "pray").await,
            Err(LookupError::RateLimited {
                retry_after: Some(20)
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_author_keeps_raw_id() {
        let v = verifier(vec![(
            "C1/1",
            Ok(record("C1/1", "U999", "hi", vec![Reaction::new("pray", 1)])),
        )]);
        let msg = v
            .verify(&SearchHit::new("C1/1", ""), "pray")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(msg.author, "U999");
    }

    #[tokio::test]
    async fn test_verify_all_keeps_hit_order() {
        let v = verifier(vec![
            (
                "C1/1",
                Ok(record("C1/1", "U1", "a", vec![Reaction::new("pray", 1)])),
            ),
            ("C1/2", Ok(record("C1/2", "U1", "b", vec![]))),
            (
                "C1/3",
                Ok(record("C1/3", "U1", "c", vec![Reaction::new("pray", 9)])),
            ),
        ]);
        let hits = vec![
            SearchHit::new("C1/3", "c"),
            SearchHit::new("C1/2", "b"),
            SearchHit::new("C1/1", "a"),
        ];

        for concurrency in [1, 4] {
            let verified = v.verify_all(&hits, "pray", concurrency).await.unwrap();
            let ids: Vec<&str> = verified.iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids, vec!["C1/3", "C1/1"]);
        }
    }

    /// Later hits answer sooner, so lookups complete in reverse hit order
    struct StaggeredArchive {
        hits: u64,
        completed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DetailLookup for StaggeredArchive {
        async fn lookup(&self, id: &str) -> Result<MessageRecord, LookupError> {
            let index: u64 = id.trim_start_matches("C1/").parse().unwrap();
            let delay = Duration::from_millis((self.hits - index) * 20);
            tokio::time::sleep(delay).await;
            self.completed.lock().unwrap().push(id.to_string());
            Ok(record(id, "U1", "same", vec![Reaction::new("pray", 5)]))
        }
    }

    #[tokio::test]
    async fn test_verify_all_restores_hit_order_when_lookups_finish_out_of_order() {
        let archive = Arc::new(StaggeredArchive {
            hits: 6,
            completed: Mutex::new(Vec::new()),
        });
        let v = MessageVerifier::new(archive.clone(), Arc::new(Names), DEFAULT_PREVIEW_CHARS);
        let hits: Vec<SearchHit> = (0..6)
            .map(|i| SearchHit::new(format!("C1/{}", i), "same"))
            .collect();

        let verified = v.verify_all(&hits, "pray", 6).await.unwrap();

        let expected: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        let ids: Vec<&str> = verified.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, expected);

        let completed = archive.completed.lock().unwrap().clone();
        let mut reversed: Vec<String> = expected.iter().map(|id| id.to_string()).collect();
        reversed.reverse();
        assert_eq!(completed, reversed);
    }

    #[tokio::test]
    async fn test_verify_all_reports_failing_hit() {
        let v = verifier(vec![(
            "C1/2",
            Err(LookupError::Other("fatal_error".to_string())),
        )]);
        let hits = vec![SearchHit::new("C1/1", ""), SearchHit::new("C1/2", "")];

        let err = v.verify_all(&hits, "pray", 1).await.unwrap_err();
        assert_eq!(err.id, "C1/2");
        assert_eq!(err.source, LookupError::Other("fatal_error".to_string()));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let text = "ありがとうございます";
        assert_eq!(text_preview(text, 5), "ありがとう...");
        assert_eq!(text_preview(text, 10), text);
        assert_eq!(text_preview(text, 50), text);
    }

    #[test]
    fn test_preview_of_empty_text() {
        assert_eq!(text_preview("", 150), NO_TEXT);
        assert_eq!(text_preview("  \n", 150), NO_TEXT);
    }

    #[test]
    fn test_preview_default_length() {
        let text = "x".repeat(200);
        let preview = text_preview(&text, DEFAULT_PREVIEW_CHARS);
        assert_eq!(preview.chars().count(), DEFAULT_PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
    }
}
