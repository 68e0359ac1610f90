//! Text and JSON rendering of a [`RankedReport`]

use crate::error::{ReactionFinderError, Result};
use crate::ranking::RankedReport;
use chrono::Local;
use std::fmt;

const RULE: &str = "------------------------------------------------------------";

/// Terminal rendering of a report, written straight to any formatter
///
/// Timestamps are shown in the local timezone.
pub struct TextReport<'a> {
    report: &'a RankedReport,
    marker: &'a str,
    top_n: usize,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a RankedReport, marker: &'a str, top_n: usize) -> Self {
        Self {
            report,
            marker,
            top_n,
        }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (report, marker) = (self.report, self.marker);
        if report.is_empty() {
            return writeln!(
                f,
                "No messages with the :{}: reaction were found.",
                marker
            );
        }

        writeln!(f, "Top {} messages with :{}:", self.top_n, marker)?;
        writeln!(f, "{}", RULE)?;

        for (rank, item) in report.top_items.iter().enumerate() {
            let author = if item.author.is_empty() {
                "(unknown)"
            } else {
                item.author.as_str()
            };
            writeln!(f, "#{}  {} x :{}:", rank + 1, item.reaction_count, marker)?;
            writeln!(
                f,
                "    {}  #{}  {}",
                item.timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M"),
                item.channel,
                author
            )?;
            writeln!(f, "    {}", item.text_preview.replace('\n', "\n    "))?;
            if !item.permalink.is_empty() {
                writeln!(f, "    {}", item.permalink)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{}", RULE)?;
        writeln!(f, "Messages analysed: {}", report.total_analyzed)?;
        writeln!(f, "Total reactions:   {}", report.total_reactions)?;
        writeln!(f, "Average reactions: {:.1}", report.average_reactions)?;
        if let Some(span) = &report.date_span {
            writeln!(
                f,
                "Period:            {} ~ {}",
                span.oldest.with_timezone(&Local).format("%Y-%m-%d"),
                span.newest.with_timezone(&Local).format("%Y-%m-%d")
            )?;
        }
        Ok(())
    }
}

/// Render the report for a terminal
pub fn render_text(report: &RankedReport, marker: &str, top_n: usize) -> String {
    TextReport::new(report, marker, top_n).to_string()
}

/// Render the report as pretty-printed JSON
pub fn render_json(report: &RankedReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| ReactionFinderError::Json {
        source: e,
        context: "Failed to serialize report".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::aggregate;
    use crate::verify::VerifiedMessage;
    use chrono::{TimeZone, Utc};

    fn message(id: &str, count: u32, author: &str) -> VerifiedMessage {
        VerifiedMessage {
            id: id.to_string(),
            channel: "general".to_string(),
            author: author.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
            text_preview: "thanks everyone".to_string(),
            permalink: format!("https://example.slack.com/archives/{}", id),
            reaction_count: count,
        }
    }

    #[test]
    fn test_empty_report() {
        let report = aggregate(Vec::new(), 3);
        let text = render_text(&report, "pray", 3);
        assert_eq!(text, "No messages with the :pray: reaction were found.\n");
    }

    #[test]
    fn test_text_report_layout() {
        let items = vec![
            message("a", 28, "Alice"),
            message("b", 22, ""),
            message("c", 18, "Carol"),
        ];
        let report = aggregate(items, 3);
        let text = render_text(&report, "pray", 3);

        assert!(text.starts_with("Top 3 messages with :pray:\n"));
        let first = text.find("#1  28 x :pray:").unwrap();
        let second = text.find("#2  22 x :pray:").unwrap();
        let third = text.find("#3  18 x :pray:").unwrap();
        assert!(first < second && second < third);

        assert!(text.contains("#general  Alice"));
        assert!(text.contains("#general  (unknown)"));
        assert!(text.contains("https://example.slack.com/archives/a"));
        assert!(text.contains("Messages analysed: 3"));
        assert!(text.contains("Total reactions:   68"));
        assert!(text.contains("Average reactions: 22.7"));
        assert!(text.contains(" ~ "));
    }

    #[test]
    fn test_text_report_streams_into_writer() {
        use std::fmt::Write;

        let report = aggregate(vec![message("a", 5, "Alice")], 1);
        let mut out = String::from("> ");
        write!(out, "{}", TextReport::new(&report, "tada", 1)).unwrap();

        assert!(out.starts_with("> Top 1 messages with :tada:\n"));
        assert_eq!(&out[2..], render_text(&report, "tada", 1));
    }

    #[test]
    fn test_json_report() {
        let report = aggregate(vec![message("a", 5, "Alice")], 3);
        let json = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total_analyzed"], 1);
        assert_eq!(value["total_reactions"], 5);
        assert_eq!(value["top_items"][0]["reaction_count"], 5);
        assert_eq!(value["top_items"][0]["author"], "Alice");
    }
}
