//! Ranking of verified messages and summary statistics

use crate::verify::VerifiedMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final ranked report for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedReport {
    /// Highest reaction counts first, ties in arrival order
    pub top_items: Vec<VerifiedMessage>,

    /// Number of verified messages (not just the top N)
    pub total_analyzed: usize,

    /// Sum of the target reaction over all verified messages
    pub total_reactions: u64,

    /// `total_reactions / total_analyzed`, 0.0 when nothing was verified
    pub average_reactions: f64,

    /// Oldest and newest verified message
    pub date_span: Option<DateSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub oldest: DateTime<Utc>,
    pub newest: DateTime<Utc>,
}

impl RankedReport {
    pub fn is_empty(&self) -> bool {
        self.total_analyzed == 0
    }
}

/// Rank `items` by reaction count and keep the first `top_n`
///
/// The sort is stable, so equal counts keep the order the items were
/// verified in. Statistics cover every item, independent of truncation.
pub fn aggregate(mut items: Vec<VerifiedMessage>, top_n: usize) -> RankedReport {
    let total_analyzed = items.len();
    let total_reactions: u64 = items.iter().map(|m| u64::from(m.reaction_count)).sum();
    let average_reactions = if total_analyzed == 0 {
        0.0
    } else {
        total_reactions as f64 / total_analyzed as f64
    };

    let date_span = items
        .iter()
        .map(|m| m.timestamp)
        .fold(None, |span: Option<DateSpan>, ts| {
            Some(match span {
                None => DateSpan {
                    oldest: ts,
                    newest: ts,
                },
                Some(s) => DateSpan {
                    oldest: s.oldest.min(ts),
                    newest: s.newest.max(ts),
                },
            })
        });

    items.sort_by(|a, b| b.reaction_count.cmp(&a.reaction_count));
    items.truncate(top_n);

    RankedReport {
        top_items: items,
        total_analyzed,
        total_reactions,
        average_reactions,
        date_span,
    }
}
