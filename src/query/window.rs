//! Date window input and its validation errors

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date format accepted for `--on`, `--after` and `--before`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Conflicting date options: {0}")]
    ConflictingOptions(String),

    #[error("Invalid date format for --{field}: '{value}' (expected YYYY-MM-DD)")]
    InvalidFormat { field: &'static str, value: String },

    #[error(
        "Invalid date range: --after ({after}) is later than --before ({before}); \
         pass them in order, e.g. --after 2025-02-01 --before 2025-10-31"
    )]
    InvalidRange { after: NaiveDate, before: NaiveDate },

    #[error("Invalid --days value {days}: must be at least 1 and stay within the calendar")]
    InvalidDays { days: u32 },
}

/// Date window exactly as the caller supplied it
///
/// Dates stay unparsed here so that the builder can report a conflicting
/// combination before it looks at any individual value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// Single calendar day
    pub on: Option<String>,

    /// Lower bound (exclusive, search-language semantics)
    pub after: Option<String>,

    /// Upper bound (exclusive, search-language semantics)
    pub before: Option<String>,

    /// Relative window length in days, ending today or on `before`
    pub days: Option<u32>,
}

impl DateWindow {
    pub fn on(date: impl Into<String>) -> Self {
        Self {
            on: Some(date.into()),
            ..Self::default()
        }
    }

    pub fn between(after: Option<&str>, before: Option<&str>) -> Self {
        Self {
            after: after.map(str::to_string),
            before: before.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn last_days(days: u32, before: Option<&str>) -> Self {
        Self {
            days: Some(days),
            before: before.map(str::to_string),
            ..Self::default()
        }
    }

    /// Reject option combinations that have no defined meaning
    ///
    /// Valid shapes: nothing, `on`, `after`, `before`, `after+before`,
    /// `days`, `days+before`.
    pub(crate) fn check_shape(&self) -> Result<(), DateRangeError> {
        if self.on.is_some() {
            let mut others = Vec::new();
            if self.after.is_some() {
                others.push("--after");
            }
            if self.before.is_some() {
                others.push("--before");
            }
            if self.days.is_some() {
                others.push("--days");
            }
            if !others.is_empty() {
                return Err(DateRangeError::ConflictingOptions(format!(
                    "--on cannot be combined with {}",
                    others.join(", ")
                )));
            }
        }

        if self.days.is_some() && self.after.is_some() {
            return Err(DateRangeError::ConflictingOptions(
                "--days cannot be combined with --after (use --days with --before instead)"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

pub(crate) fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        DateRangeError::InvalidFormat {
            field,
            value: value.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_conflicts_list_every_other_option() {
        let window = DateWindow {
            on: Some("2024-06-15".to_string()),
            after: Some("2024-01-01".to_string()),
            days: Some(7),
            ..DateWindow::default()
        };

        match window.check_shape() {
            Err(DateRangeError::ConflictingOptions(msg)) => {
                assert!(msg.contains("--after"));
                assert!(msg.contains("--days"));
                assert!(!msg.contains("--before"));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_shapes() {
        let shapes = [
            DateWindow::default(),
            DateWindow::on("2024-06-15"),
            DateWindow::between(Some("2024-01-01"), None),
            DateWindow::between(None, Some("2024-01-01")),
            DateWindow::between(Some("2024-01-01"), Some("2024-02-01")),
            DateWindow::last_days(30, None),
            DateWindow::last_days(30, Some("2024-02-01")),
        ];

        for shape in shapes {
            assert!(shape.check_shape().is_ok(), "{:?}", shape);
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("after", "2024/01/01").is_err());
        assert!(parse_date("after", "2024-13-01").is_err());
        assert_eq!(
            parse_date("after", "2024-01-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }
}
