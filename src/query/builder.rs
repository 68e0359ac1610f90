//! Date window → search-language date clause

use crate::query::window::{parse_date, DateRangeError, DateWindow, DATE_FORMAT};
use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;

/// Date restriction in the search language's `after:`/`before:` vocabulary
///
/// Both bounds are exclusive: `after:2024-06-14` matches messages from
/// 2024-06-15 onwards, `before:2024-06-16` matches messages up to the end
/// of 2024-06-15.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateClause {
    pub after: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
}

impl DateClause {
    /// Clause covering exactly one calendar day
    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            after: day.pred_opt(),
            before: day.succ_opt(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.after.is_none() && self.before.is_none()
    }

    /// Effective range as `[inclusive start, exclusive end)`, `None` = unbounded
    pub fn effective_range(&self) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        let start = self
            .after
            .and_then(|d| d.succ_opt())
            .map(|d| d.and_time(NaiveTime::MIN));
        let end = self.before.map(|d| d.and_time(NaiveTime::MIN));
        (start, end)
    }
}

impl fmt::Display for DateClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if let Some(after) = self.after {
            parts.push(format!("after:{}", after.format(DATE_FORMAT)));
        }
        if let Some(before) = self.before {
            parts.push(format!("before:{}", before.format(DATE_FORMAT)));
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// Turns a validated [`DateWindow`] into a [`DateClause`]
///
/// Deterministic for a fixed reference date; never touches the network.
#[derive(Debug, Clone, Copy)]
pub struct DateRangeQueryBuilder {
    reference_date: NaiveDate,
}

impl DateRangeQueryBuilder {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    /// Builder anchored at today's local date
    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Build the clause
    ///
    /// Checks run in a fixed order so the most specific problem is reported:
    /// option conflicts first, then each date's format, then the
    /// `after <= before` ordering.
    pub fn build(&self, window: &DateWindow) -> Result<DateClause, DateRangeError> {
        window.check_shape()?;

        let on = window
            .on
            .as_deref()
            .map(|v| parse_date("on", v))
            .transpose()?;
        let after = window
            .after
            .as_deref()
            .map(|v| parse_date("after", v))
            .transpose()?;
        let before = window
            .before
            .as_deref()
            .map(|v| parse_date("before", v))
            .transpose()?;

        if let Some(day) = on {
            return Ok(DateClause::single_day(day));
        }

        if let Some(days) = window.days {
            let anchor = before.unwrap_or(self.reference_date);
            let start = (days > 0)
                .then(|| anchor.checked_sub_days(Days::new(u64::from(days))))
                .flatten()
                .ok_or(DateRangeError::InvalidDays { days })?;
            return Ok(DateClause {
                after: Some(start),
                before,
            });
        }

        match (after, before) {
            (Some(a), Some(b)) if a > b => Err(DateRangeError::InvalidRange {
                after: a,
                before: b,
            }),
            (Some(a), Some(b)) if a == b => Ok(DateClause::single_day(a)),
            (after, before) => Ok(DateClause { after, before }),
        }
    }
}
