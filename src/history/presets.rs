use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{HistoryError, Result};

/// Inclusive time bounds. `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Local>>,
    pub end: Option<DateTime<Local>>,
}

impl DateRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start: Some(start), end: Some(end) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DatePreset {
    Today,
    Yesterday,
    #[serde(rename = "last7days")]
    Last7Days,
    #[serde(rename = "last30days")]
    Last30Days,
    ThisMonth,
    LastMonth,
    All,
}

impl DatePreset {
    pub const ALL: [DatePreset; 7] = [
        DatePreset::Today,
        DatePreset::Yesterday,
        DatePreset::Last7Days,
        DatePreset::Last30Days,
        DatePreset::ThisMonth,
        DatePreset::LastMonth,
        DatePreset::All,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatePreset::Today => "today",
            DatePreset::Yesterday => "yesterday",
            DatePreset::Last7Days => "last7days",
            DatePreset::Last30Days => "last30days",
            DatePreset::ThisMonth => "thisMonth",
            DatePreset::LastMonth => "lastMonth",
            DatePreset::All => "all",
        }
    }

    /// Concrete bounds of this preset as seen at `now`.
    pub fn range_at(&self, now: DateTime<Local>) -> DateRange {
        let midnight = local_midnight(now);
        match self {
            DatePreset::Today => DateRange::between(midnight, now),
            DatePreset::Yesterday => {
                let start = now
                    .date_naive()
                    .pred_opt()
                    .map(|d| start_of_day(d, midnight - Duration::days(1)))
                    .unwrap_or(midnight - Duration::days(1));
                DateRange::between(start, midnight - Duration::milliseconds(1))
            }
            DatePreset::Last7Days => DateRange::between(now - Duration::days(7), now),
            DatePreset::Last30Days => DateRange::between(now - Duration::days(30), now),
            DatePreset::ThisMonth => DateRange::between(start_of_month(now), now),
            DatePreset::LastMonth => {
                let this_month = start_of_month(now);
                let date = now.date_naive();
                let (year, month) = if date.month() == 1 {
                    (date.year() - 1, 12)
                } else {
                    (date.year(), date.month() - 1)
                };
                let start = NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|d| start_of_day(d, this_month))
                    .unwrap_or(this_month);
                DateRange::between(start, this_month - Duration::milliseconds(1))
            }
            DatePreset::All => DateRange::unbounded(),
        }
    }
}

impl FromStr for DatePreset {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        DatePreset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| HistoryError::InvalidPreset(s.to_string()))
    }
}

/// Bounds of a named preset (`today`, `yesterday`, `last7days`,
/// `last30days`, `thisMonth`, `lastMonth`, `all`) relative to now.
pub fn date_preset(name: &str) -> Result<DateRange> {
    Ok(name.parse::<DatePreset>()?.range_at(Local::now()))
}

/// `now` truncated to local midnight.
pub fn local_midnight(now: DateTime<Local>) -> DateTime<Local> {
    let fallback = now
        - Duration::seconds(i64::from(now.num_seconds_from_midnight()))
        - Duration::nanoseconds(i64::from(now.nanosecond()));
    start_of_day(now.date_naive(), fallback)
}

// Days starting inside a DST gap have no local midnight; use `fallback` then
fn start_of_day(date: NaiveDate, fallback: DateTime<Local>) -> DateTime<Local> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .unwrap_or(fallback)
}

fn start_of_month(now: DateTime<Local>) -> DateTime<Local> {
    let midnight = local_midnight(now);
    now.date_naive()
        .with_day(1)
        .map(|d| start_of_day(d, midnight))
        .unwrap_or(midnight)
}

/// 23:59:59.999 local time on the calendar day of `instant`.
pub(crate) fn end_of_day(instant: DateTime<Local>) -> DateTime<Local> {
    instant
        .date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .and_then(|naive| Local.from_local_datetime(&naive).latest())
        .unwrap_or(instant)
}
