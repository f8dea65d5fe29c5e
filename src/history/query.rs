//! Filters over an already loaded history. None of these touch storage.

use chrono::{DateTime, Duration, Local, Utc};

use super::presets::{end_of_day, DateRange};
use super::types::Version;

/// Case-insensitive substring match on message, author name or any tag.
/// A blank query matches everything.
pub fn search_versions(history: &[Version], query: &str) -> Vec<Version> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return history.to_vec();
    }
    history
        .iter()
        .filter(|v| {
            v.message.to_lowercase().contains(&query)
                || v.author.name.to_lowercase().contains(&query)
                || v.tags.iter().any(|t| t.to_lowercase().contains(&query))
        })
        .cloned()
        .collect()
}

/// Versions inside `range`. The start is inclusive; the end includes the
/// whole local calendar day it falls on.
pub fn filter_by_date_range(history: &[Version], range: &DateRange) -> Vec<Version> {
    let start = range.start.map(|s| s.with_timezone(&Utc));
    let end = range.end.map(|e| end_of_day(e).with_timezone(&Utc));
    history
        .iter()
        .filter(|v| start.map_or(true, |s| v.timestamp >= s))
        .filter(|v| end.map_or(true, |e| v.timestamp <= e))
        .cloned()
        .collect()
}

pub fn versions_by_tag(history: &[Version], tag: &str) -> Vec<Version> {
    history.iter().filter(|v| v.has_tag(tag)).cloned().collect()
}

pub fn versions_within_days(history: &[Version], days: i64) -> Vec<Version> {
    versions_within_days_at(history, days, Local::now())
}

/// Versions from the `days` days before `now`. A window reaching beyond
/// the representable calendar keeps the whole history; a negative one that
/// does keeps nothing.
pub fn versions_within_days_at(
    history: &[Version],
    days: i64,
    now: DateTime<Local>,
) -> Vec<Version> {
    let cutoff = Duration::try_days(days).and_then(|span| now.checked_sub_signed(span));
    match cutoff {
        Some(cutoff) => {
            let cutoff = cutoff.with_timezone(&Utc);
            history.iter().filter(|v| v.timestamp >= cutoff).cloned().collect()
        }
        None if days < 0 => Vec::new(),
        None => history.to_vec(),
    }
}

/// Versions numbered `from..=to`.
pub fn version_range(history: &[Version], from: u32, to: u32) -> Vec<Version> {
    history
        .iter()
        .filter(|v| (from..=to).contains(&v.version))
        .cloned()
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Utc};

    use crate::history::{Version, VersionAuthor};

    pub fn version(
        number: u32,
        timestamp: DateTime<Utc>,
        author: &str,
        message: &str,
        tags: &[&str],
    ) -> Version {
        Version {
            id: format!("id-{}", number),
            agent_id: "agent".to_string(),
            version: number,
            timestamp,
            author: VersionAuthor::new(&author.to_lowercase(), author, "team@example.com"),
            message: message.to_string(),
            content: format!("version: {}", number),
            changes: Vec::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_deployed: false,
            parent_version_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::version;
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).earliest().unwrap()
    }

    fn sample() -> Vec<Version> {
        let at = |d: u32, h: u32| local(2026, 4, d, h).with_timezone(&Utc);
        vec![
            version(3, at(10, 18), "Grace", "Tune temperature", &["prod"]),
            version(2, at(9, 9), "Ada", "Add search tool", &["Experiment"]),
            version(1, at(1, 12), "Ada", "Initial import", &[]),
        ]
    }

    fn numbers(versions: &[Version]) -> Vec<u32> {
        versions.iter().map(|v| v.version).collect()
    }

    #[test]
    fn test_search_matches_message_author_and_tag() {
        let history = sample();
        assert_eq!(numbers(&search_versions(&history, "SEARCH")), vec![2]);
        assert_eq!(numbers(&search_versions(&history, "ada")), vec![2, 1]);
        assert_eq!(numbers(&search_versions(&history, "experiment")), vec![2]);
        assert_eq!(numbers(&search_versions(&history, "  ")), vec![3, 2, 1]);
        assert!(search_versions(&history, "nothing").is_empty());
    }

    #[test]
    fn test_date_range_end_covers_whole_day() {
        let history = sample();
        let range = DateRange::between(local(2026, 4, 9, 12), local(2026, 4, 10, 0));
        // version 2 is before the start hour, version 3 is late on the end day
        assert_eq!(numbers(&filter_by_date_range(&history, &range)), vec![3]);

        let range = DateRange { start: None, end: Some(local(2026, 4, 9, 0)) };
        assert_eq!(numbers(&filter_by_date_range(&history, &range)), vec![2, 1]);

        let all = filter_by_date_range(&history, &DateRange::unbounded());
        assert_eq!(numbers(&all), vec![3, 2, 1]);
    }

    #[test]
    fn test_tag_filter_is_exact() {
        let history = sample();
        assert_eq!(numbers(&versions_by_tag(&history, "prod")), vec![3]);
        assert!(versions_by_tag(&history, "experiment").is_empty());
    }

    #[test]
    fn test_within_days() {
        let history = sample();
        let now = local(2026, 4, 11, 12);
        assert_eq!(numbers(&versions_within_days_at(&history, 2, now)), vec![3]);
        assert_eq!(numbers(&versions_within_days_at(&history, 30, now)), vec![3, 2, 1]);
    }

    #[test]
    fn test_within_days_out_of_range() {
        let history = sample();
        let now = local(2026, 4, 11, 12);
        let all = versions_within_days_at(&history, i64::MAX, now);
        assert_eq!(numbers(&all), vec![3, 2, 1]);
        let all = versions_within_days_at(&history, 1 << 40, now);
        assert_eq!(numbers(&all), vec![3, 2, 1]);
        assert!(versions_within_days_at(&history, i64::MIN, now).is_empty());
        assert!(versions_within_days_at(&history, -3, now).is_empty());
        assert!(versions_within_days_at(&[], i64::MAX, now).is_empty());
    }

    #[test]
    fn test_version_range_inclusive() {
        let history = sample();
        assert_eq!(numbers(&version_range(&history, 2, 3)), vec![3, 2]);
        assert!(version_range(&history, 3, 2).is_empty());
    }
}
