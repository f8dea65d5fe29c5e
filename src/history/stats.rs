use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

use super::presets::local_midnight;
use super::types::Version;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionStats {
    pub total: usize,
    /// Since local midnight.
    pub today: usize,
    /// Trailing 7 days.
    pub this_week: usize,
    /// Trailing 30 days.
    pub this_month: usize,
    /// Author name with the most versions; ties go to the first seen.
    pub most_active_author: Option<String>,
    /// Mean changes per version, one decimal place.
    pub average_changes: f64,
}

pub fn stats(history: &[Version]) -> VersionStats {
    stats_at(history, Local::now())
}

pub fn stats_at(history: &[Version], now: DateTime<Local>) -> VersionStats {
    if history.is_empty() {
        return VersionStats::default();
    }

    let midnight = local_midnight(now).with_timezone(&Utc);
    let week_ago = (now - Duration::days(7)).with_timezone(&Utc);
    let month_ago = (now - Duration::days(30)).with_timezone(&Utc);
    let count_since =
        |cutoff: DateTime<Utc>| history.iter().filter(|v| v.timestamp >= cutoff).count();

    let mut author_counts: Vec<(&str, usize)> = Vec::new();
    for version in history {
        match author_counts.iter_mut().find(|(name, _)| *name == version.author.name.as_str()) {
            Some((_, count)) => *count += 1,
            None => author_counts.push((version.author.name.as_str(), 1)),
        }
    }
    let mut most_active: Option<(&str, usize)> = None;
    for &(name, count) in &author_counts {
        if most_active.map_or(true, |(_, best)| count > best) {
            most_active = Some((name, count));
        }
    }

    let total_changes: usize = history.iter().map(|v| v.changes.len()).sum();
    let average = total_changes as f64 / history.len() as f64;

    VersionStats {
        total: history.len(),
        today: count_since(midnight),
        this_week: count_since(week_ago),
        this_month: count_since(month_ago),
        most_active_author: most_active.map(|(name, _)| name.to_string()),
        average_changes: (average * 10.0).round() / 10.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::query::fixtures::version;
    use crate::history::VersionChange;
    use chrono::TimeZone;

    fn local(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).earliest().unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_empty_history() {
        let stats = stats(&[]);
        assert_eq!(stats, VersionStats::default());
        assert_eq!(stats.most_active_author, None);
    }

    #[test]
    fn test_windows_and_author() {
        let now = Local.with_ymd_and_hms(2026, 6, 15, 14, 0, 0).earliest().unwrap();
        let mut history = vec![
            version(5, local(2026, 6, 15, 9), "Grace", "m", &[]),
            version(4, local(2026, 6, 14, 22), "Ada", "m", &[]),
            version(3, local(2026, 6, 10, 8), "Grace", "m", &[]),
            version(2, local(2026, 5, 20, 8), "Ada", "m", &[]),
            version(1, local(2026, 1, 2, 8), "Linus", "m", &[]),
        ];
        history[0].changes = vec![VersionChange::initial(); 3];
        history[1].changes = vec![VersionChange::initial(); 1];
        history[2].changes = vec![VersionChange::initial(); 1];

        let stats = stats_at(&history, now);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.today, 1);
        assert_eq!(stats.this_week, 3);
        assert_eq!(stats.this_month, 4);
        // Grace and Ada both have two; Grace appears first
        assert_eq!(stats.most_active_author.as_deref(), Some("Grace"));
        assert_eq!(stats.average_changes, 1.0);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        let now = Local::now();
        let mut history = vec![
            version(3, now.with_timezone(&Utc), "A", "m", &[]),
            version(2, now.with_timezone(&Utc), "A", "m", &[]),
            version(1, now.with_timezone(&Utc), "A", "m", &[]),
        ];
        history[0].changes = vec![VersionChange::initial(); 2];
        // 2 / 3 = 0.666...
        assert_eq!(stats_at(&history, now).average_changes, 0.7);
        history[1].changes = vec![VersionChange::initial(); 2];
        // 4 / 3 = 1.333...
        assert_eq!(stats_at(&history, now).average_changes, 1.3);
    }
}
