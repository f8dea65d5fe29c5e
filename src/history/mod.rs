//! Per-agent version history: the store, filters over a loaded history,
//! and summary statistics.

mod presets;
pub mod query;
mod seed;
mod stats;
mod store;
mod types;

pub use presets::{date_preset, local_midnight, DatePreset, DateRange};
pub use query::{
    filter_by_date_range, search_versions, version_range, versions_by_tag, versions_within_days,
    versions_within_days_at,
};
pub use seed::seed_demo_history;
pub use stats::{stats, stats_at, VersionStats};
pub use store::{VersionStore, VersionStoreBuilder};
pub use types::{ChangeType, HistoryEvent, Version, VersionAuthor, VersionChange};
