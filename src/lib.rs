pub mod config;
pub mod diff;
pub mod error;
pub mod history;
pub mod notifier;
pub mod storage;

pub use config::{validate_agent_id, FieldDiffMode, HistoryConfig};
pub use error::{HistoryError, Result};
pub use history::VersionStore;
