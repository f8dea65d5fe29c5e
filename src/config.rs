use serde::{Deserialize, Serialize};

/// How field-level changes are extracted from configuration text.
#[derive(Serialize, Deserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldDiffMode {
    /// Indentation scanner over `key: value` lines.
    #[default]
    Flat,
    /// Paths over a parsed YAML document.
    Structural,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Prefix for every storage key the store writes.
    pub key_prefix: String,
    pub field_diff_mode: FieldDiffMode,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            key_prefix: "agent-history".to_string(),
            field_diff_mode: FieldDiffMode::Flat,
        }
    }
}

/// Agent ids become a single segment of every storage key, so they must not
/// be empty, contain path separators or control characters, or be `.`/`..`.
pub fn validate_agent_id(agent_id: &str) -> crate::Result<()> {
    let valid = !agent_id.is_empty()
        && agent_id != "."
        && agent_id != ".."
        && !agent_id.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if valid {
        Ok(())
    } else {
        Err(crate::HistoryError::InvalidAgentId(agent_id.to_string()))
    }
}

impl HistoryConfig {
    pub(crate) fn versions_prefix(&self) -> String {
        format!("{}/versions/", self.key_prefix)
    }

    pub(crate) fn versions_key(&self, agent_id: &str) -> String {
        format!("{}{}.json", self.versions_prefix(), agent_id)
    }

    pub(crate) fn current_key(&self, agent_id: &str) -> String {
        format!("{}/current/{}", self.key_prefix, agent_id)
    }
}
