use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a version. Stored as a snapshot on the version.
#[derive(Serialize, Deserialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct VersionAuthor {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl VersionAuthor {
    pub fn new(id: &str, name: &str, email: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            avatar: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// One field-level delta against the previous version. Values are kept as
/// display strings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionChange {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: ChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

impl VersionChange {
    /// The single change recorded on an agent's first version.
    pub fn initial() -> Self {
        Self {
            field: "config".to_string(),
            kind: ChangeType::Added,
            old_value: None,
            new_value: Some("Initial version".to_string()),
        }
    }
}

/// A numbered snapshot of an agent's full configuration text. Only `tags`
/// and `is_deployed` change after creation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub agent_id: String,
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub author: VersionAuthor,
    pub message: String,
    pub content: String,
    #[serde(default)]
    pub changes: Vec<VersionChange>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_deployed: bool,
    #[serde(default)]
    pub parent_version_id: Option<String>,
}

impl Version {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Published by the store after every successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryEvent {
    /// agent_id, version_id
    Saved(String, String),
    TagsUpdated(String, String),
    Deployed(String, String),
    /// agent_id, new version_id, target version_id
    RolledBack(String, String, String),
    Cleared(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_json_field_names() -> anyhow::Result<()> {
        let version = Version {
            id: "v-1".to_string(),
            agent_id: "agent-1".to_string(),
            version: 1,
            timestamp: Utc::now(),
            author: VersionAuthor::new("u1", "Ada", "ada@example.com"),
            message: "init".to_string(),
            content: "a: 1".to_string(),
            changes: vec![VersionChange::initial()],
            tags: vec![],
            is_deployed: false,
            parent_version_id: None,
        };
        let json = serde_json::to_value(&version)?;
        assert_eq!(json["agentId"], "agent-1");
        assert_eq!(json["isDeployed"], false);
        assert!(json["parentVersionId"].is_null());
        assert_eq!(json["changes"][0]["type"], "added");
        assert_eq!(json["changes"][0]["newValue"], "Initial version");
        assert!(json["author"].get("avatar").is_none());

        let back: Version = serde_json::from_value(json)?;
        assert_eq!(back, version);
        Ok(())
    }

    #[test]
    fn test_missing_optional_fields_default() -> anyhow::Result<()> {
        let json = r#"{
            "id": "x", "agentId": "a", "version": 3,
            "timestamp": "2026-01-02T03:04:05Z",
            "author": {"id": "u", "name": "N", "email": "e"},
            "message": "m", "content": "c"
        }"#;
        let version: Version = serde_json::from_str(json)?;
        assert!(version.tags.is_empty());
        assert!(!version.is_deployed);
        assert_eq!(version.parent_version_id, None);
        Ok(())
    }
}
