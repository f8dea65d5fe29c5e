use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("version {version_id} not found for agent {agent_id}")]
    NotFound { agent_id: String, version_id: String },

    /// A write to the backing storage failed; the edit may not be durable.
    #[error("persistence error: {0:#}")]
    Persistence(#[source] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The id cannot be used as one segment of a storage key.
    #[error("invalid agent id: '{0}'")]
    InvalidAgentId(String),

    #[error("unknown date preset: {0}")]
    InvalidPreset(String),

    #[error("invalid storage url: {0}")]
    InvalidStorageUrl(String),
}

impl HistoryError {
    pub(crate) fn not_found(agent_id: &str, version_id: &str) -> Self {
        HistoryError::NotFound {
            agent_id: agent_id.to_string(),
            version_id: version_id.to_string(),
        }
    }
}

impl From<anyhow::Error> for HistoryError {
    fn from(e: anyhow::Error) -> Self {
        HistoryError::Persistence(e)
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;
