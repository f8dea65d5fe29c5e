use std::sync::{mpsc::Receiver, Arc};

use chrono::Utc;
use uuid::Uuid;

use super::types::{HistoryEvent, Version, VersionAuthor, VersionChange};
use crate::{
    config::{validate_agent_id, HistoryConfig},
    diff::{compare_with_mode, field_diff_with_mode, ComparisonResult},
    error::{HistoryError, Result},
    notifier::Notifier,
    storage::{open_url, InMemoryStorage, KvStorage, LocalStorage, SqliteStorage},
};

/// Append-only version history per agent, persisted as one JSON list per
/// agent plus a "current version" pointer.
///
/// Every write reads the whole list, changes it in memory and writes it
/// back. Two writers working on the same agent at the same time race: the
/// last write to storage wins and the other update is lost. Nothing here
/// locks against that, since the storage is not owned by this process.
///
/// Reads never fail. Storage or parse errors are logged and reported as an
/// empty history. Writes report storage failures as
/// [`HistoryError::Persistence`].
pub struct VersionStore {
    storage: Arc<dyn KvStorage>,
    config: HistoryConfig,
    notifier: Notifier<HistoryEvent>,
}

impl VersionStore {
    pub fn new(storage: Arc<dyn KvStorage>) -> Self {
        Self::with_config(storage, HistoryConfig::default())
    }

    pub fn with_config(storage: Arc<dyn KvStorage>, config: HistoryConfig) -> Self {
        Self {
            storage,
            config,
            notifier: Notifier::new(),
        }
    }

    pub fn builder() -> VersionStoreBuilder {
        VersionStoreBuilder::default()
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Receives a [`HistoryEvent`] for every successful write.
    pub fn observer(&self) -> Receiver<HistoryEvent> {
        self.notifier.observer()
    }

    pub fn observe(&self, callback: impl FnMut(HistoryEvent) + Send + 'static) {
        self.notifier.observe(callback)
    }

    /// Ids of agents that have stored history.
    pub fn agents(&self) -> Vec<String> {
        let prefix = self.config.versions_prefix();
        match self.storage.list(&prefix) {
            Ok(keys) => keys
                .iter()
                .filter_map(|key| key.strip_prefix(&prefix))
                .filter_map(|name| name.strip_suffix(".json"))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                log::warn!("failed to list agents under '{}': {:#}", prefix, e);
                Vec::new()
            }
        }
    }

    /// All versions of an agent, most recent first.
    pub fn history(&self, agent_id: &str) -> Vec<Version> {
        match self.load(agent_id) {
            Ok(history) => history,
            Err(e) => {
                log::warn!("failed to read history for agent '{}': {:#}", agent_id, e);
                Vec::new()
            }
        }
    }

    pub fn version(&self, agent_id: &str, version_id: &str) -> Option<Version> {
        self.history(agent_id).into_iter().find(|v| v.id == version_id)
    }

    pub fn latest(&self, agent_id: &str) -> Option<Version> {
        self.history(agent_id).into_iter().next()
    }

    /// The version recorded as current, or the latest version when none
    /// has been recorded.
    pub fn current(&self, agent_id: &str) -> Option<Version> {
        if let Err(e) = validate_agent_id(agent_id) {
            log::warn!("{}", e);
            return None;
        }
        let history = self.history(agent_id);
        let current_id = match self.storage.get(&self.config.current_key(agent_id)) {
            Ok(id) => id,
            Err(e) => {
                log::warn!(
                    "failed to read current version for agent '{}': {:#}",
                    agent_id,
                    e
                );
                None
            }
        };

        if let Some(id) = current_id {
            let id = id.trim();
            if let Some(version) = history.iter().find(|v| v.id == id) {
                return Some(version.clone());
            }
            log::warn!(
                "current version '{}' of agent '{}' is not in its history",
                id,
                agent_id
            );
        }
        history.into_iter().next()
    }

    /// Records a new version on top of the agent's history. Changes are
    /// computed against the previous head.
    pub fn save_version(
        &self,
        agent_id: &str,
        content: &str,
        author: &VersionAuthor,
        message: &str,
        tags: &[String],
    ) -> Result<Version> {
        let mut history = self.load(agent_id)?;
        let version = self.next_version(&history, agent_id, content, author, message, tags);

        history.insert(0, version.clone());
        self.persist(agent_id, &history)?;

        log::info!(
            "saved version {} ({}) of agent '{}' with {} changes",
            version.version,
            version.id,
            agent_id,
            version.changes.len()
        );
        self.notifier
            .notify(HistoryEvent::Saved(agent_id.to_string(), version.id.clone()));
        Ok(version)
    }

    /// Replaces the tag set of one version. `Ok(None)` when the version is
    /// not in the agent's history.
    pub fn update_tags(
        &self,
        agent_id: &str,
        version_id: &str,
        tags: &[String],
    ) -> Result<Option<Version>> {
        let mut history = self.load(agent_id)?;
        let Some(version) = history.iter_mut().find(|v| v.id == version_id) else {
            return Ok(None);
        };
        version.tags = dedup_tags(tags);
        let updated = version.clone();

        self.persist(agent_id, &history)?;
        self.notifier
            .notify(HistoryEvent::TagsUpdated(agent_id.to_string(), version_id.to_string()));
        Ok(Some(updated))
    }

    /// Marks one version deployed, clears the flag on every other version
    /// of the agent and records it as current.
    pub fn set_deployed(&self, agent_id: &str, version_id: &str) -> Result<()> {
        let mut history = self.load(agent_id)?;
        if !history.iter().any(|v| v.id == version_id) {
            return Err(HistoryError::not_found(agent_id, version_id));
        }
        let previous = history.clone();
        mark_deployed(&mut history, version_id);
        self.commit_deployment(agent_id, &history, &previous, version_id)?;

        log::info!("deployed version {} of agent '{}'", version_id, agent_id);
        self.notifier
            .notify(HistoryEvent::Deployed(agent_id.to_string(), version_id.to_string()));
        Ok(())
    }

    /// Creates a new deployed version whose content is that of
    /// `version_id`. Existing versions keep their content; only their
    /// deployed flag is cleared. The new version, the flags and the pointer
    /// are committed together: on failure the history is left as it was.
    pub fn rollback(
        &self,
        agent_id: &str,
        version_id: &str,
        author: &VersionAuthor,
    ) -> Result<Version> {
        let mut history = self.load(agent_id)?;
        let target = history
            .iter()
            .find(|v| v.id == version_id)
            .cloned()
            .ok_or_else(|| HistoryError::not_found(agent_id, version_id))?;
        let previous = history.clone();

        let mut version = self.next_version(
            &history,
            agent_id,
            &target.content,
            author,
            &format!("Rollback to version {}", target.version),
            &["rollback".to_string()],
        );
        version.is_deployed = true;
        history.insert(0, version.clone());
        mark_deployed(&mut history, &version.id);
        self.commit_deployment(agent_id, &history, &previous, &version.id)?;

        log::info!(
            "rolled back agent '{}' to version {} as version {}",
            agent_id,
            target.version,
            version.version
        );
        self.notifier
            .notify(HistoryEvent::Saved(agent_id.to_string(), version.id.clone()));
        self.notifier
            .notify(HistoryEvent::Deployed(agent_id.to_string(), version.id.clone()));
        self.notifier.notify(HistoryEvent::RolledBack(
            agent_id.to_string(),
            version.id.clone(),
            target.id,
        ));
        Ok(version)
    }

    /// Removes every version and the current-version pointer of an agent.
    pub fn clear_history(&self, agent_id: &str) -> Result<()> {
        validate_agent_id(agent_id)?;
        self.storage
            .delete(&self.config.versions_key(agent_id))
            .map_err(HistoryError::Persistence)?;
        self.storage
            .delete(&self.config.current_key(agent_id))
            .map_err(HistoryError::Persistence)?;

        log::info!("cleared history of agent '{}'", agent_id);
        self.notifier.notify(HistoryEvent::Cleared(agent_id.to_string()));
        Ok(())
    }

    /// Diffs two stored versions of the same agent.
    pub fn compare_versions(
        &self,
        agent_id: &str,
        from_version_id: &str,
        to_version_id: &str,
    ) -> Result<ComparisonResult> {
        validate_agent_id(agent_id)?;
        let history = self.history(agent_id);
        let find = |id: &str| {
            history
                .iter()
                .find(|v| v.id == id)
                .ok_or_else(|| HistoryError::not_found(agent_id, id))
        };
        let from = find(from_version_id)?;
        let to = find(to_version_id)?;
        Ok(compare_with_mode(&from.content, &to.content, self.config.field_diff_mode))
    }

    // Write paths load through here so a failed read is never mistaken for
    // an empty history and overwritten.
    fn load(&self, agent_id: &str) -> Result<Vec<Version>> {
        validate_agent_id(agent_id)?;
        let key = self.config.versions_key(agent_id);
        let Some(json) = self.storage.get(&key).map_err(HistoryError::Persistence)? else {
            return Ok(Vec::new());
        };
        let mut history: Vec<Version> = serde_json::from_str(&json)?;
        history.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(history)
    }

    /// Builds the version that would follow the current head of `history`,
    /// with changes computed against that head.
    fn next_version(
        &self,
        history: &[Version],
        agent_id: &str,
        content: &str,
        author: &VersionAuthor,
        message: &str,
        tags: &[String],
    ) -> Version {
        let head = history.first();
        let changes = match head {
            Some(head) => field_diff_with_mode(&head.content, content, self.config.field_diff_mode)
                .into_iter()
                .map(|diff| VersionChange {
                    field: diff.path,
                    kind: diff.kind,
                    old_value: diff.old_value,
                    new_value: diff.new_value,
                })
                .collect(),
            None => vec![VersionChange::initial()],
        };

        Version {
            id: Uuid::now_v7().to_string(),
            agent_id: agent_id.to_string(),
            version: history.iter().map(|v| v.version).max().unwrap_or(0) + 1,
            timestamp: Utc::now(),
            author: author.clone(),
            message: message.to_string(),
            content: content.to_string(),
            changes,
            tags: dedup_tags(tags),
            is_deployed: false,
            parent_version_id: head.map(|h| h.id.clone()),
        }
    }

    // The list goes first, then the pointer. If the pointer cannot be
    // written the previous list is put back so flags and pointer agree.
    fn commit_deployment(
        &self,
        agent_id: &str,
        history: &[Version],
        previous: &[Version],
        version_id: &str,
    ) -> Result<()> {
        self.persist(agent_id, history)?;
        if let Err(e) = self.storage.set(&self.config.current_key(agent_id), version_id) {
            if let Err(restore) = self.persist(agent_id, previous) {
                log::error!(
                    "failed to restore history of agent '{}' after a failed deploy: {}",
                    agent_id,
                    restore
                );
            }
            return Err(HistoryError::Persistence(e));
        }
        Ok(())
    }

    fn persist(&self, agent_id: &str, history: &[Version]) -> Result<()> {
        let json = serde_json::to_string(history)?;
        self.storage
            .set(&self.config.versions_key(agent_id), &json)
            .map_err(HistoryError::Persistence)
    }
}

fn mark_deployed(history: &mut [Version], version_id: &str) {
    for version in history.iter_mut() {
        version.is_deployed = version.id == version_id;
    }
}

fn dedup_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}

#[derive(Default)]
pub struct VersionStoreBuilder {
    storage: Option<Arc<dyn KvStorage>>,
    config: HistoryConfig,
}

impl VersionStoreBuilder {
    pub fn in_memory(mut self) -> Self {
        self.storage = Some(Arc::new(InMemoryStorage::new()));
        self
    }

    pub fn local(mut self, base_path: &str) -> Self {
        self.storage = Some(Arc::new(LocalStorage::new(base_path)));
        self
    }

    pub fn sqlite<P: AsRef<std::path::Path>>(mut self, path: P) -> Result<Self> {
        self.storage = Some(Arc::new(SqliteStorage::open(path)?));
        Ok(self)
    }

    pub fn url(mut self, url: &str) -> Result<Self> {
        self.storage = Some(open_url(url)?);
        Ok(self)
    }

    pub fn storage(mut self, storage: Arc<dyn KvStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn config(mut self, config: HistoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Falls back to in-memory storage when none was chosen.
    pub fn build(self) -> VersionStore {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(InMemoryStorage::new()));
        VersionStore::with_config(storage, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::FieldDiffMode, history::ChangeType};

    fn author() -> VersionAuthor {
        VersionAuthor::new("u-1", "Ada Lovelace", "ada@example.com")
    }

    #[test]
    fn test_first_version_has_initial_change() -> Result<()> {
        let store = VersionStore::builder().in_memory().build();
        let v1 = store.save_version("agent", "a: 1", &author(), "init", &[])?;
        assert_eq!(v1.version, 1);
        assert_eq!(v1.parent_version_id, None);
        assert_eq!(v1.changes, vec![VersionChange::initial()]);
        assert!(!v1.is_deployed);
        Ok(())
    }

    #[test]
    fn test_changes_are_against_head() -> Result<()> {
        let store = VersionStore::builder().in_memory().build();
        let v1 = store.save_version("agent", "a: 1\nb: 2", &author(), "v1", &[])?;
        let v2 = store.save_version("agent", "a: 1\nb: 3", &author(), "v2", &[])?;

        assert_eq!(v2.version, 2);
        assert_eq!(v2.parent_version_id, Some(v1.id));
        assert_eq!(
            v2.changes,
            vec![VersionChange {
                field: "b".to_string(),
                kind: ChangeType::Modified,
                old_value: Some("2".to_string()),
                new_value: Some("3".to_string()),
            }]
        );
        Ok(())
    }

    #[test]
    fn test_structural_mode_records_list_paths() -> Result<()> {
        let store = VersionStore::builder()
            .in_memory()
            .config(HistoryConfig {
                field_diff_mode: FieldDiffMode::Structural,
                ..Default::default()
            })
            .build();
        store.save_version("agent", "tools:\n  - search\n  - escalate\n", &author(), "v1", &[])?;
        let v2 = store.save_version(
            "agent",
            "tools:\n  - search\n  - summarize\n  - notify\n",
            &author(),
            "v2",
            &[],
        )?;

        assert_eq!(
            v2.changes,
            vec![
                VersionChange {
                    field: "tools[1]".to_string(),
                    kind: ChangeType::Modified,
                    old_value: Some("escalate".to_string()),
                    new_value: Some("summarize".to_string()),
                },
                VersionChange {
                    field: "tools[2]".to_string(),
                    kind: ChangeType::Added,
                    old_value: None,
                    new_value: Some("notify".to_string()),
                },
            ]
        );
        // the default scanner skips list items entirely
        let flat = VersionStore::builder().in_memory().build();
        flat.save_version("agent", "tools:\n  - search\n", &author(), "v1", &[])?;
        let v2 = flat.save_version("agent", "tools:\n  - notify\n", &author(), "v2", &[])?;
        assert!(v2.changes.is_empty());
        Ok(())
    }

    #[test]
    fn test_rollback_writes_new_deployed_head() -> Result<()> {
        let store = VersionStore::builder().in_memory().build();
        let v1 = store.save_version("agent", "a: 1", &author(), "v1", &[])?;
        store.save_version("agent", "a: 2", &author(), "v2", &[])?;

        let rolled = store.rollback("agent", &v1.id, &author())?;
        assert!(rolled.is_deployed);
        assert_eq!(rolled.content, v1.content);
        let history = store.history("agent");
        assert_eq!(history.len(), 3);
        assert_eq!(history[0], rolled);
        assert!(history[1..].iter().all(|v| !v.is_deployed));
        assert_eq!(store.current("agent"), Some(rolled));
        Ok(())
    }

    #[test]
    fn test_tags_are_deduplicated() -> Result<()> {
        let store = VersionStore::builder().in_memory().build();
        let tags = vec!["prod".to_string(), "hotfix".to_string(), "prod".to_string()];
        let v1 = store.save_version("agent", "a: 1", &author(), "init", &tags)?;
        assert_eq!(v1.tags, vec!["prod".to_string(), "hotfix".to_string()]);
        Ok(())
    }

    #[test]
    fn test_corrupt_history_reads_empty_but_blocks_writes() -> Result<()> {
        let storage = Arc::new(InMemoryStorage::new());
        let store = VersionStore::new(storage.clone());
        storage.set(&store.config().versions_key("agent"), "not json")?;

        assert!(store.history("agent").is_empty());
        assert!(store.latest("agent").is_none());
        let result = store.save_version("agent", "a: 1", &author(), "init", &[]);
        assert!(matches!(result, Err(HistoryError::Serialization(_))));
        // the unreadable list is left in place
        assert_eq!(
            storage.get(&store.config().versions_key("agent"))?,
            Some("not json".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_dangling_current_pointer_falls_back_to_latest() -> Result<()> {
        let storage = Arc::new(InMemoryStorage::new());
        let store = VersionStore::new(storage.clone());
        store.save_version("agent", "a: 1", &author(), "v1", &[])?;
        let v2 = store.save_version("agent", "a: 2", &author(), "v2", &[])?;
        storage.set(&store.config().current_key("agent"), "missing-id")?;

        assert_eq!(store.current("agent").map(|v| v.id), Some(v2.id));
        Ok(())
    }

    #[test]
    fn test_events_are_published() -> Result<()> {
        let store = VersionStore::builder().in_memory().build();
        let rx = store.observer();

        let v1 = store.save_version("agent", "a: 1", &author(), "v1", &[])?;
        store.set_deployed("agent", &v1.id)?;
        store.clear_history("agent")?;

        let events: Vec<HistoryEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                HistoryEvent::Saved("agent".to_string(), v1.id.clone()),
                HistoryEvent::Deployed("agent".to_string(), v1.id.clone()),
                HistoryEvent::Cleared("agent".to_string()),
            ]
        );
        Ok(())
    }
}
