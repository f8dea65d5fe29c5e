use super::store::VersionStore;
use super::types::{Version, VersionAuthor};
use crate::error::Result;

const DEMO_V1: &str = "\
name: support-assistant
description: Answers customer questions
model:
  provider: openai
  name: gpt-4o
  temperature: 0.7
prompt: You are a helpful support assistant.
";

const DEMO_V2: &str = "\
name: support-assistant
description: Answers customer questions
model:
  provider: openai
  name: gpt-4o
  temperature: 0.3
  max_tokens: 1024
prompt: You are a helpful support assistant.
tools:
  search: enabled
";

const DEMO_V3: &str = "\
name: support-assistant
description: Answers customer and billing questions
model:
  provider: anthropic
  name: claude-sonnet
  temperature: 0.3
  max_tokens: 2048
tools:
  search: enabled
  billing: enabled
";

/// Inserts three example versions when `agent_id` has no history yet.
/// Existing history is returned untouched.
pub fn seed_demo_history(store: &VersionStore, agent_id: &str) -> Result<Vec<Version>> {
    let existing = store.history(agent_id);
    if !existing.is_empty() {
        log::debug!("agent '{}' already has {} versions, not seeding", agent_id, existing.len());
        return Ok(existing);
    }

    let ops = VersionAuthor::new("demo-ops", "Ops Team", "ops@example.com");
    let lead = VersionAuthor::new("demo-lead", "Agent Lead", "lead@example.com");

    store.save_version(agent_id, DEMO_V1, &ops, "Initial configuration", &["initial".to_string()])?;
    store.save_version(
        agent_id,
        DEMO_V2,
        &lead,
        "Lower temperature and enable search",
        &["stable".to_string()],
    )?;
    store.save_version(agent_id, DEMO_V3, &lead, "Switch provider and add billing tool", &[])?;

    log::info!("seeded demo history for agent '{}'", agent_id);
    Ok(store.history(agent_id))
}
