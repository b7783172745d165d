//! Single-document JSON store.
//!
//! The document is loaded lazily on first access, migrated if it was written
//! by an older version, and cached for the life of the process. Every
//! mutation rewrites the whole file. The cache lock is held across each
//! read-modify-write, so the store is the single writer of its file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use super::migration::migrate_store;
use super::{AgentStore, BrainEntryFilter};
use crate::error::StoreError;
use crate::models::{
    Agent, AgentPatch, BrainEntry, BrainEntryPatch, CreateAgentInput, NewBrainEntry,
    SkillCategory, StoreShape,
};

pub struct JsonFileStore {
    path: PathBuf,
    cache: Mutex<Option<StoreShape>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock the cache, loading the document on first use.
    async fn state(&self) -> Result<MappedMutexGuard<'_, StoreShape>, StoreError> {
        let mut guard = self.cache.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        Ok(MutexGuard::map(guard, |cache| {
            cache.get_or_insert_with(StoreShape::default)
        }))
    }

    async fn load(&self) -> Result<StoreShape, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Store file missing, creating empty store");
                let shape = StoreShape::default();
                self.persist(&shape).await?;
                return Ok(shape);
            }
            Err(err) => return Err(err.into()),
        };

        let mut document: Value = serde_json::from_str(&raw)?;
        let migrated = migrate_store(&mut document);
        let shape: StoreShape = serde_json::from_value(document)?;
        if migrated {
            info!(
                path = %self.path.display(),
                agents = shape.agents.len(),
                "Migrated legacy agent records"
            );
            self.persist(&shape).await?;
        }
        debug!(agents = shape.agents.len(), "Store loaded");
        Ok(shape)
    }

    async fn persist(&self, shape: &StoreShape) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(shape)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Run `mutate` against a copy of the store and commit it only after the
    /// file write succeeds. `None` from `mutate` means nothing changed.
    async fn mutate<T>(
        &self,
        mutate: impl FnOnce(&mut StoreShape) -> Result<Option<T>, StoreError>,
    ) -> Result<Option<T>, StoreError> {
        let mut state = self.state().await?;
        let mut next = state.clone();
        let Some(result) = mutate(&mut next)? else {
            return Ok(None);
        };
        self.persist(&next).await?;
        *state = next;
        Ok(Some(result))
    }

    /// Like [`Self::mutate`] for operations that always change the store.
    async fn write<T>(
        &self,
        write: impl FnOnce(&mut StoreShape) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state().await?;
        let mut next = state.clone();
        let result = write(&mut next)?;
        self.persist(&next).await?;
        *state = next;
        Ok(result)
    }
}

fn unique_id(agents: &[Agent], base: &str) -> String {
    let taken = |candidate: &str| agents.iter().any(|agent| agent.id == candidate);
    if !taken(base) {
        return base.to_string();
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait::async_trait]
impl AgentStore for JsonFileStore {
    async fn get_all(&self) -> Result<Vec<Agent>, StoreError> {
        Ok(self.state().await?.agents.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Agent>, StoreError> {
        let state = self.state().await?;
        Ok(state.agents.iter().find(|agent| agent.id == id).cloned())
    }

    async fn get_current(&self) -> Result<Option<Agent>, StoreError> {
        let state = self.state().await?;
        let Some(current) = state.current_agent_id.as_deref() else {
            return Ok(None);
        };
        Ok(state.agents.iter().find(|agent| agent.id == current).cloned())
    }

    async fn get_current_id(&self) -> Result<Option<String>, StoreError> {
        Ok(self.state().await?.current_agent_id.clone())
    }

    async fn set_current_id(&self, id: Option<String>) -> Result<(), StoreError> {
        self.write(|store| {
            store.current_agent_id = id;
            Ok(())
        })
        .await
    }

    async fn set_current_id_checked(&self, id: Option<String>) -> Result<(), StoreError> {
        self.write(|store| {
            if let Some(id) = id.as_deref()
                && !store.agents.iter().any(|agent| agent.id == id)
            {
                return Err(StoreError::AgentNotFound(id.to_string()));
            }
            store.current_agent_id = id;
            Ok(())
        })
        .await
    }

    async fn create(&self, input: CreateAgentInput) -> Result<Agent, StoreError> {
        let agent = self
            .write(|store| {
                let requested_id = non_blank(input.id.as_deref());
                let id = match requested_id {
                    Some(base) => unique_id(&store.agents, base),
                    None => Uuid::new_v4().to_string(),
                };
                let appearance_seed = non_blank(input.appearance_seed.as_deref())
                    .or(requested_id)
                    .map(str::to_string)
                    .unwrap_or_else(|| input.name.clone());
                let skill_categories = match input.skill_categories {
                    Some(categories) if !categories.is_empty() => categories,
                    _ => vec![SkillCategory::default()],
                };

                let mut agent = Agent {
                    id,
                    name: input.name,
                    description: input.description,
                    system_prompt: input.system_prompt,
                    skill_categories,
                    skills: input.skills.unwrap_or_default(),
                    context_refs: input.context_refs.unwrap_or_default(),
                    brain_entries: input.brain_entries.unwrap_or_default(),
                    appearance_seed: Some(appearance_seed),
                };
                agent.normalize_skill_categories();
                store.agents.push(agent.clone());
                Ok(agent)
            })
            .await?;
        info!(agent_id = %agent.id, name = %agent.name, "Agent created");
        Ok(agent)
    }

    async fn update(&self, id: &str, patch: AgentPatch) -> Result<Option<Agent>, StoreError> {
        self.mutate(|store| {
            let Some(agent) = store.agents.iter_mut().find(|agent| agent.id == id) else {
                return Ok(None);
            };
            patch.apply_to(agent);
            agent.normalize_skill_categories();
            Ok(Some(agent.clone()))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let removed = self
            .mutate(|store| {
                let before = store.agents.len();
                store.agents.retain(|agent| agent.id != id);
                if store.agents.len() == before {
                    return Ok(None);
                }
                if store.current_agent_id.as_deref() == Some(id) {
                    store.current_agent_id = None;
                }
                Ok(Some(()))
            })
            .await?
            .is_some();
        if removed {
            info!(agent_id = %id, "Agent deleted");
        }
        Ok(removed)
    }

    async fn get_brain_entries(&self, agent_id: &str) -> Result<Vec<BrainEntry>, StoreError> {
        let state = self.state().await?;
        Ok(state
            .agents
            .iter()
            .find(|agent| agent.id == agent_id)
            .map(|agent| agent.brain_entries.clone())
            .unwrap_or_default())
    }

    async fn create_brain_entry(
        &self,
        agent_id: &str,
        entry: NewBrainEntry,
    ) -> Result<BrainEntry, StoreError> {
        let entry = self
            .write(|store| {
                let agent = store
                    .agents
                    .iter_mut()
                    .find(|agent| agent.id == agent_id)
                    .ok_or_else(|| StoreError::AgentNotFound(agent_id.to_string()))?;
                let entry = entry.into_entry(agent_id);
                agent.brain_entries.push(entry.clone());
                Ok(entry)
            })
            .await?;
        debug!(agent_id = %agent_id, entry_id = %entry.id, kind = %entry.entry_type, "Brain entry created");
        Ok(entry)
    }

    async fn update_brain_entry(
        &self,
        agent_id: &str,
        entry_id: &str,
        patch: BrainEntryPatch,
    ) -> Result<Option<BrainEntry>, StoreError> {
        self.mutate(|store| {
            let entry = store
                .agents
                .iter_mut()
                .find(|agent| agent.id == agent_id)
                .and_then(|agent| {
                    agent
                        .brain_entries
                        .iter_mut()
                        .find(|entry| entry.id == entry_id)
                });
            let Some(entry) = entry else {
                return Ok(None);
            };
            patch.apply_to(entry);
            Ok(Some(entry.clone()))
        })
        .await
    }

    async fn toggle_brain_entry_pin(
        &self,
        agent_id: &str,
        entry_id: &str,
    ) -> Result<Option<BrainEntry>, StoreError> {
        self.mutate(|store| {
            let entry = store
                .agents
                .iter_mut()
                .find(|agent| agent.id == agent_id)
                .and_then(|agent| {
                    agent
                        .brain_entries
                        .iter_mut()
                        .find(|entry| entry.id == entry_id)
                });
            let Some(entry) = entry else {
                return Ok(None);
            };
            entry.pinned = !entry.pinned;
            Ok(Some(entry.clone()))
        })
        .await
    }

    async fn delete_brain_entry(&self, agent_id: &str, entry_id: &str) -> Result<bool, StoreError> {
        let removed = self
            .mutate(|store| {
                let Some(agent) = store.agents.iter_mut().find(|agent| agent.id == agent_id)
                else {
                    return Ok(None);
                };
                let before = agent.brain_entries.len();
                agent.brain_entries.retain(|entry| entry.id != entry_id);
                if agent.brain_entries.len() == before {
                    return Ok(None);
                }
                Ok(Some(()))
            })
            .await?;
        Ok(removed.is_some())
    }

    async fn query_brain_entries(
        &self,
        agent_id: &str,
        filter: &BrainEntryFilter,
    ) -> Result<Vec<BrainEntry>, StoreError> {
        let state = self.state().await?;
        Ok(state
            .agents
            .iter()
            .find(|agent| agent.id == agent_id)
            .map(|agent| filter.apply(&agent.brain_entries))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BrainEntryType, Skill};
    use serde_json::json;
    use tempfile::{TempDir, tempdir};

    fn create_test_store() -> (JsonFileStore, TempDir) {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("zoo").join("agents.json");
        (JsonFileStore::new(path), temp_dir)
    }

    fn input_with_id(id: &str) -> CreateAgentInput {
        CreateAgentInput {
            id: Some(id.to_string()),
            ..CreateAgentInput::named("Foo")
        }
    }

    #[tokio::test]
    async fn test_first_access_creates_empty_file() {
        let (store, _tmp) = create_test_store();

        assert!(store.get_all().await.unwrap().is_empty());
        assert_eq!(store.get_current_id().await.unwrap(), None);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, json!({ "agents": [], "currentAgentId": null }));
        assert!(raw.contains("\n  \"agents\""));
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let (store, _tmp) = create_test_store();

        let agent = store.create(CreateAgentInput::named("Sage")).await.unwrap();

        assert!(Uuid::parse_str(&agent.id).is_ok());
        assert_eq!(agent.skill_categories, vec![SkillCategory::default()]);
        assert_eq!(agent.skill_categories[0].name, "General");
        assert!(agent.skills.is_empty());
        assert!(agent.context_refs.is_empty());
        assert!(agent.brain_entries.is_empty());
        assert_eq!(agent.appearance_seed.as_deref(), Some("Sage"));
    }

    #[tokio::test]
    async fn test_colliding_ids_get_numeric_suffix() {
        let (store, _tmp) = create_test_store();

        let first = store.create(input_with_id("foo")).await.unwrap();
        let second = store.create(input_with_id("foo")).await.unwrap();
        let third = store.create(input_with_id(" foo ")).await.unwrap();

        assert_eq!(first.id, "foo");
        assert_eq!(second.id, "foo-2");
        assert_eq!(third.id, "foo-3");
        assert_eq!(third.appearance_seed.as_deref(), Some("foo"));
    }

    #[tokio::test]
    async fn test_explicit_appearance_seed_wins() {
        let (store, _tmp) = create_test_store();
        let input = CreateAgentInput {
            appearance_seed: Some(" sprite-7 ".to_string()),
            ..input_with_id("foo")
        };

        let agent = store.create(input).await.unwrap();
        assert_eq!(agent.appearance_seed.as_deref(), Some("sprite-7"));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let (store, _tmp) = create_test_store();
        let input = CreateAgentInput {
            system_prompt: "You are Sage.".to_string(),
            skills: Some(vec![Skill {
                id: "research".to_string(),
                name: "Research".to_string(),
                description: "Find things".to_string(),
                category_id: "nowhere".to_string(),
                enabled: true,
            }]),
            ..input_with_id("sage")
        };

        let created = store.create(input).await.unwrap();
        let fetched = store.get_by_id("sage").await.unwrap().unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.skills[0].category_id, "general");
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let (store, _tmp) = create_test_store();
        let created = store
            .create(CreateAgentInput {
                description: "Original".to_string(),
                ..input_with_id("sage")
            })
            .await
            .unwrap();

        let patch = AgentPatch {
            name: Some("Sage II".to_string()),
            ..Default::default()
        };
        let updated = store.update("sage", patch).await.unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Sage II");
        assert_eq!(updated.description, "Original");
        assert_eq!(updated.appearance_seed, created.appearance_seed);
    }

    #[tokio::test]
    async fn test_update_missing_agent() {
        let (store, _tmp) = create_test_store();
        let result = store.update("ghost", AgentPatch::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_current_agent_clears_pointer() {
        let (store, _tmp) = create_test_store();
        store.create(input_with_id("sage")).await.unwrap();
        store.set_current_id(Some("sage".to_string())).await.unwrap();

        assert!(store.delete("sage").await.unwrap());
        assert_eq!(store.get_current_id().await.unwrap(), None);
        assert!(!store.delete("sage").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_other_agent_keeps_pointer() {
        let (store, _tmp) = create_test_store();
        store.create(input_with_id("sage")).await.unwrap();
        store.create(input_with_id("scout")).await.unwrap();
        store.set_current_id(Some("sage".to_string())).await.unwrap();

        assert!(store.delete("scout").await.unwrap());
        assert_eq!(store.get_current_id().await.unwrap().as_deref(), Some("sage"));
    }

    #[tokio::test]
    async fn test_set_current_verbatim_allows_dangling_pointer() {
        let (store, _tmp) = create_test_store();

        store.set_current_id(Some("ghost".to_string())).await.unwrap();

        assert_eq!(store.get_current_id().await.unwrap().as_deref(), Some("ghost"));
        assert!(store.get_current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_current_checked_rejects_unknown_agent() {
        let (store, _tmp) = create_test_store();
        store.create(input_with_id("sage")).await.unwrap();

        let err = store
            .set_current_id_checked(Some("ghost".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AgentNotFound(id) if id == "ghost"));
        assert_eq!(store.get_current_id().await.unwrap(), None);

        store
            .set_current_id_checked(Some("sage".to_string()))
            .await
            .unwrap();
        assert_eq!(store.get_current().await.unwrap().unwrap().id, "sage");

        store.set_current_id_checked(None).await.unwrap();
        assert_eq!(store.get_current_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_brain_entry_for_missing_agent() {
        let (store, _tmp) = create_test_store();
        let err = store
            .create_brain_entry("ghost", NewBrainEntry::new(BrainEntryType::Note, "Hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AgentNotFound(_)));
    }

    #[tokio::test]
    async fn test_brain_entry_lifecycle() {
        let (store, _tmp) = create_test_store();
        store.create(input_with_id("sage")).await.unwrap();

        let entry = store
            .create_brain_entry(
                "sage",
                NewBrainEntry::new(BrainEntryType::Note, "Hello").with_tags(vec![
                    "  refactor ".to_string(),
                    String::new(),
                    "onboarding".to_string(),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(
            entry.tags,
            Some(vec!["refactor".to_string(), "onboarding".to_string()])
        );

        let updated = store
            .update_brain_entry(
                "sage",
                &entry.id,
                BrainEntryPatch {
                    content: Some("Hello again".to_string()),
                    tags: Some(vec![" ".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, entry.id);
        assert_eq!(updated.agent_id, entry.agent_id);
        assert_eq!(updated.timestamp, entry.timestamp);
        assert_eq!(updated.content, "Hello again");
        assert!(updated.tags.is_none());

        let toggled = store
            .toggle_brain_entry_pin("sage", &entry.id)
            .await
            .unwrap()
            .unwrap();
        assert!(toggled.pinned);

        assert!(store.delete_brain_entry("sage", &entry.id).await.unwrap());
        assert!(!store.delete_brain_entry("sage", &entry.id).await.unwrap());
        assert!(store.get_brain_entries("sage").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_entry() {
        let (store, _tmp) = create_test_store();
        store.create(input_with_id("sage")).await.unwrap();

        let result = store
            .update_brain_entry("sage", "missing", BrainEntryPatch::pin(true))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(
            store
                .toggle_brain_entry_pin("ghost", "missing")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_query_brain_entries_keeps_insertion_order() {
        let (store, _tmp) = create_test_store();
        store.create(input_with_id("sage")).await.unwrap();
        for (kind, content) in [
            (BrainEntryType::Decision, "first"),
            (BrainEntryType::Note, "second"),
            (BrainEntryType::Note, "third"),
        ] {
            store
                .create_brain_entry("sage", NewBrainEntry::new(kind, content))
                .await
                .unwrap();
        }

        let filter = BrainEntryFilter::default().with_type(BrainEntryType::Note);
        let notes = store.query_brain_entries("sage", &filter).await.unwrap();
        let contents: Vec<&str> = notes.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "third"]);

        let missing = store.query_brain_entries("ghost", &filter).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let (store, tmp) = create_test_store();
        store.create(input_with_id("sage")).await.unwrap();
        store.set_current_id(Some("sage".to_string())).await.unwrap();

        let reopened = JsonFileStore::new(tmp.path().join("zoo").join("agents.json"));
        assert_eq!(reopened.get_all().await.unwrap().len(), 1);
        assert_eq!(reopened.get_current_id().await.unwrap().as_deref(), Some("sage"));
    }

    #[tokio::test]
    async fn test_legacy_file_is_migrated_and_written_back() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("agents.json");
        let legacy = json!({
            "agents": [{
                "id": "scout",
                "name": "Scout",
                "personality": "Curious.",
                "skills": { "web-search": true },
                "contextRefs": []
            }],
            "currentAgentId": "scout"
        });
        std::fs::write(&path, serde_json::to_string_pretty(&legacy).unwrap()).unwrap();

        let store = JsonFileStore::new(&path);
        let agent = store.get_by_id("scout").await.unwrap().unwrap();
        assert_eq!(agent.system_prompt, "Curious.");
        assert_eq!(agent.skills[0].name, "Web Search");
        assert!(agent.skills[0].enabled);

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written["agents"][0]["skills"].is_array());
        assert!(written["agents"][0]["brainEntries"].is_array());

        let mut reread = written.clone();
        assert!(!migrate_store(&mut reread));
        assert_eq!(reread, written);
    }

    #[tokio::test]
    async fn test_current_shape_is_not_rewritten_on_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("agents.json");
        let raw = r#"{"agents":[{"id":"a","name":"A","skillCategories":[],"skills":[],"brainEntries":[]}],"currentAgentId":null}"#;
        std::fs::write(&path, raw).unwrap();

        let store = JsonFileStore::new(&path);
        let agent = store.get_by_id("a").await.unwrap().unwrap();
        assert!(agent.context_refs.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), raw);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("agents.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get_all().await.unwrap_err(),
            StoreError::Json(_)
        ));
    }
}
