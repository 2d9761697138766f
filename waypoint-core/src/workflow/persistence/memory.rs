//! In-memory workflow store

use super::WorkflowStore;
use crate::models::workflow::{WorkflowDefinition, WorkflowInstance};
use crate::workflow::error::PersistError;
use crate::workflow::locks::{InstanceGuard, KeyedLocks};
use async_trait::async_trait;
use dashmap::DashMap;

/// Map-backed store without durability
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    definitions: DashMap<String, WorkflowDefinition>,
    instances: DashMap<String, WorkflowInstance>,
    instance_locks: KeyedLocks,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn save_definition(&self, definition: &WorkflowDefinition) -> Result<(), PersistError> {
        self.definitions
            .insert(definition.id.clone(), definition.clone());
        Ok(())
    }

    async fn load_definition(&self, id: &str) -> Result<Option<WorkflowDefinition>, PersistError> {
        Ok(self.definitions.get(id).map(|entry| entry.clone()))
    }

    async fn load_all_definitions(&self) -> Result<Vec<WorkflowDefinition>, PersistError> {
        let mut definitions: Vec<_> = self
            .definitions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        definitions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(definitions)
    }

    async fn delete_definition(&self, id: &str) -> Result<bool, PersistError> {
        Ok(self.definitions.remove(id).is_some())
    }

    async fn save_instance(&self, instance: &WorkflowInstance) -> Result<(), PersistError> {
        self.instances.insert(instance.id.clone(), instance.clone());
        Ok(())
    }

    async fn load_instance(&self, id: &str) -> Result<Option<WorkflowInstance>, PersistError> {
        Ok(self.instances.get(id).map(|entry| entry.clone()))
    }

    async fn load_all_instances(&self) -> Result<Vec<WorkflowInstance>, PersistError> {
        let mut instances: Vec<_> = self
            .instances
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        instances.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(instances)
    }

    async fn delete_instance(&self, id: &str) -> Result<bool, PersistError> {
        Ok(self.instances.remove(id).is_some())
    }

    async fn lock_instance(&self, id: &str) -> Result<InstanceGuard<'_>, PersistError> {
        Ok(InstanceGuard::new(self.instance_locks.lock(id).await))
    }
}
