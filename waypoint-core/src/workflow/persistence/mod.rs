//! Workflow storage port and its backends

mod file;
mod memory;

pub use file::FileWorkflowStore;
pub use memory::InMemoryWorkflowStore;

use crate::models::workflow::{WorkflowDefinition, WorkflowInstance};
use crate::workflow::error::PersistError;
use crate::workflow::locks::InstanceGuard;
use async_trait::async_trait;

/// Storage of definitions and instances, keyed by identifier
///
/// Saves are upserts. Lookups return `None` for unknown identifiers.
/// Deletes report whether a record was removed; deleting an unknown
/// identifier is not an error.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn save_definition(&self, definition: &WorkflowDefinition) -> Result<(), PersistError>;

    async fn load_definition(&self, id: &str) -> Result<Option<WorkflowDefinition>, PersistError>;

    async fn load_all_definitions(&self) -> Result<Vec<WorkflowDefinition>, PersistError>;

    async fn delete_definition(&self, id: &str) -> Result<bool, PersistError>;

    async fn save_instance(&self, instance: &WorkflowInstance) -> Result<(), PersistError>;

    async fn load_instance(&self, id: &str) -> Result<Option<WorkflowInstance>, PersistError>;

    async fn load_all_instances(&self) -> Result<Vec<WorkflowInstance>, PersistError>;

    async fn delete_instance(&self, id: &str) -> Result<bool, PersistError>;

    /// Wait for exclusive access to one instance
    ///
    /// Every handle on the same underlying storage honours the guard, so a
    /// load/transition/save cycle run under it cannot lose updates.
    async fn lock_instance(&self, id: &str) -> Result<InstanceGuard<'_>, PersistError>;
}
