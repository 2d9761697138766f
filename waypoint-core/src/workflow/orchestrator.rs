//! Workflow orchestration over a storage backend

use crate::models::workflow::{CreateWorkflowRequest, WorkflowDefinition, WorkflowInstance};
use crate::workflow::engine::TransitionEngine;
use crate::workflow::error::{DomainError, WorkflowError};
use crate::workflow::persistence::WorkflowStore;
use crate::workflow::validator::WorkflowValidator;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Result type for orchestrator operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Workflow orchestrator
///
/// Ties the validator and transition engine to a [`WorkflowStore`] and owns
/// identifier and timestamp assignment.
#[derive(Clone)]
pub struct WorkflowOrchestrator {
    /// Persistence layer
    store: Arc<dyn WorkflowStore>,
}

impl WorkflowOrchestrator {
    /// Create new workflow orchestrator
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a new workflow definition
    pub async fn create_definition(
        &self,
        request: CreateWorkflowRequest,
    ) -> WorkflowResult<WorkflowDefinition> {
        if let Err(e) = WorkflowValidator::validate(&request) {
            tracing::warn!(name = %request.name, error = %e, "Rejected workflow definition");
            return Err(e.into());
        }

        let definition =
            WorkflowDefinition::from_request(Uuid::new_v4().to_string(), request, Utc::now());
        self.store.save_definition(&definition).await?;

        tracing::info!(
            definition_id = %definition.id,
            name = %definition.name,
            states = definition.states.len(),
            actions = definition.actions.len(),
            "Created workflow definition"
        );
        Ok(definition)
    }

    /// Get workflow definition
    pub async fn get_definition(&self, id: &str) -> WorkflowResult<Option<WorkflowDefinition>> {
        Ok(self.store.load_definition(id).await?)
    }

    /// List all workflow definitions
    pub async fn list_definitions(&self) -> WorkflowResult<Vec<WorkflowDefinition>> {
        Ok(self.store.load_all_definitions().await?)
    }

    /// Delete a definition; instances that reference it are left as they are
    pub async fn delete_definition(&self, id: &str) -> WorkflowResult<bool> {
        let removed = self.store.delete_definition(id).await?;
        if removed {
            tracing::info!(definition_id = %id, "Deleted workflow definition");
        }
        Ok(removed)
    }

    /// Start a new instance at the definition's initial state
    pub async fn start_instance(&self, definition_id: &str) -> WorkflowResult<WorkflowInstance> {
        let definition = self
            .store
            .load_definition(definition_id)
            .await?
            .ok_or_else(|| DomainError::DefinitionNotFound(definition_id.to_string()))?;

        let initial_state = definition
            .initial_state()
            .ok_or_else(|| DomainError::NoInitialState(definition_id.to_string()))?;

        let instance = WorkflowInstance::new(
            Uuid::new_v4().to_string(),
            definition.id.clone(),
            initial_state.id.clone(),
            Utc::now(),
        );
        self.store.save_instance(&instance).await?;

        tracing::info!(
            instance_id = %instance.id,
            definition_id = %definition.id,
            state = %instance.current_state_id,
            "Started workflow instance"
        );
        Ok(instance)
    }

    /// Get workflow instance
    pub async fn get_instance(&self, id: &str) -> WorkflowResult<Option<WorkflowInstance>> {
        Ok(self.store.load_instance(id).await?)
    }

    /// List all workflow instances
    pub async fn list_instances(&self) -> WorkflowResult<Vec<WorkflowInstance>> {
        Ok(self.store.load_all_instances().await?)
    }

    /// Delete an instance and its history
    pub async fn delete_instance(&self, id: &str) -> WorkflowResult<bool> {
        let _guard = self.store.lock_instance(id).await?;

        let removed = self.store.delete_instance(id).await?;
        if removed {
            tracing::info!(instance_id = %id, "Deleted workflow instance");
        }
        Ok(removed)
    }

    /// Execute one action on an instance
    ///
    /// Load, transition and save happen under the instance's lock, so
    /// concurrent calls on the same instance apply one after the other, even
    /// when they come through different handles on the same storage.
    pub async fn execute_action(
        &self,
        instance_id: &str,
        action_id: &str,
    ) -> WorkflowResult<WorkflowInstance> {
        let _guard = self.store.lock_instance(instance_id).await?;

        let instance = self
            .store
            .load_instance(instance_id)
            .await?
            .ok_or_else(|| DomainError::InstanceNotFound(instance_id.to_string()))?;

        let definition = self
            .store
            .load_definition(&instance.definition_id)
            .await?
            .ok_or_else(|| DomainError::DefinitionNotFound(instance.definition_id.clone()))?;

        let updated = match TransitionEngine::apply_action(
            &definition,
            &instance,
            action_id,
            Utc::now(),
        ) {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(
                    instance_id = %instance_id,
                    action_id = %action_id,
                    error = %e,
                    "Rejected workflow action"
                );
                return Err(e.into());
            }
        };

        self.store.save_instance(&updated).await?;

        tracing::info!(
            instance_id = %updated.id,
            action_id = %action_id,
            from = %instance.current_state_id,
            to = %updated.current_state_id,
            "Executed workflow action"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::{State, WorkflowAction};
    use crate::workflow::error::ValidationError;
    use crate::workflow::persistence::InMemoryWorkflowStore;

    fn orchestrator() -> WorkflowOrchestrator {
        WorkflowOrchestrator::new(Arc::new(InMemoryWorkflowStore::new()))
    }

    fn request() -> CreateWorkflowRequest {
        CreateWorkflowRequest {
            name: "ticket".to_string(),
            description: Some("Support ticket".to_string()),
            states: vec![
                State::new("open", "Open").initial(),
                State::new("closed", "Closed").terminal(),
            ],
            actions: vec![WorkflowAction::new("close", "Close", ["open"], "closed")],
        }
    }

    #[tokio::test]
    async fn test_validation_error_surfaces_unchanged() {
        let orchestrator = orchestrator();
        let mut bad = request();
        bad.states.clear();

        let err = orchestrator.create_definition(bad).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Validation(ValidationError::NoStates)
        ));
        assert!(orchestrator.list_definitions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_unknown_definition() {
        let err = orchestrator().start_instance("missing").await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Domain(DomainError::DefinitionNotFound(ref id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_start_without_initial_state() {
        // Only reachable when stored data was edited behind the validator
        let store = Arc::new(InMemoryWorkflowStore::new());
        let mut definition =
            WorkflowDefinition::from_request("d".to_string(), request(), Utc::now());
        definition.states[0].is_initial = false;
        store.save_definition(&definition).await.unwrap();

        let err = WorkflowOrchestrator::new(store)
            .start_instance("d")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Domain(DomainError::NoInitialState(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let orchestrator = orchestrator();
        let definition = orchestrator.create_definition(request()).await.unwrap();
        let instance = orchestrator.start_instance(&definition.id).await.unwrap();

        assert!(orchestrator.delete_instance(&instance.id).await.unwrap());
        assert!(!orchestrator.delete_instance(&instance.id).await.unwrap());
        assert!(orchestrator.delete_definition(&definition.id).await.unwrap());
        assert!(!orchestrator.delete_definition(&definition.id).await.unwrap());
    }
}
