//! Workflow definition validation logic

use crate::models::workflow::{CreateWorkflowRequest, WorkflowDefinition};
use crate::workflow::error::ValidationError;
use std::collections::HashSet;

/// Workflow validator
///
/// Pure structural checks. The first failing check is reported; identifiers
/// and timestamps are assigned elsewhere.
pub struct WorkflowValidator;

impl WorkflowValidator {
    /// Validate a submitted workflow definition
    pub fn validate(request: &CreateWorkflowRequest) -> Result<(), ValidationError> {
        if request.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }

        if request.states.is_empty() {
            return Err(ValidationError::NoStates);
        }

        let mut state_ids = HashSet::with_capacity(request.states.len());
        for state in &request.states {
            if !state_ids.insert(state.id.as_str()) {
                return Err(ValidationError::DuplicateStateId(state.id.clone()));
            }
        }

        let mut action_ids = HashSet::with_capacity(request.actions.len());
        for action in &request.actions {
            if !action_ids.insert(action.id.as_str()) {
                return Err(ValidationError::DuplicateActionId(action.id.clone()));
            }
        }

        let initial_count = request.states.iter().filter(|s| s.is_initial).count();
        if initial_count != 1 {
            return Err(ValidationError::InitialStateCount(initial_count));
        }

        // Action references, in submission order
        for action in &request.actions {
            if action.to_state.trim().is_empty() {
                return Err(ValidationError::MissingTargetState(action.id.clone()));
            }

            if !state_ids.contains(action.to_state.as_str()) {
                return Err(ValidationError::UnknownTargetState {
                    action_id: action.id.clone(),
                    state_id: action.to_state.clone(),
                });
            }

            if action.from_states.is_empty() {
                return Err(ValidationError::MissingSourceStates(action.id.clone()));
            }

            if let Some(unknown) = action
                .from_states
                .iter()
                .find(|from| !state_ids.contains(from.as_str()))
            {
                return Err(ValidationError::UnknownSourceState {
                    action_id: action.id.clone(),
                    state_id: unknown.clone(),
                });
            }
        }

        Ok(())
    }

    /// Re-check a stored definition
    pub fn validate_definition(definition: &WorkflowDefinition) -> Result<(), ValidationError> {
        Self::validate(&definition.as_request())
    }
}
