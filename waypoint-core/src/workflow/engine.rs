//! State transition engine

use crate::models::workflow::{HistoryEntry, WorkflowAction, WorkflowDefinition, WorkflowInstance};
use crate::workflow::error::DomainError;
use chrono::{DateTime, Utc};

/// Transition engine
///
/// Computes the next instance value for a requested action. The instance
/// passed in is never modified; on success a new value is returned with a
/// freshly built history.
pub struct TransitionEngine;

impl TransitionEngine {
    /// Apply `action_id` to `instance`, stamping the transition with `now`
    pub fn apply_action(
        definition: &WorkflowDefinition,
        instance: &WorkflowInstance,
        action_id: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkflowInstance, DomainError> {
        let action = definition
            .action(action_id)
            .ok_or_else(|| DomainError::ActionNotFound(action_id.to_string()))?;

        let current_state = definition
            .state(&instance.current_state_id)
            .ok_or_else(|| DomainError::StateNotFound(instance.current_state_id.clone()))?;

        if current_state.is_final {
            return Err(DomainError::TerminalState(current_state.id.clone()));
        }

        if !action.enabled {
            return Err(DomainError::ActionDisabled(action.id.clone()));
        }

        if !action.allows_from(&instance.current_state_id) {
            return Err(DomainError::InvalidTransition {
                action_id: action.id.clone(),
                state_id: instance.current_state_id.clone(),
            });
        }

        // Stored data, so the target is re-checked even though validation covered it
        let target_state = definition
            .state(&action.to_state)
            .ok_or_else(|| DomainError::StateNotFound(action.to_state.clone()))?;

        let mut history = Vec::with_capacity(instance.history.len() + 1);
        history.extend(instance.history.iter().cloned());
        history.push(HistoryEntry {
            action_id: action.id.clone(),
            action_name: action.name.clone(),
            from_state_id: instance.current_state_id.clone(),
            to_state_id: target_state.id.clone(),
            executed_at: now,
        });

        Ok(WorkflowInstance {
            id: instance.id.clone(),
            definition_id: instance.definition_id.clone(),
            current_state_id: target_state.id.clone(),
            history,
            created_at: instance.created_at,
            last_updated: now,
        })
    }

    /// Actions that would currently succeed, in definition order
    pub fn available_actions<'a>(
        definition: &'a WorkflowDefinition,
        instance: &WorkflowInstance,
    ) -> Vec<&'a WorkflowAction> {
        if instance.is_complete(definition) {
            return Vec::new();
        }

        definition
            .actions
            .iter()
            .filter(|a| a.enabled && a.allows_from(&instance.current_state_id))
            .filter(|a| definition.state(&a.to_state).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::State;

    fn definition() -> WorkflowDefinition {
        WorkflowDefinition {
            id: "def".to_string(),
            name: "ticket".to_string(),
            description: None,
            states: vec![
                State::new("open", "Open").initial(),
                State::new("closed", "Closed").terminal(),
            ],
            actions: vec![
                WorkflowAction::new("close", "Close", ["open"], "closed"),
                WorkflowAction::new("archive", "Archive", ["open"], "closed").disabled(),
            ],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_leaves_input_untouched() {
        let definition = definition();
        let now = Utc::now();
        let instance =
            WorkflowInstance::new("i".to_string(), "def".to_string(), "open".to_string(), now);
        let before = instance.clone();

        let after = TransitionEngine::apply_action(&definition, &instance, "close", now).unwrap();

        assert_eq!(instance, before);
        assert_eq!(after.current_state_id, "closed");
        assert_eq!(after.history.len(), 1);
        assert_eq!(after.id, instance.id);
        assert_eq!(after.created_at, instance.created_at);
    }

    #[test]
    fn test_same_inputs_same_output() {
        let definition = definition();
        let now = Utc::now();
        let instance =
            WorkflowInstance::new("i".to_string(), "def".to_string(), "open".to_string(), now);

        let a = TransitionEngine::apply_action(&definition, &instance, "close", now).unwrap();
        let b = TransitionEngine::apply_action(&definition, &instance, "close", now).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_available_actions() {
        let definition = definition();
        let now = Utc::now();
        let open =
            WorkflowInstance::new("i".to_string(), "def".to_string(), "open".to_string(), now);

        let ids: Vec<_> = TransitionEngine::available_actions(&definition, &open)
            .into_iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["close"]);

        let closed = TransitionEngine::apply_action(&definition, &open, "close", now).unwrap();
        assert!(TransitionEngine::available_actions(&definition, &closed).is_empty());
    }
}
