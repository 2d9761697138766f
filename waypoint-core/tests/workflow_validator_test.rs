//! Unit tests for workflow validator
//! Tests each structural rule and the order in which they are checked

use waypoint_core::models::workflow::{CreateWorkflowRequest, State, WorkflowAction};
use waypoint_core::workflow::{ValidationError, WorkflowValidator};

/// Helper to create the draft/review/published request
fn publishing_request() -> CreateWorkflowRequest {
    CreateWorkflowRequest {
        name: "publishing".to_string(),
        description: Some("Article publishing".to_string()),
        states: vec![
            State::new("draft", "Draft").initial(),
            State::new("review", "In Review"),
            State::new("published", "Published").terminal(),
        ],
        actions: vec![
            WorkflowAction::new("submit", "Submit", ["draft"], "review"),
            WorkflowAction::new("approve", "Approve", ["review"], "published"),
            WorkflowAction::new("reject", "Reject", ["review"], "draft"),
        ],
    }
}

#[test]
fn test_validate_publishing_workflow() {
    assert_eq!(WorkflowValidator::validate(&publishing_request()), Ok(()));
}

#[test]
fn test_workflow_without_actions_is_valid() {
    let mut request = publishing_request();
    request.actions.clear();
    assert_eq!(WorkflowValidator::validate(&request), Ok(()));
}

#[test]
fn test_state_may_be_initial_and_final() {
    let request = CreateWorkflowRequest {
        name: "single".to_string(),
        states: vec![State::new("only", "Only").initial().terminal()],
        ..CreateWorkflowRequest::default()
    };
    assert_eq!(WorkflowValidator::validate(&request), Ok(()));
}

#[test]
fn test_blank_name_rejected() {
    for name in ["", "   ", "\t\n"] {
        let mut request = publishing_request();
        request.name = name.to_string();
        assert_eq!(
            WorkflowValidator::validate(&request),
            Err(ValidationError::MissingName)
        );
    }
}

#[test]
fn test_no_states_rejected() {
    let mut request = publishing_request();
    request.states.clear();
    request.actions.clear();
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::NoStates)
    );
}

#[test]
fn test_duplicate_state_id_rejected() {
    let mut request = publishing_request();
    request.states.push(State::new("review", "Second review"));
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::DuplicateStateId("review".to_string()))
    );
}

#[test]
fn test_duplicate_action_id_rejected() {
    let mut request = publishing_request();
    request
        .actions
        .push(WorkflowAction::new("submit", "Resubmit", ["review"], "review"));
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::DuplicateActionId("submit".to_string()))
    );
}

#[test]
fn test_duplicate_states_reported_before_duplicate_actions() {
    let mut request = publishing_request();
    request.states.push(State::new("draft", "Copy"));
    request
        .actions
        .push(WorkflowAction::new("submit", "Copy", ["draft"], "review"));
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::DuplicateStateId("draft".to_string()))
    );
}

#[test]
fn test_missing_initial_state_rejected() {
    let mut request = publishing_request();
    request.states[0].is_initial = false;
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::InitialStateCount(0))
    );
}

#[test]
fn test_multiple_initial_states_rejected() {
    let mut request = publishing_request();
    request.states[1].is_initial = true;
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::InitialStateCount(2))
    );
}

#[test]
fn test_blank_target_state_rejected() {
    let mut request = publishing_request();
    request.actions[1].to_state = " ".to_string();
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::MissingTargetState("approve".to_string()))
    );
}

#[test]
fn test_unknown_target_state_rejected() {
    let mut request = publishing_request();
    request.actions[2].to_state = "archived".to_string();
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::UnknownTargetState {
            action_id: "reject".to_string(),
            state_id: "archived".to_string(),
        })
    );
}

#[test]
fn test_empty_source_states_rejected() {
    let mut request = publishing_request();
    request.actions[0].from_states.clear();
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::MissingSourceStates("submit".to_string()))
    );
}

#[test]
fn test_unknown_source_state_rejected() {
    let mut request = publishing_request();
    request.actions[1].from_states = vec!["review".to_string(), "limbo".to_string()];
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::UnknownSourceState {
            action_id: "approve".to_string(),
            state_id: "limbo".to_string(),
        })
    );
}

#[test]
fn test_target_checked_before_sources_within_action() {
    let mut request = publishing_request();
    request.actions[0].from_states.clear();
    request.actions[0].to_state = "nowhere".to_string();
    assert_eq!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::UnknownTargetState {
            action_id: "submit".to_string(),
            state_id: "nowhere".to_string(),
        })
    );
}

#[test]
fn test_disabled_actions_are_still_validated() {
    let mut request = publishing_request();
    request.actions.push(
        WorkflowAction::new("retire", "Retire", ["published"], "gone").disabled(),
    );
    assert!(matches!(
        WorkflowValidator::validate(&request),
        Err(ValidationError::UnknownTargetState { .. })
    ));
}
