//! Workflow definition and instance data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// A named point in a workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// State identifier (unique within a definition)
    pub id: String,
    /// Human-readable name
    #[serde(default)]
    pub name: String,
    /// Entry point of the workflow (exactly one per definition)
    #[serde(default)]
    pub is_initial: bool,
    /// Terminal state, no actions are permitted once reached
    #[serde(default)]
    pub is_final: bool,
}

impl State {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_initial: false,
            is_final: false,
        }
    }

    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// A guarded transition from any of `from_states` to `to_state`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowAction {
    /// Action identifier (unique within a definition)
    pub id: String,
    /// Human-readable name, captured into history on execution
    #[serde(default)]
    pub name: String,
    /// Disabled actions are rejected even when the source state matches
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// States this action may be executed from
    #[serde(default)]
    pub from_states: Vec<String>,
    /// State the instance moves to
    #[serde(default)]
    pub to_state: String,
}

impl WorkflowAction {
    pub fn new<I, S>(
        id: impl Into<String>,
        name: impl Into<String>,
        from_states: I,
        to_state: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            enabled: true,
            from_states: from_states.into_iter().map(Into::into).collect(),
            to_state: to_state.into(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether this action may fire from the given state
    pub fn allows_from(&self, state_id: &str) -> bool {
        self.from_states.iter().any(|s| s == state_id)
    }
}

/// Submitted, not yet validated, workflow definition
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub actions: Vec<WorkflowAction>,
}

/// Stored, validated workflow definition. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    /// System-generated identifier
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub actions: Vec<WorkflowAction>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowDefinition {
    /// Build a definition from an already validated request
    pub fn from_request(
        id: String,
        request: CreateWorkflowRequest,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: request.name,
            description: request.description,
            states: request.states,
            actions: request.actions,
            created_at,
        }
    }

    /// First state flagged initial
    pub fn initial_state(&self) -> Option<&State> {
        self.states.iter().find(|s| s.is_initial)
    }

    /// First state with the given id
    pub fn state(&self, id: &str) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }

    /// First action with the given id
    pub fn action(&self, id: &str) -> Option<&WorkflowAction> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// View of the definition as a creation request, for re-validation
    pub fn as_request(&self) -> CreateWorkflowRequest {
        CreateWorkflowRequest {
            name: self.name.clone(),
            description: self.description.clone(),
            states: self.states.clone(),
            actions: self.actions.clone(),
        }
    }
}

/// Record of one executed action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub action_id: String,
    /// Action name at execution time
    pub action_name: String,
    pub from_state_id: String,
    pub to_state_id: String,
    pub executed_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Compare everything except the execution timestamp
    pub fn same_step(&self, other: &HistoryEntry) -> bool {
        self.action_id == other.action_id
            && self.action_name == other.action_name
            && self.from_state_id == other.from_state_id
            && self.to_state_id == other.to_state_id
    }
}

/// Live execution of a workflow definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInstance {
    /// System-generated identifier
    pub id: String,
    /// Weak reference to the definition; it may have been deleted since
    pub definition_id: String,
    pub current_state_id: String,
    /// Append-only, replaced wholesale on each transition
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl WorkflowInstance {
    pub fn new(
        id: String,
        definition_id: String,
        initial_state_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            definition_id,
            current_state_id: initial_state_id,
            history: Vec::new(),
            created_at: now,
            last_updated: now,
        }
    }

    /// Whether the instance sits in a final state of `definition`
    pub fn is_complete(&self, definition: &WorkflowDefinition) -> bool {
        definition
            .state(&self.current_state_id)
            .is_some_and(|s| s.is_final)
    }
}
