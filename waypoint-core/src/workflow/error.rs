//! Error taxonomy for workflow operations

use std::path::PathBuf;
use thiserror::Error;

/// Structural problems in a submitted workflow definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Workflow name is required")]
    MissingName,

    #[error("At least one state is required")]
    NoStates,

    #[error("Duplicate state ID '{0}' found")]
    DuplicateStateId(String),

    #[error("Duplicate action ID '{0}' found")]
    DuplicateActionId(String),

    #[error("Exactly one initial state is required (found {0})")]
    InitialStateCount(usize),

    #[error("Action '{0}' must have a target state")]
    MissingTargetState(String),

    #[error("Action '{action_id}' references unknown target state '{state_id}'")]
    UnknownTargetState { action_id: String, state_id: String },

    #[error("Action '{0}' must have at least one source state")]
    MissingSourceStates(String),

    #[error("Action '{action_id}' references unknown source state '{state_id}'")]
    UnknownSourceState { action_id: String, state_id: String },
}

/// Rejected instance operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Workflow definition '{0}' not found")]
    DefinitionNotFound(String),

    #[error("Workflow instance '{0}' not found")]
    InstanceNotFound(String),

    #[error("Action '{0}' not found in workflow definition")]
    ActionNotFound(String),

    #[error("State '{0}' not found in workflow definition")]
    StateNotFound(String),

    #[error("Cannot execute actions on instances in final state '{0}'")]
    TerminalState(String),

    #[error("Action '{0}' is disabled")]
    ActionDisabled(String),

    #[error("Action '{action_id}' cannot be executed from current state '{state_id}'")]
    InvalidTransition { action_id: String, state_id: String },

    #[error("No initial state found in definition '{0}'")]
    NoInitialState(String),
}

/// Storage backend failures
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize workflow store: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result of every orchestrator operation
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl WorkflowError {
    /// Caused by the caller's input; retrying the same request cannot succeed
    pub fn is_client_error(&self) -> bool {
        matches!(self, WorkflowError::Validation(_) | WorkflowError::Domain(_))
    }

    /// A referenced definition or instance does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WorkflowError::Domain(
                DomainError::DefinitionNotFound(_) | DomainError::InstanceNotFound(_)
            )
        )
    }
}
