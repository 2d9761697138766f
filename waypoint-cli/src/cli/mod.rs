//! CLI command handling

pub mod handlers;
pub mod instance;
pub mod instance_handlers;
pub mod workflow;
pub mod workflow_handlers;
