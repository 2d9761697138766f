//! Workflow definitions, transitions and storage

pub mod engine;
pub mod error;
pub mod locks;
pub mod orchestrator;
pub mod persistence;
pub mod validator;

pub use engine::*;
pub use error::*;
pub use locks::*;
pub use orchestrator::*;
pub use persistence::*;
pub use validator::*;
