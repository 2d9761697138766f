//! Data models for waypoint

pub mod configuration;
pub mod workflow;

pub use configuration::*;
pub use workflow::*;
