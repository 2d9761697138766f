//! Supporting services

pub mod logging;

pub use logging::*;
