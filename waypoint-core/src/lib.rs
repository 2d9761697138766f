//! # Waypoint Core Library
//!
//! Finite-state workflow definitions, the transition engine that advances
//! instances one action at a time, pluggable storage and the HTTP API.

pub mod models;
pub mod server;
pub mod services;
pub mod workflow;
