//! Infrastructure layer - Adapters for the outside world
//!
//! This layer contains:
//! - Configuration loading
//! - Persistence adapters (SQLite, in-memory)
//! - The JSON catalog source
//! - The lifecycle event bus
//! - HTTP REST routes and shared state

pub mod catalog_loader;
pub mod config;
pub mod event_bus;
pub mod http;
pub mod persistence;
pub mod state;
