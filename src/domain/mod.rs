//! Domain layer - Core business logic with no I/O
//!
//! This layer contains:
//! - Value Objects: emotions, growth stages, personalities, partition keys
//! - Entities: creature definitions and per-partition creature state
//! - Aggregates: the immutable creature catalog snapshot
//! - Domain Events: lifecycle notifications
//! - Domain Services: the evolution engine

pub mod aggregates;
pub mod entities;
pub mod events;
pub mod services;
pub mod value_objects;
