//! Register declarative process and descriptor schema definitions into a permissioned store
//!
//! Definitions are YAML files found by [`finder`]s. Registration never downgrades: each slug
//! only moves forward in version, and new versions inherit the previous version's permissions.

/// Persistence and scheduling class tags of a process
pub mod class;
pub mod db;
pub mod definition;
pub mod engine;
pub mod finder;
pub mod register;
pub mod settings;
pub mod version;
