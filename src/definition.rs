//! Process and descriptor schema definitions, from YAML on disk to validated typed structs

use std::fmt;

/// Discover definitions in YAML files
pub mod read;
/// Legacy shape fixes applied before validation
pub mod normalize;
/// Validate untyped definitions against the embedded JSON schemas
pub mod schema;
/// Valid definitions are deserialised into the structs defined here
pub mod model;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DefinitionKind {
    Process,
    Descriptor,
}

impl DefinitionKind {
    /// Top level key that a definition of this kind must have to be picked up
    pub fn marker_key(&self) -> &'static str {
        match self {
            DefinitionKind::Process => "run",
            DefinitionKind::Descriptor => "schema",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DefinitionKind::Process => write!(f, "process"),
            DefinitionKind::Descriptor => write!(f, "descriptor"),
        }
    }
}
