use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::class::{Persistence, SchedulingClass};

/// Language used when a process `run` block doesn't name one
pub const DEFAULT_LANGUAGE: &str = "bash";

/// Version assumed for descriptor schemas that don't declare one
pub const DEFAULT_DESCRIPTOR_VERSION: &str = "0.0.0";

/// A validated process definition
///
/// Field lists (`input`, `output`) are kept as untyped JSON: they're stored as they are and
/// their shape has already been checked by the validation schema.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProcessDefinition {
    pub slug: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub process_type: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub persistence: Persistence,
    #[serde(default)]
    pub scheduling_class: SchedulingClass,
    #[serde(default)]
    pub description: String,
    pub data_name: Option<String>,
    pub flow_collection: Option<String>,
    #[serde(default, rename = "input")]
    pub input_schema: Vec<Value>,
    #[serde(default, rename = "output")]
    pub output_schema: Vec<Value>,
    pub run: Run,
    #[serde(default)]
    pub requirements: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Run {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub program: Value,
    /// Anything else in the run block is passed through to the execution layer
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A validated descriptor schema definition
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DescriptorDefinition {
    pub slug: String,
    pub name: String,
    #[serde(default = "default_descriptor_version")]
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub schema: Vec<Value>,
}

fn default_category() -> String {
    "other:".to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_descriptor_version() -> String {
    DEFAULT_DESCRIPTOR_VERSION.to_string()
}
