//! Execution engines known at registration time
//!
//! Registration doesn't run anything. It only needs to know whether a process's language is
//! supported, and which output fields the engine adds to every process it runs.

use log::debug;
use serde_json::{json, Value};
use thiserror::Error;

use crate::definition::model::ProcessDefinition;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("execution engine '{0}' not supported")]
    InvalidEngine(String),
}

pub trait ExecutionEngine {
    /// Language name used in a process `run` block
    fn name(&self) -> &'static str;

    /// Output fields added to every process run by this engine
    fn get_output_schema(&self, _process: &ProcessDefinition) -> Vec<Value> {
        Vec::new()
    }
}

pub struct BashEngine;

impl ExecutionEngine for BashEngine {
    fn name(&self) -> &'static str {
        "bash"
    }
}

pub struct PythonEngine;

impl ExecutionEngine for PythonEngine {
    fn name(&self) -> &'static str {
        "python"
    }
}

/// Workflows spawn one data object per step and output their ids
pub struct WorkflowEngine;

impl ExecutionEngine for WorkflowEngine {
    fn name(&self) -> &'static str {
        "workflow"
    }

    fn get_output_schema(&self, _process: &ProcessDefinition) -> Vec<Value> {
        vec![json!({"name": "steps", "label": "Steps", "type": "list:data:"})]
    }
}

fn available_engines() -> Vec<Box<dyn ExecutionEngine>> {
    vec![Box::new(BashEngine), Box::new(WorkflowEngine), Box::new(PythonEngine)]
}

/// The execution engines enabled in the settings
pub struct EngineManager {
    engines: Vec<Box<dyn ExecutionEngine>>,
}

impl EngineManager {
    /// Enable the named engines. Names that don't match an available engine fail.
    pub fn new(enabled: &[String]) -> Result<EngineManager, EngineError> {
        let mut available = available_engines();
        let mut engines = Vec::new();
        for name in enabled {
            let position = available
                .iter()
                .position(|engine| engine.name() == name)
                .ok_or_else(|| EngineError::InvalidEngine(name.clone()))?;
            engines.push(available.swap_remove(position));
        }
        debug!("Enabled execution engines: {}", enabled.join(", "));
        Ok(EngineManager { engines })
    }

    pub fn get_execution_engine(&self, language: &str) -> Result<&dyn ExecutionEngine, EngineError> {
        self.engines
            .iter()
            .find(|engine| engine.name() == language)
            .map(|engine| &**engine)
            .ok_or_else(|| EngineError::InvalidEngine(language.to_string()))
    }

    /// Append the engine's extra output fields to the process
    pub fn augment_output_schema(&self, process: &mut ProcessDefinition) -> Result<(), EngineError> {
        let engine = self.get_execution_engine(&process.run.language)?;
        let extra = engine.get_output_schema(process);
        process.output_schema.extend(extra);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn process(language: &str) -> ProcessDefinition {
        serde_json::from_value(json!({
            "slug": "pipeline",
            "name": "Pipeline",
            "version": "1.0.0",
            "type": "data:workflow:",
            "output": [{"name": "report", "type": "basic:file:"}],
            "run": {"language": language, "program": []}
        }))
        .unwrap()
    }

    fn enabled(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn workflow_engine_adds_steps_output() {
        let manager = EngineManager::new(&enabled(&["bash", "workflow"])).unwrap();
        let mut workflow = process("workflow");
        manager.augment_output_schema(&mut workflow).unwrap();

        assert_eq!(workflow.output_schema.len(), 2);
        assert_eq!(workflow.output_schema[1]["name"], "steps");
        assert_eq!(workflow.output_schema[1]["type"], "list:data:");

        let mut bash = process("bash");
        manager.augment_output_schema(&mut bash).unwrap();
        assert_eq!(bash.output_schema.len(), 1);
    }

    #[test]
    fn disabled_or_unknown_languages_are_rejected() {
        let manager = EngineManager::new(&enabled(&["bash"])).unwrap();
        assert_eq!(
            manager.augment_output_schema(&mut process("python")),
            Err(EngineError::InvalidEngine("python".to_string()))
        );
        assert!(manager.get_execution_engine("cobol").is_err());
        assert!(EngineManager::new(&enabled(&["cobol"])).is_err());
    }
}
