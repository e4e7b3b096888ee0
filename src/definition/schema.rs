use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use jsonschema::{Draft, JSONSchema, SchemaResolver, SchemaResolverError};
use log::{debug, error};
use serde_json::Value;
use url::Url;

use crate::definition::DefinitionKind;

static PROCESS_SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/process.json"));
static DESCRIPTOR_SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/descriptor.json"));
static FIELD_SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/field.json"));

/// First validation failure of a definition, reported to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// `name` of the definition, empty if it has none
    pub name: String,
    /// JSON pointer to the offending part of the definition
    pub path: String,
    pub message: String,
    /// The schema keyword that failed, e.g. `pattern` or `required`
    pub validator: String,
    pub schema_path: String,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "VALIDATION ERROR: {}", self.name)?;
        writeln!(f, "    path:       {}", self.path)?;
        writeln!(f, "    message:    {}", self.message)?;
        writeln!(f, "    validator:  {}", self.validator)?;
        write!(f, "    schema:     {}", self.schema_path)
    }
}

/// Compiled validation schemas for process and descriptor definitions
pub struct DefinitionSchemas {
    process: JSONSchema,
    descriptor: JSONSchema,
}

impl DefinitionSchemas {
    /// Compile the schemas shipped with the binary
    pub fn load() -> anyhow::Result<DefinitionSchemas> {
        Ok(DefinitionSchemas {
            process: compile_schema(PROCESS_SCHEMA)?,
            descriptor: compile_schema(DESCRIPTOR_SCHEMA)?,
        })
    }

    /// Validate a normalized definition, logging and returning the first error
    pub fn validate(&self, kind: DefinitionKind, definition: &Value) -> Result<(), ValidationReport> {
        debug!("Validating {kind} definition against JSON schema");
        let schema = match kind {
            DefinitionKind::Process => &self.process,
            DefinitionKind::Descriptor => &self.descriptor,
        };

        let result = schema.validate(definition);
        let Err(mut errors) = result else { return Ok(()) };
        let Some(err) = errors.next() else { return Ok(()) };

        let schema_path = err.schema_path.to_string();
        let report = ValidationReport {
            name: definition.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
            path: err.instance_path.to_string(),
            message: err.to_string(),
            validator: schema_path.rsplit('/').next().unwrap_or_default().to_string(),
            schema_path,
        };
        error!("{report}");
        Err(report)
    }
}

fn compile_schema(text: &str) -> anyhow::Result<JSONSchema> {
    let schema: Value = serde_json::from_str(text)?;
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .with_resolver(EmbeddedResolver::new())
        .compile(&schema)
        .map_err(|err| anyhow!("invalid validation schema: {err}"))
}

/// Resolves relative `$ref`s (e.g. `field.json`) to the schema documents embedded in the binary
struct EmbeddedResolver {
    documents: HashMap<&'static str, &'static str>,
}

impl EmbeddedResolver {
    fn new() -> EmbeddedResolver {
        let documents = HashMap::from([
            ("field.json", FIELD_SCHEMA),
            ("process.json", PROCESS_SCHEMA),
            ("descriptor.json", DESCRIPTOR_SCHEMA),
        ]);
        EmbeddedResolver { documents }
    }
}

impl SchemaResolver for EmbeddedResolver {
    fn resolve(&self, _root_schema: &Value, url: &Url, original_reference: &str) -> Result<Arc<Value>, SchemaResolverError> {
        match url.scheme() {
            "json-schema" => {
                let name = url.path().trim_start_matches('/');
                let name = if name.is_empty() { original_reference } else { name };
                let text = self
                    .documents
                    .get(name)
                    .ok_or_else(|| anyhow!("unknown schema document {name}"))?;
                Ok(Arc::new(serde_json::from_str(text)?))
            }
            _ => Err(anyhow!("scheme is not supported")),
        }
    }
}
