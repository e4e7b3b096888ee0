//! Register process and descriptor schema definitions found on disk
//!
//! Each definition goes through the same steps: normalize legacy shapes, validate against the
//! JSON schema, deserialise into a typed definition, then upsert by (slug, version). Problems
//! with a single definition are logged and the batch moves on.

use std::path::PathBuf;

use anyhow::Context;
use log::{error, info, warn};
use rusqlite::Connection;
use serde_json::Value;
use thiserror::Error;

use crate::db::upsert::{upsert, Registrable, UpsertOutcome};
use crate::db::user::{get_admin, User};
use crate::definition::model::{DescriptorDefinition, ProcessDefinition};
use crate::definition::normalize::{normalize_descriptor, normalize_process};
use crate::definition::read::find_schemas;
use crate::definition::schema::DefinitionSchemas;
use crate::definition::DefinitionKind;
use crate::engine::EngineManager;
use crate::finder::get_finders;
use crate::settings::Settings;
use crate::version::Version;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Admin does not exist: create a superuser")]
    NoAdmin,
}

/// Options of a single `register` run
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// Only register definitions with these slugs or names
    pub schemas: Option<Vec<String>>,
    /// Overwrite definitions whose exact version is already registered
    pub force: bool,
    /// Search these paths instead of asking the finders
    pub paths: Vec<PathBuf>,
}

/// What happened to each definition, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterSummary {
    /// "Inserted <slug>" / "Updated <slug>" lines for processes
    pub processes: Vec<String>,
    pub descriptors: Vec<String>,
    pub skipped: usize,
}

impl RegisterSummary {
    /// Operator report, one section per kind that changed
    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        if !self.processes.is_empty() {
            lines.push("Processor Updates:".to_string());
            lines.extend(self.processes.iter().map(|log| format!("  {log}")));
        }
        if !self.descriptors.is_empty() {
            lines.push("Descriptor schemas Updates:".to_string());
            lines.extend(self.descriptors.iter().map(|log| format!("  {log}")));
        }
        lines.join("\n")
    }
}

pub struct Registrar<'a> {
    conn: &'a Connection,
    schemas: DefinitionSchemas,
    engines: EngineManager,
    contributor: User,
    force: bool,
}

impl<'a> Registrar<'a> {
    pub fn new(conn: &'a Connection, settings: &Settings, contributor: User, force: bool) -> anyhow::Result<Registrar<'a>> {
        Ok(Registrar {
            conn,
            schemas: DefinitionSchemas::load()?,
            engines: EngineManager::new(&settings.execution_engines)?,
            contributor,
            force,
        })
    }

    pub fn register_processes(&self, definitions: Vec<Value>, summary: &mut RegisterSummary) -> anyhow::Result<()> {
        for mut definition in definitions {
            normalize_process(&mut definition);
            if self.schemas.validate(DefinitionKind::Process, &definition).is_err() {
                summary.skipped += 1;
                continue;
            }

            let mut process: ProcessDefinition = match serde_json::from_value(definition) {
                Ok(process) => process,
                Err(err) => {
                    error!("Skip processor: can't read definition: {err}");
                    summary.skipped += 1;
                    continue;
                }
            };

            if let Err(err) = self.engines.augment_output_schema(&mut process) {
                error!("Skip processor {}: {}", process.slug, err);
                summary.skipped += 1;
                continue;
            }

            match self.upsert(&process, &process.version, "processor")? {
                Some(line) => summary.processes.push(line),
                None => summary.skipped += 1,
            }
        }
        Ok(())
    }

    pub fn register_descriptors(&self, definitions: Vec<Value>, summary: &mut RegisterSummary) -> anyhow::Result<()> {
        for mut definition in definitions {
            normalize_descriptor(&mut definition);
            if self.schemas.validate(DefinitionKind::Descriptor, &definition).is_err() {
                summary.skipped += 1;
                continue;
            }

            let descriptor: DescriptorDefinition = match serde_json::from_value(definition) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    error!("Skip descriptor schema: can't read definition: {err}");
                    summary.skipped += 1;
                    continue;
                }
            };

            match self.upsert(&descriptor, &descriptor.version, "descriptor schema")? {
                Some(line) => summary.descriptors.push(line),
                None => summary.skipped += 1,
            }
        }
        Ok(())
    }

    /// Store a definition, returning the summary line if anything was written
    fn upsert<R: Registrable>(&self, definition: &R, version: &str, label: &str) -> anyhow::Result<Option<String>> {
        let slug = definition.slug();
        let version: Version = match version.parse() {
            Ok(version) => version,
            Err(err) => {
                error!("Skip {label} {slug}: {err}");
                return Ok(None);
            }
        };

        let outcome = upsert(self.conn, definition, version, self.contributor.id, self.force)
            .with_context(|| format!("Failed to register {label} {slug} {version}"))?;

        let line = match outcome {
            UpsertOutcome::Inserted(_) => format!("Inserted {slug}"),
            UpsertOutcome::Updated(_) => format!("Updated {slug}"),
            UpsertOutcome::SameVersionInstalled => {
                info!("Skip {label} {slug}: same version installed");
                return Ok(None);
            }
            UpsertOutcome::NewerVersionInstalled => {
                warn!("Skip {label} {slug}: newer version installed");
                return Ok(None);
            }
        };
        info!("{line} ({label} version {version})");
        Ok(Some(line))
    }
}

/// Find and register all processes, then all descriptor schemas
///
/// Fails with [`RegisterError::NoAdmin`] if there is no superuser to own the new objects.
pub fn register(conn: &Connection, settings: &Settings, options: &RegisterOptions) -> anyhow::Result<RegisterSummary> {
    let admin = get_admin(conn)?.ok_or(RegisterError::NoAdmin)?;
    info!("Registering as {}", admin.username);

    let mut processes_paths = options.paths.clone();
    let mut descriptors_paths = options.paths.clone();
    if options.paths.is_empty() {
        for finder in get_finders(settings) {
            processes_paths.extend(finder.find_processes());
            descriptors_paths.extend(finder.find_descriptors());
        }
    }

    let filters = options.schemas.as_deref();
    let registrar = Registrar::new(conn, settings, admin, options.force)?;
    let mut summary = RegisterSummary::default();

    let mut process_schemas = Vec::new();
    for path in &processes_paths {
        process_schemas.extend(find_schemas(path, filters, DefinitionKind::Process));
    }
    info!("Registering {} process definitions", process_schemas.len());
    registrar.register_processes(process_schemas, &mut summary)?;

    let mut descriptor_schemas = Vec::new();
    for path in &descriptors_paths {
        descriptor_schemas.extend(find_schemas(path, filters, DefinitionKind::Descriptor));
    }
    info!("Registering {} descriptor definitions", descriptor_schemas.len());
    registrar.register_descriptors(descriptor_schemas, &mut summary)?;

    Ok(summary)
}
