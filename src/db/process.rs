use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::Value;

use crate::class::{Persistence, SchedulingClass};
use crate::db::permission::ObjectKind;
use crate::db::upsert::Registrable;
use crate::db::{now, StoreError};
use crate::definition::model::ProcessDefinition;
use crate::version::Version;

/// A registered process as stored in the database
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub id: i64,
    pub slug: String,
    pub version: Version,
    pub name: String,
    pub process_type: String,
    pub category: String,
    pub persistence: Persistence,
    pub scheduling_class: SchedulingClass,
    pub description: String,
    pub data_name: Option<String>,
    pub flow_collection: Option<String>,
    pub input_schema: Value,
    pub output_schema: Value,
    pub run: Value,
    pub requirements: Value,
    pub contributor_id: i64,
    pub created: String,
    pub modified: String,
}

const COLUMNS: &str = "id, slug, version, name, type, category, persistence, scheduling_class, \
    description, data_name, flow_collection, input_schema, output_schema, run, requirements, \
    contributor_id, created, modified";

/// JSON encoded columns of a definition, in table order
struct JsonColumns {
    input_schema: String,
    output_schema: String,
    run: String,
    requirements: String,
}

impl ProcessDefinition {
    fn json_columns(&self) -> Result<JsonColumns, StoreError> {
        Ok(JsonColumns {
            input_schema: serde_json::to_string(&self.input_schema)?,
            output_schema: serde_json::to_string(&self.output_schema)?,
            run: serde_json::to_string(&self.run)?,
            requirements: serde_json::to_string(&self.requirements)?,
        })
    }
}

impl Registrable for ProcessDefinition {
    const KIND: ObjectKind = ObjectKind::Process;

    fn slug(&self) -> &str {
        &self.slug
    }

    fn insert(&self, conn: &Connection, version: Version, contributor_id: i64) -> Result<i64, StoreError> {
        let json = self.json_columns()?;
        let timestamp = now();
        conn.execute(
            "INSERT INTO process (slug, version, name, type, category, persistence, scheduling_class,
                description, data_name, flow_collection, input_schema, output_schema, run, requirements,
                contributor_id, created, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
            rusqlite::params![
                self.slug,
                version.packed(),
                self.name,
                self.process_type,
                self.category,
                self.persistence.code(),
                self.scheduling_class.code(),
                self.description,
                self.data_name,
                self.flow_collection,
                json.input_schema,
                json.output_schema,
                json.run,
                json.requirements,
                contributor_id,
                timestamp,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection, id: i64) -> Result<(), StoreError> {
        let json = self.json_columns()?;
        conn.execute(
            "UPDATE process SET name = ?1, type = ?2, category = ?3, persistence = ?4,
                scheduling_class = ?5, description = ?6, data_name = ?7, flow_collection = ?8,
                input_schema = ?9, output_schema = ?10, run = ?11, requirements = ?12, modified = ?13
             WHERE id = ?14",
            rusqlite::params![
                self.name,
                self.process_type,
                self.category,
                self.persistence.code(),
                self.scheduling_class.code(),
                self.description,
                self.data_name,
                self.flow_collection,
                json.input_schema,
                json.output_schema,
                json.run,
                json.requirements,
                now(),
                id,
            ],
        )?;
        Ok(())
    }
}

/// Raw column values, decoded into a [`ProcessRecord`] outside of the rusqlite row callback
struct ProcessRow {
    id: i64,
    slug: String,
    version: i64,
    name: String,
    process_type: String,
    category: String,
    persistence: String,
    scheduling_class: String,
    description: String,
    data_name: Option<String>,
    flow_collection: Option<String>,
    input_schema: String,
    output_schema: String,
    run: String,
    requirements: String,
    contributor_id: i64,
    created: String,
    modified: String,
}

impl ProcessRow {
    fn from_row(row: &Row) -> rusqlite::Result<ProcessRow> {
        Ok(ProcessRow {
            id: row.get(0)?,
            slug: row.get(1)?,
            version: row.get(2)?,
            name: row.get(3)?,
            process_type: row.get(4)?,
            category: row.get(5)?,
            persistence: row.get(6)?,
            scheduling_class: row.get(7)?,
            description: row.get(8)?,
            data_name: row.get(9)?,
            flow_collection: row.get(10)?,
            input_schema: row.get(11)?,
            output_schema: row.get(12)?,
            run: row.get(13)?,
            requirements: row.get(14)?,
            contributor_id: row.get(15)?,
            created: row.get(16)?,
            modified: row.get(17)?,
        })
    }

    fn decode(self) -> Result<ProcessRecord, StoreError> {
        let persistence = Persistence::from_code(&self.persistence)
            .ok_or_else(|| StoreError::Column { column: "persistence", value: self.persistence.clone() })?;
        let scheduling_class = SchedulingClass::from_code(&self.scheduling_class)
            .ok_or_else(|| StoreError::Column { column: "scheduling_class", value: self.scheduling_class.clone() })?;

        Ok(ProcessRecord {
            id: self.id,
            slug: self.slug,
            version: Version::from_packed(self.version),
            name: self.name,
            process_type: self.process_type,
            category: self.category,
            persistence,
            scheduling_class,
            description: self.description,
            data_name: self.data_name,
            flow_collection: self.flow_collection,
            input_schema: serde_json::from_str(&self.input_schema)?,
            output_schema: serde_json::from_str(&self.output_schema)?,
            run: serde_json::from_str(&self.run)?,
            requirements: serde_json::from_str(&self.requirements)?,
            contributor_id: self.contributor_id,
            created: self.created,
            modified: self.modified,
        })
    }
}

pub fn get_process(conn: &Connection, slug: &str, version: Version) -> Result<Option<ProcessRecord>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM process WHERE slug = ?1 AND version = ?2"),
            (slug, version.packed()),
            ProcessRow::from_row,
        )
        .optional()?;
    row.map(ProcessRow::decode).transpose()
}

/// Every registered process, ordered by slug then version
pub fn list_processes(conn: &Connection) -> Result<Vec<ProcessRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM process ORDER BY slug, version"))?;
    let rows = stmt.query_map([], ProcessRow::from_row)?;

    let mut processes = Vec::new();
    for row in rows {
        processes.push(row?.decode()?);
    }
    Ok(processes)
}
