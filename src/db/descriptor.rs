use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::Value;

use crate::db::permission::ObjectKind;
use crate::db::upsert::Registrable;
use crate::db::{now, StoreError};
use crate::definition::model::DescriptorDefinition;
use crate::version::Version;

/// A registered descriptor schema as stored in the database
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorRecord {
    pub id: i64,
    pub slug: String,
    pub version: Version,
    pub name: String,
    pub description: String,
    pub schema: Value,
    pub contributor_id: i64,
    pub created: String,
    pub modified: String,
}

const COLUMNS: &str = "id, slug, version, name, description, schema, contributor_id, created, modified";

impl Registrable for DescriptorDefinition {
    const KIND: ObjectKind = ObjectKind::DescriptorSchema;

    fn slug(&self) -> &str {
        &self.slug
    }

    fn insert(&self, conn: &Connection, version: Version, contributor_id: i64) -> Result<i64, StoreError> {
        let schema = serde_json::to_string(&self.schema)?;
        conn.execute(
            "INSERT INTO descriptor_schema (slug, version, name, description, schema, contributor_id, created, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            (&self.slug, version.packed(), &self.name, &self.description, schema, contributor_id, now()),
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update(&self, conn: &Connection, id: i64) -> Result<(), StoreError> {
        let schema = serde_json::to_string(&self.schema)?;
        conn.execute(
            "UPDATE descriptor_schema SET name = ?1, description = ?2, schema = ?3, modified = ?4 WHERE id = ?5",
            (&self.name, &self.description, schema, now(), id),
        )?;
        Ok(())
    }
}

fn from_row(row: &Row) -> rusqlite::Result<(DescriptorRecord, String)> {
    let record = DescriptorRecord {
        id: row.get(0)?,
        slug: row.get(1)?,
        version: Version::from_packed(row.get(2)?),
        name: row.get(3)?,
        description: row.get(4)?,
        schema: Value::Null,
        contributor_id: row.get(6)?,
        created: row.get(7)?,
        modified: row.get(8)?,
    };
    Ok((record, row.get(5)?))
}

/// Attach the JSON decoded schema column
fn decode((mut record, schema): (DescriptorRecord, String)) -> Result<DescriptorRecord, StoreError> {
    record.schema = serde_json::from_str(&schema)?;
    Ok(record)
}

pub fn get_descriptor(conn: &Connection, slug: &str, version: Version) -> Result<Option<DescriptorRecord>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM descriptor_schema WHERE slug = ?1 AND version = ?2"),
            (slug, version.packed()),
            from_row,
        )
        .optional()?;
    row.map(decode).transpose()
}

/// Every registered descriptor schema, ordered by slug then version
pub fn list_descriptors(conn: &Connection) -> Result<Vec<DescriptorRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM descriptor_schema ORDER BY slug, version"))?;
    let rows = stmt.query_map([], from_row)?;

    let mut descriptors = Vec::new();
    for row in rows {
        descriptors.push(decode(row?)?);
    }
    Ok(descriptors)
}
