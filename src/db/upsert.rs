use log::debug;
use rusqlite::{Connection, OptionalExtension};

use crate::db::open::with_savepoint;
use crate::db::permission::{assign_contributor_permissions, copy_permissions, ObjectKind};
use crate::db::StoreError;
use crate::version::Version;

/// A definition that can be written to its table
pub trait Registrable {
    const KIND: ObjectKind;

    fn slug(&self) -> &str;

    /// Insert a new row and return its id
    fn insert(&self, conn: &Connection, version: Version, contributor_id: i64) -> Result<i64, StoreError>;

    /// Overwrite the definition columns of an existing row, keeping its contributor and creation time
    fn update(&self, conn: &Connection, id: i64) -> Result<(), StoreError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(i64),
    Updated(i64),
    /// This exact version is registered and force wasn't set
    SameVersionInstalled,
    /// A strictly newer version is registered, force doesn't matter
    NewerVersionInstalled,
}

/// Register one version of a definition
///
/// Versions never go backwards: if a newer version of the slug exists the definition is skipped.
/// An existing row with the same version is only overwritten with `force`. A new row gets the
/// contributor's permissions plus every grant of the slug's previous latest version.
pub fn upsert<R: Registrable>(conn: &Connection, definition: &R, version: Version, contributor_id: i64, force: bool) -> Result<UpsertOutcome, StoreError> {
    let table = R::KIND.table();
    let slug = definition.slug();
    let packed = version.packed();

    let latest = latest_version(conn, table, slug)?;
    if let Some((_, latest_packed)) = latest {
        if latest_packed > packed {
            debug!("{slug} {version} is older than registered {}", Version::from_packed(latest_packed));
            return Ok(UpsertOutcome::NewerVersionInstalled);
        }
    }

    if let Some(id) = find_version(conn, table, slug, packed)? {
        if !force {
            return Ok(UpsertOutcome::SameVersionInstalled);
        }
        with_savepoint(conn, "upsert", |conn| definition.update(conn, id))?;
        return Ok(UpsertOutcome::Updated(id));
    }

    let id = with_savepoint(conn, "upsert", |conn| {
        let id = definition.insert(conn, version, contributor_id)?;
        assign_contributor_permissions(conn, R::KIND, id, contributor_id)?;
        if let Some((previous_id, _)) = latest {
            copy_permissions(conn, R::KIND, previous_id, id)?;
        }
        Ok(id)
    })?;
    Ok(UpsertOutcome::Inserted(id))
}

/// Id and packed version of the highest registered version of a slug
fn latest_version(conn: &Connection, table: &str, slug: &str) -> Result<Option<(i64, i64)>, StoreError> {
    let latest: Option<(i64, i64)> = conn
        .query_row(
            &format!("SELECT id, version FROM {table} WHERE slug = ?1 ORDER BY version DESC LIMIT 1"),
            [slug],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    Ok(latest)
}

fn find_version(conn: &Connection, table: &str, slug: &str, packed: i64) -> Result<Option<i64>, StoreError> {
    let id: Option<i64> = conn
        .query_row(
            &format!("SELECT id FROM {table} WHERE slug = ?1 AND version = ?2"),
            (slug, packed),
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}
