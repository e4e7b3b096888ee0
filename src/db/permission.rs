//! Object permissions granted to users and groups
//!
//! Grants are stored per object. When a new version of a process or descriptor schema is
//! registered, the grants of the previous version are copied onto it, so sharing survives
//! upgrades.

use log::debug;
use rusqlite::Connection;

use crate::db::StoreError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Process,
    DescriptorSchema,
}

impl ObjectKind {
    /// Value of the `object_kind` column, also the name of the object's table
    pub fn table(&self) -> &'static str {
        match self {
            ObjectKind::Process => "process",
            ObjectKind::DescriptorSchema => "descriptor_schema",
        }
    }

    /// Every permission an object of this kind supports
    pub fn permissions(&self) -> &'static [&'static str] {
        match self {
            ObjectKind::Process => &["view", "share", "owner"],
            ObjectKind::DescriptorSchema => &["view", "edit", "share", "owner"],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grantee {
    User(i64),
    Group(i64),
}

/// Grant a permission. Granting twice is a no-op.
pub fn grant(conn: &Connection, kind: ObjectKind, object_id: i64, grantee: Grantee, perm: &str) -> Result<(), StoreError> {
    let (user_id, group_id) = match grantee {
        Grantee::User(id) => (Some(id), None),
        Grantee::Group(id) => (None, Some(id)),
    };
    conn.execute(
        "INSERT OR IGNORE INTO permission (object_kind, object_id, user_id, group_id, perm)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (kind.table(), object_id, user_id, group_id, perm),
    )?;
    Ok(())
}

/// Give the contributor every permission on a newly created object
pub fn assign_contributor_permissions(conn: &Connection, kind: ObjectKind, object_id: i64, contributor_id: i64) -> Result<(), StoreError> {
    for perm in kind.permissions() {
        grant(conn, kind, object_id, Grantee::User(contributor_id), perm)?;
    }
    Ok(())
}

/// Copy all user and group grants of `source` onto `destination`
pub fn copy_permissions(conn: &Connection, kind: ObjectKind, source: i64, destination: i64) -> Result<(), StoreError> {
    let copied = conn.execute(
        "INSERT OR IGNORE INTO permission (object_kind, object_id, user_id, group_id, perm)
         SELECT object_kind, ?1, user_id, group_id, perm FROM permission
         WHERE object_kind = ?2 AND object_id = ?3",
        (destination, kind.table(), source),
    )?;
    debug!("Copied {copied} {} grants from {source} to {destination}", kind.table());
    Ok(())
}

/// All grants on an object, sorted by grantee then permission
pub fn get_permissions(conn: &Connection, kind: ObjectKind, object_id: i64) -> Result<Vec<(Grantee, String)>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT user_id, group_id, perm FROM permission WHERE object_kind = ?1 AND object_id = ?2",
    )?;
    let rows = stmt.query_map((kind.table(), object_id), |row| {
        let user_id: Option<i64> = row.get(0)?;
        let group_id: Option<i64> = row.get(1)?;
        let perm: String = row.get(2)?;
        Ok((user_id, group_id, perm))
    })?;

    let mut grants = Vec::new();
    for row in rows {
        let (user_id, group_id, perm) = row?;
        let grantee = match (user_id, group_id) {
            (Some(id), _) => Grantee::User(id),
            (None, Some(id)) => Grantee::Group(id),
            (None, None) => return Err(StoreError::Column { column: "user_id", value: "NULL".to_string() }),
        };
        grants.push((grantee, perm));
    }
    grants.sort();
    Ok(grants)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::open::open_db;
    use crate::db::user::{create_group, create_user};

    #[test]
    fn copy_includes_users_and_groups_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_db(dir.path()).unwrap();
        let admin = create_user(&conn, "admin", true).unwrap();
        let viewer = create_user(&conn, "viewer", false).unwrap();
        let lab = create_group(&conn, "lab").unwrap();

        assign_contributor_permissions(&conn, ObjectKind::DescriptorSchema, 1, admin.id).unwrap();
        grant(&conn, ObjectKind::DescriptorSchema, 1, Grantee::User(viewer.id), "view").unwrap();
        grant(&conn, ObjectKind::DescriptorSchema, 1, Grantee::Group(lab), "view").unwrap();

        copy_permissions(&conn, ObjectKind::DescriptorSchema, 1, 2).unwrap();
        copy_permissions(&conn, ObjectKind::DescriptorSchema, 1, 2).unwrap();

        let source = get_permissions(&conn, ObjectKind::DescriptorSchema, 1).unwrap();
        let copied = get_permissions(&conn, ObjectKind::DescriptorSchema, 2).unwrap();
        assert_eq!(copied, source);
        assert_eq!(copied.len(), 6);
        assert!(copied.contains(&(Grantee::Group(lab), "view".to_string())));
    }

    #[test]
    fn grants_are_scoped_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_db(dir.path()).unwrap();
        let admin = create_user(&conn, "admin", true).unwrap();

        assign_contributor_permissions(&conn, ObjectKind::Process, 7, admin.id).unwrap();
        assert!(get_permissions(&conn, ObjectKind::DescriptorSchema, 7).unwrap().is_empty());
        assert_eq!(get_permissions(&conn, ObjectKind::Process, 7).unwrap().len(), 3);
    }
}
