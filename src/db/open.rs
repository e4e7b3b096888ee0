use std::path::Path;

use log::{debug, info};
use rusqlite::Connection;

use crate::db::StoreError;

/// Database file created in the working directory
pub const DB_FILE_NAME: &str = "flowreg.db";

static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/db/schema.sql"));

pub fn open_db(work_dir: &Path) -> Result<Connection, StoreError> {
    let path = work_dir.join(DB_FILE_NAME);
    if !path.exists() { info!("Creating new database {}", path.display()) }
    let conn = Connection::open(&path)?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;

    Ok(conn)
}

/// Everything written after this can be undone with [`release_or_rollback`]
pub fn begin_dry_run(conn: &Connection) -> Result<(), StoreError> {
    info!("Creating dry run save point");
    conn.execute_batch("SAVEPOINT dry_run")?;
    Ok(())
}

pub fn release_or_rollback(conn: &Connection, dry_run: bool) -> Result<(), StoreError> {
    match dry_run {
        true => {
            info!("--dry-run set, rolling back database state");
            conn.execute_batch("ROLLBACK TO dry_run; RELEASE dry_run")?;
        }
        false => {
            debug!("--dry-run not set, releasing dry run save point");
            conn.execute_batch("RELEASE dry_run")?;
        }
    }
    Ok(())
}

/// Run `f` inside a named save point: released if `f` succeeds, rolled back otherwise
pub fn with_savepoint<T, F>(conn: &Connection, name: &str, f: F) -> Result<T, StoreError>
where
    F: FnOnce(&Connection) -> Result<T, StoreError>,
{
    conn.execute_batch(&format!("SAVEPOINT {name}"))?;
    match f(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name}"))?;
            Ok(value)
        }
        Err(err) => {
            conn.execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}"))?;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_users(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM user", [], |row| row.get(0)).unwrap()
    }

    fn add_user(conn: &Connection, name: &str) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO user (username, is_superuser, date_joined) VALUES (?1, 0, '2024')",
            [name],
        )?;
        Ok(())
    }

    #[test]
    fn reopening_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_db(dir.path()).unwrap();
        add_user(&conn, "alice").unwrap();
        drop(conn);

        let conn = open_db(dir.path()).unwrap();
        assert_eq!(count_users(&conn), 1);
    }

    #[test]
    fn dry_run_rolls_everything_back() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_db(dir.path()).unwrap();

        begin_dry_run(&conn).unwrap();
        add_user(&conn, "alice").unwrap();
        release_or_rollback(&conn, true).unwrap();
        assert_eq!(count_users(&conn), 0);

        begin_dry_run(&conn).unwrap();
        add_user(&conn, "bob").unwrap();
        release_or_rollback(&conn, false).unwrap();
        assert_eq!(count_users(&conn), 1);
    }

    #[test]
    fn failed_savepoint_leaves_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_db(dir.path()).unwrap();

        let result = with_savepoint(&conn, "item", |conn| {
            add_user(conn, "alice")?;
            add_user(conn, "alice")
        });
        assert!(result.is_err());
        assert_eq!(count_users(&conn), 0);
    }
}
