use log::info;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::db::{now, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub date_joined: String,
}

impl User {
    fn from_row(row: &Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            is_superuser: row.get(2)?,
            date_joined: row.get(3)?,
        })
    }
}

/// The superuser that joined first, owner of everything registered
pub fn get_admin(conn: &Connection) -> Result<Option<User>, StoreError> {
    let admin = conn
        .query_row(
            "SELECT id, username, is_superuser, date_joined FROM user
             WHERE is_superuser = 1 ORDER BY date_joined, id LIMIT 1",
            [],
            User::from_row,
        )
        .optional()?;
    Ok(admin)
}

/// Create a user, or update the superuser flag of an existing one
pub fn create_user(conn: &Connection, username: &str, is_superuser: bool) -> Result<User, StoreError> {
    info!("Saving user {username} (superuser: {is_superuser})");
    conn.execute(
        "INSERT INTO user (username, is_superuser, date_joined) VALUES (?1, ?2, ?3)
         ON CONFLICT (username) DO UPDATE SET is_superuser = excluded.is_superuser",
        (username, is_superuser, now()),
    )?;
    let user = conn.query_row(
        "SELECT id, username, is_superuser, date_joined FROM user WHERE username = ?1",
        [username],
        User::from_row,
    )?;
    Ok(user)
}

pub fn create_group(conn: &Connection, name: &str) -> Result<i64, StoreError> {
    conn.execute("INSERT INTO user_group (name) VALUES (?1)", [name])?;
    Ok(conn.last_insert_rowid())
}
