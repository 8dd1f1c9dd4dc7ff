//! Bearer tokens for the HTTP API. A token maps to exactly one user.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use crate::diary::timestamp;

/// Create a new random token for `user_id` and return it.
pub fn issue_token(conn: &Connection, user_id: &str) -> Result<String> {
    let user_id = user_id.trim();
    anyhow::ensure!(!user_id.is_empty(), "user id must not be empty");

    let token = uuid::Uuid::new_v4().simple().to_string();
    conn.execute(
        "INSERT INTO user_tokens (token, user_id, created_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, timestamp(chrono::Utc::now())],
    )?;
    tracing::info!(user = %user_id, "token issued");
    Ok(token)
}

/// The user a token belongs to, if any.
pub fn resolve_token(conn: &Connection, token: &str) -> Result<Option<String>> {
    let user = conn
        .query_row(
            "SELECT user_id FROM user_tokens WHERE token = ?1",
            params![token],
            |row| row.get(0),
        )
        .optional()?;
    Ok(user)
}

/// Delete every token of `user_id`. Returns how many were removed.
pub fn revoke_tokens(conn: &Connection, user_id: &str) -> Result<usize> {
    let n = conn.execute("DELETE FROM user_tokens WHERE user_id = ?1", params![user_id])?;
    Ok(n)
}
