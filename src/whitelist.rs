// src/whitelist.rs

//! Registration whitelist gate.

use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    models::whitelist::WhitelistEntry,
};

const ENTRY_COLUMNS: &str = "id, email, note, active, added_by, created_at";

/// Decides eligibility from a store read, falling back to `fallback` when the
/// store failed or holds no active entries.
fn decide<E: std::fmt::Display>(
    store: Result<Vec<String>, E>,
    fallback: &[String],
    email: &str,
) -> bool {
    let active = match store {
        Ok(list) if !list.is_empty() => list,
        Ok(_) => {
            tracing::debug!("Whitelist table is empty, using fallback list");
            return fallback.iter().any(|e| e.eq_ignore_ascii_case(email));
        }
        Err(e) => {
            tracing::warn!("Whitelist store unavailable, using fallback list: {}", e);
            return fallback.iter().any(|e| e.eq_ignore_ascii_case(email));
        }
    };
    active.iter().any(|e| e.eq_ignore_ascii_case(email))
}

/// True iff `email` may self-register.
pub async fn is_eligible(pool: &SqlitePool, fallback: &[String], email: &str) -> bool {
    let email = email.trim();
    let store = sqlx::query_scalar::<_, String>("SELECT email FROM allowed_emails WHERE active = 1")
        .fetch_all(pool)
        .await;
    decide(store, fallback, email)
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<WhitelistEntry>, AppError> {
    let entries = sqlx::query_as::<_, WhitelistEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM allowed_emails ORDER BY id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(entries)
}

/// Adds an active entry; duplicates (any case) are a `Conflict`.
pub async fn add(
    pool: &SqlitePool,
    email: &str,
    note: &str,
    issuer: &str,
) -> Result<WhitelistEntry, AppError> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::ValidationError("Invalid email.".to_string()));
    }

    sqlx::query_as::<_, WhitelistEntry>(&format!(
        r#"
        INSERT INTO allowed_emails (email, note, active, added_by)
        VALUES (?, ?, 1, ?)
        RETURNING {ENTRY_COLUMNS}
        "#
    ))
    .bind(&email)
    .bind(note)
    .bind(issuer)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Email '{}' is already whitelisted", email))
        } else {
            tracing::error!("Failed to add whitelist entry: {:?}", e);
            AppError::from(e)
        }
    })
}

/// Flips the active flag. Unknown ids are ignored.
pub async fn toggle(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE allowed_emails SET active = 1 - active WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes an entry. Unknown ids are ignored; registered users are untouched.
pub async fn remove(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM allowed_emails WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Seeds the fallback list into the table, skipping existing rows.
pub async fn seed_defaults(pool: &SqlitePool, fallback: &[String]) -> Result<(), sqlx::Error> {
    for email in fallback {
        sqlx::query(
            "INSERT OR IGNORE INTO allowed_emails (email, note, added_by) VALUES (?, 'Default', 'system')",
        )
        .bind(email.to_lowercase())
        .execute(pool)
        .await?;
    }
    Ok(())
}
