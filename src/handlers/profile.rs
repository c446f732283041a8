// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    auth::Principal,
    error::AppError,
    models::{
        result::{CERTIFICATE_SELECT, Certificate, REPORT_SELECT, ResultReportRow},
        user::{
            ChangePasswordRequest, MeResponse, SignatureRequest, USER_COLUMNS,
            UpdateProfileRequest, User,
        },
    },
    utils::hash::{hash_password, verify_password},
};

async fn fetch_user(pool: &SqlitePool, id: i64) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Get current user's profile and statistics.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user(&pool, principal.id).await?;

    let (attempts_count, passed_courses): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COUNT(DISTINCT CASE WHEN passed = 1 THEN course_id END)
        FROM results
        WHERE user_email = ? AND is_valid = 1
        "#,
    )
    .bind(&user.email)
    .fetch_one(&pool)
    .await?;

    Ok(Json(MeResponse {
        user,
        attempts_count,
        passed_courses,
    }))
}

/// Updates the caller's own profile. Absent fields are left unchanged.
pub async fn update_me(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let name = payload.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(AppError::ValidationError("Name is required.".to_string()));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            department = COALESCE(?, department),
            team = COALESCE(?, team),
            job_title = COALESCE(?, job_title),
            job_level = COALESCE(?, job_level),
            avatar_url = COALESCE(?, avatar_url)
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(name)
    .bind(payload.department.as_deref())
    .bind(payload.team.as_deref())
    .bind(payload.job_title.as_deref())
    .bind(payload.job_level.as_deref())
    .bind(payload.avatar_url.as_deref())
    .bind(principal.id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(email = %user.email, "Profile updated");
    Ok(Json(user))
}

pub async fn change_password(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = fetch_user(&pool, principal.id).await?;
    if !verify_password(&payload.old_password, &user.password_hash) {
        return Err(AppError::InvalidCredential("Current password is incorrect".to_string()));
    }

    let password_hash = hash_password(&payload.new_password)?;
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(user.id)
        .execute(&pool)
        .await?;

    tracing::info!(email = %user.email, "Password changed");
    Ok(Json(json!({ "message": "Password updated" })))
}

/// Stores the drawn signature printed on certificates.
pub async fn save_signature(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<SignatureRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    sqlx::query("UPDATE users SET signature_data = ? WHERE id = ?")
        .bind(&payload.signature_data)
        .bind(principal.id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({ "message": "Signature saved" })))
}

/// The caller's valid results, newest first.
pub async fn my_results(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ResultReportRow>(&format!(
        "{REPORT_SELECT} WHERE r.user_email = ? AND r.is_valid = 1 ORDER BY r.completed_at DESC, r.id DESC"
    ))
    .bind(&principal.email)
    .fetch_all(&pool)
    .await?;

    Ok(Json(rows))
}

/// Latest valid pass per course.
pub async fn my_certificates(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let certificates = sqlx::query_as::<_, Certificate>(&format!(
        r#"
        {CERTIFICATE_SELECT}
        WHERE r.id IN (
            SELECT MAX(id) FROM results
            WHERE user_email = ? AND is_valid = 1 AND passed = 1
            GROUP BY course_id
        )
        ORDER BY r.completed_at DESC
        "#
    ))
    .bind(&principal.email)
    .fetch_all(&pool)
    .await?;

    Ok(Json(certificates))
}
