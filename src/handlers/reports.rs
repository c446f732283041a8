// src/handlers/reports.rs

use axum::{
    Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        analytics::{AnalyticsOverview, DepartmentStats, pass_rate},
        result::{REPORT_SELECT, ResultReportRow},
        user::DEPARTMENTS,
    },
    utils::report::render_results_csv,
};

/// Dashboard totals and per-department breakdown.
pub async fn analytics(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let total_users: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role IN ('learner', 'trainer')")
            .fetch_one(&pool)
            .await?;
    let total_courses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(&pool)
        .await?;
    let total_passes: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM (SELECT DISTINCT user_email, course_id FROM results WHERE is_valid = 1 AND passed = 1)",
    )
    .fetch_one(&pool)
    .await?;
    let total_attempts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results WHERE is_valid = 1")
        .fetch_one(&pool)
        .await?;

    let mut departments = Vec::with_capacity(DEPARTMENTS.len());
    for &department in DEPARTMENTS {
        let users: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE department = ? AND role IN ('learner', 'trainer')",
        )
        .bind(department)
        .fetch_one(&pool)
        .await?;

        let (attempts, passes): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(r.passed), 0)
            FROM results r
            JOIN users u ON u.email = r.user_email
            WHERE u.department = ? AND r.is_valid = 1
            "#,
        )
        .bind(department)
        .fetch_one(&pool)
        .await?;

        departments.push(DepartmentStats {
            department: department.to_string(),
            users,
            attempts,
            passes,
            pass_rate: pass_rate(passes, attempts),
        });
    }

    Ok(Json(AnalyticsOverview {
        total_users,
        total_courses,
        total_passes,
        total_attempts,
        departments,
    }))
}

/// All valid results as a spreadsheet download.
pub async fn export_csv(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ResultReportRow>(&format!(
        "{REPORT_SELECT} WHERE r.is_valid = 1 ORDER BY r.completed_at DESC, r.id DESC"
    ))
    .fetch_all(&pool)
    .await?;

    let body = render_results_csv(&rows).map_err(|e| {
        tracing::error!("Failed to render CSV report: {}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let disposition = format!(
        "attachment; filename=report_{}.csv",
        Utc::now().format("%Y%m%d")
    );
    tracing::info!(rows = rows.len(), "Report exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
