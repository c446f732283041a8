// src/handlers/outreach.rs

//! Retest grants, reminder fan-out and the SMTP self-test.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    auth::Principal,
    error::AppError,
    handlers::course::fetch_course,
    mail::{Notifier, ReminderEmail},
    models::retest::{
        DispatchReport, GrantRetestRequest, RETEST_COLUMNS, Recipient, ReminderRequest,
        RetestGrantResponse, RetestRequest, TargetType,
    },
};

const RETEST_MESSAGE: &str =
    "A retest has been granted for this course. Please take the quiz again.";

/// Verified users a directive reaches right now.
async fn resolve_recipients(
    pool: &SqlitePool,
    target_type: TargetType,
    target_value: Option<&str>,
) -> Result<Vec<Recipient>, sqlx::Error> {
    match (target_type, target_value) {
        (TargetType::Department, Some(department)) => {
            sqlx::query_as::<_, Recipient>(
                "SELECT email, name FROM users WHERE verified = 1 AND status = 'active' AND department = ?",
            )
            .bind(department)
            .fetch_all(pool)
            .await
        }
        (TargetType::Individual, Some(email)) => {
            sqlx::query_as::<_, Recipient>("SELECT email, name FROM users WHERE verified = 1 AND email = ?")
                .bind(email)
                .fetch_all(pool)
                .await
        }
        (TargetType::All, _) => {
            sqlx::query_as::<_, Recipient>(
                "SELECT email, name FROM users WHERE verified = 1 AND status = 'active' AND role IN ('learner', 'trainer')",
            )
            .fetch_all(pool)
            .await
        }
        (_, None) => Ok(Vec::new()),
    }
}

/// Recipients of a recorded directive. A lookup failure leaves the directive
/// standing and reaches nobody.
async fn retest_recipients(pool: &SqlitePool, request: &RetestRequest) -> Vec<Recipient> {
    match resolve_recipients(pool, request.target_type, request.target_value.as_deref()).await {
        Ok(recipients) => recipients,
        Err(e) => {
            tracing::error!(request_id = request.id, "Could not resolve retest recipients: {}", e);
            Vec::new()
        }
    }
}

async fn fan_out(
    notifier: &Notifier,
    recipients: &[Recipient],
    course_title: &str,
    message: &str,
    sender_name: &str,
) -> usize {
    let mut sent = 0;
    for recipient in recipients {
        let delivered = notifier
            .send_reminder(&ReminderEmail {
                to: &recipient.email,
                learner_name: &recipient.name,
                course_title,
                message,
                sender_name,
            })
            .await;
        if delivered {
            sent += 1;
        }
    }
    sent
}

/// Records a retest directive, then emails everyone it reaches.
///
/// The directive stands even when no email goes out.
pub async fn grant_retest(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Extension(principal): Extension<Principal>,
    Path(course_id): Path<i64>,
    Json(payload): Json<GrantRetestRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let target_value = payload
        .target
        .normalized_value()
        .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
    let course = fetch_course(&pool, course_id).await?;

    let request = sqlx::query_as::<_, RetestRequest>(&format!(
        r#"
        INSERT INTO retest_requests (course_id, target_type, target_value, requested_by, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {RETEST_COLUMNS}
        "#
    ))
    .bind(course.id)
    .bind(payload.target.target_type)
    .bind(target_value.as_deref())
    .bind(&principal.email)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        by = %principal.email,
        course_id = course.id,
        target_type = ?request.target_type,
        target_value = ?request.target_value,
        "Retest granted"
    );

    let recipients = retest_recipients(&pool, &request).await;
    let sent = fan_out(
        &notifier,
        &recipients,
        course.display_title(),
        RETEST_MESSAGE,
        &principal.name,
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(RetestGrantResponse {
            request,
            dispatch: DispatchReport::new(recipients.len(), sent, "Retest"),
        }),
    ))
}

/// Emails a free-text reminder without touching quiz state.
pub async fn send_reminders(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ReminderRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let target_value = payload
        .target
        .normalized_value()
        .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
    let course = fetch_course(&pool, payload.course_id).await?;

    let recipients =
        resolve_recipients(&pool, payload.target.target_type, target_value.as_deref()).await?;
    let sent = fan_out(
        &notifier,
        &recipients,
        course.display_title(),
        payload.message.trim(),
        &principal.name,
    )
    .await;

    tracing::info!(
        by = %principal.email,
        course_id = course.id,
        targets = recipients.len(),
        sent,
        "Reminders dispatched"
    );

    Ok(Json(DispatchReport::new(recipients.len(), sent, "Reminder")))
}

/// Sends a test email to the caller.
pub async fn smtp_test(
    State(notifier): State<Notifier>,
    Extension(principal): Extension<Principal>,
) -> Result<impl IntoResponse, AppError> {
    let sent = notifier.send_test(&principal.email).await;
    Ok(Json(json!({
        "sent": sent,
        "message": if sent {
            format!("Test email sent to {}", principal.email)
        } else {
            "SMTP test failed. Check the server logs.".to_string()
        },
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(target_type: TargetType, target_value: Option<&str>) -> RetestRequest {
        RetestRequest {
            id: 7,
            course_id: 1,
            target_type,
            target_value: target_value.map(str::to_string),
            requested_by: "admin@corp.com".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_reaches_nobody() {
        // No users table, so every recipient query fails.
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();

        for request in [
            directive(TargetType::All, None),
            directive(TargetType::Department, Some("Back-office")),
            directive(TargetType::Individual, Some("a@corp.com")),
        ] {
            assert!(resolve_recipients(&pool, request.target_type, request.target_value.as_deref())
                .await
                .is_err());
            assert!(retest_recipients(&pool, &request).await.is_empty());
        }
    }
}
