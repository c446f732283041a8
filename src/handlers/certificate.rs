// src/handlers/certificate.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    auth::Principal,
    error::AppError,
    mail::{CertificateEmail, Notifier},
    models::result::{CERTIFICATE_SELECT, Certificate},
};

/// A passing result owned by `email`. Anything else is `NotFound`.
pub(crate) async fn fetch_certificate(
    pool: &SqlitePool,
    email: &str,
    result_id: i64,
) -> Result<Certificate, AppError> {
    sqlx::query_as::<_, Certificate>(&format!(
        "{CERTIFICATE_SELECT} WHERE r.id = ? AND r.user_email = ? AND r.passed = 1"
    ))
    .bind(result_id)
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Certificate not found".to_string()))
}

pub(crate) async fn deliver_certificate(notifier: &Notifier, certificate: &Certificate) -> bool {
    let date = certificate.completed_at.format("%d/%m/%Y").to_string();
    notifier
        .send_certificate(&CertificateEmail {
            to: &certificate.learner_email,
            learner_name: &certificate.learner_name,
            course_title: &certificate.course_title,
            score: certificate.score,
            total: certificate.total,
            date: &date,
            trainer_name: certificate.trainer_name.as_deref(),
        })
        .await
}

pub async fn get_certificate(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Path(result_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let certificate = fetch_certificate(&pool, &principal.email, result_id).await?;
    Ok(Json(certificate))
}

/// Re-sends the certificate email to the learner.
pub async fn email_certificate(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Extension(principal): Extension<Principal>,
    Path(result_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let certificate = fetch_certificate(&pool, &principal.email, result_id).await?;
    let sent = deliver_certificate(&notifier, &certificate).await;

    Ok(Json(json!({
        "sent": sent,
        "message": if sent {
            "Certificate sent to your email."
        } else {
            "The certificate email could not be sent. Check the SMTP settings."
        },
    })))
}
