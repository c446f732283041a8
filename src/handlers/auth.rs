// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    mail::Notifier,
    models::user::{
        LoginRequest, RegisterRequest, ResendCodeRequest, USER_COLUMNS, User, UserStatus,
        VerifyRequest,
    },
    utils::{
        hash::{generate_verification_code, hash_password, verify_password},
        jwt::sign_jwt,
    },
    whitelist,
};

pub(crate) async fn find_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await
}

fn session_response(user: User, config: &Config) -> Result<Json<Value>, AppError> {
    let token = sign_jwt(user.id, user.role, &config.jwt_secret, config.jwt_expiration)?;
    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": user,
    })))
}

/// Self-registration for whitelisted emails.
///
/// Creates an unverified learner and emails a 6-digit code. When the email
/// cannot be delivered the code is returned in the response instead.
pub async fn register(
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    State(notifier): State<Notifier>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();

    if !whitelist::is_eligible(&pool, &config.fallback_whitelist, &email).await {
        tracing::info!(email = %email, "Registration refused, email not whitelisted");
        return Err(AppError::NotEligible(
            "This email is not allowed to register. Please contact HR.".to_string(),
        ));
    }

    if let Some(existing) = find_user_by_email(&pool, &email).await? {
        let message = if existing.verified {
            "This email is already registered"
        } else {
            "This email is registered and pending verification. Request a new code to finish."
        };
        return Err(AppError::AlreadyRegistered(message.to_string()));
    }

    payload.validate()?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::ValidationError("Name is required.".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let code = generate_verification_code();

    sqlx::query(
        r#"
        INSERT INTO users
        (email, password_hash, name, department, team, job_title, job_level, role, status, verified, verify_code)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'learner', 'active', 0, ?)
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(name)
    .bind(&payload.department)
    .bind(&payload.team)
    .bind(&payload.job_title)
    .bind(&payload.job_level)
    .bind(&code)
    .execute(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::AlreadyRegistered("This email is already registered".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(email = %email, department = %payload.department, "User registered, awaiting verification");

    let email_sent = notifier.send_verification_code(&email, &code).await;
    let body = if email_sent {
        json!({
            "email": email,
            "email_sent": true,
            "message": "A verification code has been sent to your email.",
        })
    } else {
        json!({
            "email": email,
            "email_sent": false,
            "verify_code": code,
            "message": "Email could not be sent. Use the code shown here to verify your account.",
        })
    };

    Ok((StatusCode::CREATED, Json(body)))
}

/// Confirms the one-time code and signs the user in.
pub async fn verify(
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    Json(payload): Json<VerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user_by_email(&pool, &payload.email)
        .await?
        .ok_or_else(|| AppError::NotFound("No account for this email".to_string()))?;

    if user.verified {
        return Err(AppError::Conflict("This account is already verified".to_string()));
    }

    let code = payload.code.trim();
    if code.is_empty() || user.verify_code.as_deref() != Some(code) {
        tracing::info!(email = %user.email, "Verification code mismatch");
        return Err(AppError::VerificationMismatch);
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET verified = 1, verify_code = NULL WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    tracing::info!(email = %user.email, "Account verified");
    session_response(user, &config)
}

/// Issues a fresh code for an account still pending verification.
pub async fn resend_code(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Json(payload): Json<ResendCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user_by_email(&pool, &payload.email)
        .await?
        .filter(|user| !user.verified)
        .ok_or_else(|| AppError::NotFound("No account pending verification for this email".to_string()))?;

    let code = generate_verification_code();
    sqlx::query("UPDATE users SET verify_code = ? WHERE id = ?")
        .bind(&code)
        .bind(user.id)
        .execute(&pool)
        .await?;

    let email_sent = notifier.send_verification_code(&user.email, &code).await;
    let mut body = json!({
        "email": user.email,
        "email_sent": email_sent,
        "message": if email_sent {
            "A new verification code has been sent."
        } else {
            "Email could not be sent. Use the code shown here."
        },
    });
    if !email_sent {
        body["verify_code"] = json!(code);
    }

    Ok(Json(body))
}

/// Authenticates a user and returns a JWT token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Arc<Config>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = find_user_by_email(&pool, &payload.email).await?;
    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => {
            tracing::info!(email = %payload.email.trim(), "Login failed");
            return Err(AppError::InvalidCredential("Invalid email or password".to_string()));
        }
    };

    if !user.verified {
        return Err(AppError::Forbidden(
            "Your account is pending email verification".to_string(),
        ));
    }
    if user.status == UserStatus::Inactive {
        return Err(AppError::Forbidden("Your account has been deactivated".to_string()));
    }

    tracing::info!(email = %user.email, role = user.role.as_str(), "User logged in");
    session_response(user, &config)
}
