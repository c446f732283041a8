// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    auth::{Capability, Principal},
    error::AppError,
    handlers::course::fetch_course,
    models::{
        course::{COURSE_COLUMNS, Course, CourseRequest, QuizSettingsRequest},
        question::{
            CreateQuestionRequest, ImportQuestionsRequest, ImportReport, QUESTION_COLUMNS,
            Question, normalize_answer_letter,
        },
        user::{AdminUpdateUserRequest, Role, USER_COLUMNS, User},
        whitelist::AddWhitelistRequest,
    },
    utils::{html::clean_html, import::parse_import},
    whitelist,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Lists all users in the system.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"))
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(users))
}

/// Updates role, org fields and status of a user.
///
/// Only callers allowed to grant admin can promote to admin; anyone else
/// asking for it gets trainer instead.
pub async fn update_user(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = if payload.role == Role::Admin && !principal.can(Capability::GrantAdmin) {
        tracing::info!(by = %principal.email, user_id = id, "Admin promotion downgraded to trainer");
        Role::Trainer
    } else {
        payload.role
    };

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET role = ?, department = ?, team = ?, job_title = ?, job_level = ?, status = ?
        WHERE id = ?
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(role)
    .bind(&payload.department)
    .bind(&payload.team)
    .bind(&payload.job_title)
    .bind(&payload.job_level)
    .bind(payload.status)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(
        by = %principal.email,
        email = %user.email,
        role = user.role.as_str(),
        "User updated"
    );
    Ok(Json(user))
}

// ---------------------------------------------------------------------------
// Whitelist
// ---------------------------------------------------------------------------

pub async fn list_whitelist(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(whitelist::list(&pool).await?))
}

pub async fn add_whitelist(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<AddWhitelistRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let entry = whitelist::add(&pool, &payload.email, payload.note.trim(), &principal.email).await?;
    tracing::info!(by = %principal.email, email = %entry.email, "Whitelist entry added");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn toggle_whitelist(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    whitelist::toggle(&pool, id).await?;
    Ok(Json(json!({ "message": "Whitelist entry updated" })))
}

pub async fn delete_whitelist(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    whitelist::remove(&pool, id).await?;
    Ok(Json(json!({ "message": "Whitelist entry removed" })))
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

pub async fn create_course(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"
        INSERT INTO courses
        (title_local, title_en, description_local, description_en, category, video_url, pdf_url,
         target_groups, deadline, pass_score, quiz_count, time_limit, max_attempts, created_by)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {COURSE_COLUMNS}
        "#
    ))
    .bind(payload.title_local.trim())
    .bind(payload.title_en.trim())
    .bind(clean_html(&payload.description_local))
    .bind(clean_html(&payload.description_en))
    .bind(&payload.category)
    .bind(payload.video_url.trim())
    .bind(payload.pdf_url.trim())
    .bind(SqlJson(payload.target_groups.clone()))
    .bind(&payload.deadline)
    .bind(payload.pass_score)
    .bind(payload.quiz_count)
    .bind(payload.time_limit)
    .bind(payload.max_attempts)
    .bind(&principal.email)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create course: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(by = %principal.email, course_id = course.id, "Course created");
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update_course(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<CourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let course = sqlx::query_as::<_, Course>(&format!(
        r#"
        UPDATE courses SET
            title_local = ?, title_en = ?, description_local = ?, description_en = ?,
            category = ?, video_url = ?, pdf_url = ?, target_groups = ?, deadline = ?,
            pass_score = ?, quiz_count = ?, time_limit = ?, max_attempts = ?
        WHERE id = ?
        RETURNING {COURSE_COLUMNS}
        "#
    ))
    .bind(payload.title_local.trim())
    .bind(payload.title_en.trim())
    .bind(clean_html(&payload.description_local))
    .bind(clean_html(&payload.description_en))
    .bind(&payload.category)
    .bind(payload.video_url.trim())
    .bind(payload.pdf_url.trim())
    .bind(SqlJson(payload.target_groups.clone()))
    .bind(&payload.deadline)
    .bind(payload.pass_score)
    .bind(payload.quiz_count)
    .bind(payload.time_limit)
    .bind(payload.max_attempts)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    tracing::info!(by = %principal.email, course_id = id, "Course updated");
    Ok(Json(course))
}

/// Quiz panel of the question manager: served count, pass mark, attempt cap.
pub async fn update_quiz_settings(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<QuizSettingsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET quiz_count = ?, pass_score = ?, max_attempts = ? WHERE id = ? RETURNING {COURSE_COLUMNS}"
    ))
    .bind(payload.quiz_count)
    .bind(payload.pass_score)
    .bind(payload.max_attempts)
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    Ok(Json(course))
}

/// Deletes a course with its questions, results and retest requests.
pub async fn delete_course(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let mut removed = [0u64; 3];
    for (slot, table) in ["questions", "results", "retest_requests"].iter().enumerate() {
        removed[slot] = sqlx::query(&format!("DELETE FROM {table} WHERE course_id = ?"))
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    let deleted = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    tx.commit().await?;

    tracing::info!(
        by = %principal.email,
        course_id = id,
        questions = removed[0],
        results = removed[1],
        retests = removed[2],
        "Course deleted"
    );
    Ok(Json(json!({ "message": "Course deleted" })))
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

/// Full question bank of a course, answers included.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_course(&pool, course_id).await?;
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE course_id = ? ORDER BY id"
    ))
    .bind(course.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(questions))
}

pub async fn create_question(
    State(pool): State<SqlitePool>,
    Path(course_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let course = fetch_course(&pool, course_id).await?;

    let answer = normalize_answer_letter(&payload.answer)
        .ok_or_else(|| AppError::ValidationError("Answer must be a, b, c or d".to_string()))?;

    let question = sqlx::query_as::<_, Question>(&format!(
        r#"
        INSERT INTO questions
        (course_id, text, option_a, option_b, option_c, option_d, answer, explanation, source)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'manual')
        RETURNING {QUESTION_COLUMNS}
        "#
    ))
    .bind(course.id)
    .bind(payload.text.trim())
    .bind(payload.option_a.trim())
    .bind(payload.option_b.trim())
    .bind(payload.option_c.trim())
    .bind(payload.option_d.trim())
    .bind(&answer)
    .bind(payload.explanation.trim())
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Bulk import from `|`-separated text. All accepted lines go in one transaction.
pub async fn import_questions(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Path(course_id): Path<i64>,
    Json(payload): Json<ImportQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let course = fetch_course(&pool, course_id).await?;

    let outcome = parse_import(&payload.data);
    if outcome.questions.is_empty() {
        return Err(AppError::ValidationError(format!(
            "No valid questions found. Each line needs at least 6 '|'-separated fields (rejected lines: {:?})",
            outcome.rejected_lines
        )));
    }

    let mut tx = pool.begin().await?;
    for q in &outcome.questions {
        sqlx::query(
            r#"
            INSERT INTO questions
            (course_id, text, option_a, option_b, option_c, option_d, answer, explanation, source)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'csv')
            "#,
        )
        .bind(course.id)
        .bind(&q.text)
        .bind(&q.option_a)
        .bind(&q.option_b)
        .bind(&q.option_c)
        .bind(&q.option_d)
        .bind(&q.answer)
        .bind(&q.explanation)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(
        by = %principal.email,
        course_id = course.id,
        imported = outcome.questions.len(),
        rejected = outcome.rejected_lines.len(),
        "Questions imported"
    );

    Ok((
        StatusCode::CREATED,
        Json(ImportReport {
            imported: outcome.questions.len(),
            rejected_lines: outcome.rejected_lines,
        }),
    ))
}

pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path((course_id, question_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = sqlx::query("DELETE FROM questions WHERE id = ? AND course_id = ?")
        .bind(question_id)
        .bind(course_id)
        .execute(&pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(Json(json!({ "message": "Question deleted" })))
}
