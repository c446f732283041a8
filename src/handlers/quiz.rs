// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    auth::Principal,
    error::AppError,
    handlers::{
        certificate::{deliver_certificate, fetch_certificate},
        course::{fetch_course, fetch_visible_course},
    },
    mail::Notifier,
    models::{
        question::{PublicQuestion, QUESTION_COLUMNS, Question, QuizPaper},
        result::{
            QuizResult, RESULT_COLUMNS, ResultDetailResponse, ReviewedAnswer, SubmitQuizRequest,
            SubmitQuizResponse,
        },
    },
    quiz::{ledger, sampling::sample_questions},
};

async fn question_bank(pool: &SqlitePool, course_id: i64) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE course_id = ? ORDER BY id"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Serves a fresh, shuffled attempt.
///
/// Answers and explanations are never part of the paper.
pub async fn start_quiz(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_visible_course(&pool, &principal, course_id).await?;

    let bank = question_bank(&pool, course.id).await?;
    if bank.is_empty() {
        return Err(AppError::NoQuestions);
    }

    let mut conn = pool.acquire().await?;
    let (eligibility, _) = ledger::eligibility_for(&mut conn, &principal.learner(), &course).await?;
    drop(conn);
    eligibility.ensure_can_take()?;

    let served = {
        let mut rng = rand::thread_rng();
        sample_questions(bank, course.quiz_count, &mut rng)
    };

    tracing::debug!(
        email = %principal.email,
        course_id = course.id,
        served = served.len(),
        "Quiz paper generated"
    );

    Ok(Json(QuizPaper {
        course_id: course.id,
        course_title: course.display_title().to_string(),
        time_limit: course.time_limit,
        pass_score: course.pass_score,
        attempt_number: eligibility.next_attempt_number(),
        max_attempts: eligibility.max_attempts,
        questions: served.into_iter().map(PublicQuestion::from).collect(),
    }))
}

/// Scores and records an attempt.
///
/// On a pass the certificate email goes out after the result is committed;
/// a delivery failure only shows up as `certificate_sent: false`.
pub async fn submit_quiz(
    State(pool): State<SqlitePool>,
    State(notifier): State<Notifier>,
    Extension(principal): Extension<Principal>,
    Path(course_id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.question_ids.is_empty() {
        return Err(AppError::ValidationError("No questions submitted".to_string()));
    }

    let course = fetch_visible_course(&pool, &principal, course_id).await?;
    let result = ledger::submit_attempt(&pool, &principal.learner(), &course, &req).await?;

    let certificate_sent = if result.passed {
        match fetch_certificate(&pool, &principal.email, result.id).await {
            Ok(certificate) => deliver_certificate(&notifier, &certificate).await,
            Err(e) => {
                tracing::error!(result_id = result.id, "Could not load certificate for email: {}", e);
                false
            }
        }
    } else {
        false
    };

    let message = if result.passed {
        format!(
            "Congratulations! You passed with {}/{}.",
            result.score, result.total
        )
    } else {
        format!(
            "You scored {}/{}. {} correct answers are needed to pass.",
            result.score, result.total, course.pass_score
        )
    };

    Ok(Json(SubmitQuizResponse {
        result,
        pass_score: course.pass_score,
        certificate_sent,
        message,
    }))
}

/// Review of one of the caller's own attempts, with the correct answers.
pub async fn get_result(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Path(result_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query_as::<_, QuizResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM results WHERE id = ? AND user_email = ?"
    ))
    .bind(result_id)
    .bind(&principal.email)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Result not found".to_string()))?;

    let course = fetch_course(&pool, result.course_id).await?;
    let questions: HashMap<i64, Question> = question_bank(&pool, course.id)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    // Questions deleted since the attempt drop out of the review.
    let review = result
        .answers_json
        .iter()
        .filter_map(|(question_id, chosen)| {
            questions.get(question_id).map(|q| ReviewedAnswer {
                question_id: *question_id,
                text: q.text.clone(),
                chosen: chosen.clone(),
                correct: q.answer.clone(),
                is_correct: chosen.eq_ignore_ascii_case(&q.answer),
                explanation: q.explanation.clone(),
            })
        })
        .collect();

    let mut conn = pool.acquire().await?;
    let (eligibility, _) = ledger::eligibility_for(&mut conn, &principal.learner(), &course).await?;

    Ok(Json(ResultDetailResponse {
        course_title: course.display_title().to_string(),
        result,
        review,
        eligibility,
    }))
}
