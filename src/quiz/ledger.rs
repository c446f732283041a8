// src/quiz/ledger.rs

//! Storage side of the quiz engine: reading the ledger subset for one
//! (learner, course) pair and appending attempts.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool, types::Json};

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        course::Course,
        result::{QuizResult, RESULT_COLUMNS, SubmitQuizRequest},
        retest::{RETEST_COLUMNS, RetestRequest},
    },
    quiz::{
        eligibility::{Eligibility, Learner, evaluate},
        scoring::{is_passing, score_submission},
    },
};

/// All results (valid and superseded) of a learner for a course, newest first.
pub async fn load_results(
    conn: &mut SqliteConnection,
    email: &str,
    course_id: i64,
) -> Result<Vec<QuizResult>, sqlx::Error> {
    sqlx::query_as::<_, QuizResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM results WHERE user_email = ? AND course_id = ? ORDER BY id DESC"
    ))
    .bind(email)
    .bind(course_id)
    .fetch_all(conn)
    .await
}

pub async fn load_retests(
    conn: &mut SqliteConnection,
    course_id: i64,
) -> Result<Vec<RetestRequest>, sqlx::Error> {
    sqlx::query_as::<_, RetestRequest>(&format!(
        "SELECT {RETEST_COLUMNS} FROM retest_requests WHERE course_id = ? ORDER BY id"
    ))
    .bind(course_id)
    .fetch_all(conn)
    .await
}

/// Current eligibility plus the learner's valid results for the course.
pub async fn eligibility_for(
    conn: &mut SqliteConnection,
    learner: &Learner<'_>,
    course: &Course,
) -> Result<(Eligibility, Vec<QuizResult>), sqlx::Error> {
    let results = load_results(&mut *conn, learner.email, course.id).await?;
    let retests = load_retests(&mut *conn, course.id).await?;
    let eligibility = evaluate(learner, course.max_attempts, &results, &retests, Utc::now());
    let valid = results.into_iter().filter(|r| r.is_valid).collect();
    Ok((eligibility, valid))
}

#[derive(sqlx::FromRow)]
struct AnswerKey {
    id: i64,
    answer: String,
}

/// Scores and records one submission.
///
/// Eligibility check, supersede and insert share one transaction so two racing
/// submissions cannot both pass the check with the same attempt number.
pub async fn submit_attempt(
    pool: &SqlitePool,
    learner: &Learner<'_>,
    course: &Course,
    req: &SubmitQuizRequest,
) -> Result<QuizResult, AppError> {
    let mut tx = pool.begin().await?;

    let results = load_results(&mut tx, learner.email, course.id).await?;
    let retests = load_retests(&mut tx, course.id).await?;
    let now = Utc::now();
    let eligibility = evaluate(learner, course.max_attempts, &results, &retests, now);
    eligibility.ensure_can_take()?;

    let keys: Vec<AnswerKey> =
        sqlx::query_as("SELECT id, answer FROM questions WHERE course_id = ?")
            .bind(course.id)
            .fetch_all(&mut *tx)
            .await?;
    if keys.is_empty() {
        return Err(AppError::NoQuestions);
    }
    let answer_keys: HashMap<i64, String> = keys.into_iter().map(|k| (k.id, k.answer)).collect();

    // Ids from other courses are dropped; an attempt left with none still counts as 0/0.
    let scored = score_submission(&req.question_ids, &answer_keys, &req.answers);
    let passed = is_passing(scored.score, course.pass_score);

    if eligibility.retest_granted {
        let superseded = sqlx::query(
            "UPDATE results SET is_valid = 0 WHERE user_email = ? AND course_id = ? AND is_valid = 1",
        )
        .bind(learner.email)
        .bind(course.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        tracing::info!(
            email = learner.email,
            course_id = course.id,
            superseded,
            "Retest grant consumed"
        );
    }

    let result = sqlx::query_as::<_, QuizResult>(&format!(
        r#"
        INSERT INTO results
        (user_email, course_id, score, total, passed, answers_json, attempt_number, is_valid, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)
        RETURNING {RESULT_COLUMNS}
        "#
    ))
    .bind(learner.email)
    .bind(course.id)
    .bind(scored.score)
    .bind(scored.total)
    .bind(passed)
    .bind(Json(scored.answers))
    .bind(eligibility.next_attempt_number())
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Another submission for this quiz was recorded first".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    tx.commit().await?;

    tracing::info!(
        email = learner.email,
        course_id = course.id,
        score = result.score,
        total = result.total,
        passed = result.passed,
        attempt = result.attempt_number,
        "Quiz attempt recorded"
    );

    Ok(result)
}
