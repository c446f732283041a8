// src/handlers/course.rs

use std::collections::{HashMap, HashSet};

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{
    auth::{Capability, Principal},
    error::AppError,
    models::course::{
        COURSE_COLUMNS, Course, CourseDetailResponse, CourseListParams, CourseSummary,
        embed_video_url,
    },
    quiz::ledger,
};

pub(crate) async fn fetch_course(pool: &SqlitePool, id: i64) -> Result<Course, AppError> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
}

fn is_visible_to(course: &Course, principal: &Principal) -> bool {
    principal.can(Capability::BrowseAllCourses) || course.is_targeted_at(&principal.department)
}

/// Loads a course the caller is allowed to see.
/// Courses outside the caller's department are reported as missing.
pub(crate) async fn fetch_visible_course(
    pool: &SqlitePool,
    principal: &Principal,
    id: i64,
) -> Result<Course, AppError> {
    let course = fetch_course(pool, id).await?;
    if !is_visible_to(&course, principal) {
        return Err(AppError::NotFound("Course not found".to_string()));
    }
    Ok(course)
}

pub(crate) async fn count_questions(pool: &SqlitePool, course_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE course_id = ?")
        .bind(course_id)
        .fetch_one(pool)
        .await
}

/// Lists visible courses, newest first.
///
/// Supports keyword search over titles and descriptions, and a category filter.
pub async fn list_courses(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<CourseListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut query_builder =
        QueryBuilder::<Sqlite>::new(format!("SELECT {COURSE_COLUMNS} FROM courses WHERE 1 = 1"));

    if let Some(category) = params.category.as_deref().filter(|c| !c.is_empty()) {
        query_builder.push(" AND category = ").push_bind(category.to_string());
    }

    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", q);
        query_builder.push(" AND (");
        let mut separated = query_builder.separated(" OR ");
        for column in ["title_local", "title_en", "description_local", "description_en"] {
            separated.push(format!("{column} LIKE "));
            separated.push_bind_unseparated(pattern.clone());
        }
        query_builder.push(")");
    }

    query_builder.push(" ORDER BY created_at DESC, id DESC");

    let courses: Vec<Course> = query_builder.build_query_as().fetch_all(&pool).await?;

    let counts: HashMap<i64, i64> =
        sqlx::query_as::<_, (i64, i64)>("SELECT course_id, COUNT(*) FROM questions GROUP BY course_id")
            .fetch_all(&pool)
            .await?
            .into_iter()
            .collect();

    let passed: HashSet<i64> = sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT course_id FROM results WHERE user_email = ? AND is_valid = 1 AND passed = 1",
    )
    .bind(&principal.email)
    .fetch_all(&pool)
    .await?
    .into_iter()
    .collect();

    let summaries: Vec<CourseSummary> = courses
        .into_iter()
        .filter(|course| is_visible_to(course, &principal))
        .map(|course| CourseSummary {
            question_count: counts.get(&course.id).copied().unwrap_or(0),
            passed: passed.contains(&course.id),
            course,
        })
        .collect();

    Ok(Json(summaries))
}

/// Course page: content, embed link and the caller's quiz standing.
pub async fn get_course(
    State(pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let course = fetch_visible_course(&pool, &principal, id).await?;
    let question_count = count_questions(&pool, course.id).await?;

    let mut conn = pool.acquire().await?;
    let (eligibility, results) = ledger::eligibility_for(&mut conn, &principal.learner(), &course).await?;

    Ok(Json(CourseDetailResponse {
        embed_url: embed_video_url(&course.video_url),
        course,
        question_count,
        eligibility,
        results,
    }))
}
