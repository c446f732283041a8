// src/seed.rs

//! First-boot data: the admin account, default whitelist and a sample course.
//! Every step is skipped when its data already exists.

use sqlx::{SqlitePool, types::Json};

use crate::{config::Config, error::AppError, utils::hash::hash_password, whitelist};

struct SampleQuestion {
    text: &'static str,
    options: [&'static str; 4],
    answer: &'static str,
    explanation: &'static str,
}

const SAMPLE_QUESTIONS: &[SampleQuestion] = &[
    SampleQuestion {
        text: "What is the first thing to do when you discover a fire?",
        options: [
            "Run outside immediately",
            "Press the fire alarm",
            "Call a friend",
            "Keep working",
        ],
        answer: "b",
        explanation: "The alarm warns every colleague in the building.",
    },
    SampleQuestion {
        text: "Which personal protective equipment is mandatory in the production area?",
        options: [
            "Helmet and shoes",
            "Gloves only",
            "Helmet, goggles, gloves and safety shoes",
            "None",
        ],
        answer: "c",
        explanation: "The production area requires the full PPE set.",
    },
    SampleQuestion {
        text: "How often must safety equipment be inspected?",
        options: [
            "Once a year",
            "Every six months",
            "Every month",
            "Only when it breaks",
        ],
        answer: "c",
        explanation: "Safety equipment is inspected monthly.",
    },
    SampleQuestion {
        text: "Who is responsible for workplace safety?",
        options: [
            "Management only",
            "The safety department only",
            "Every employee",
            "Customers",
        ],
        answer: "c",
        explanation: "Safety is everyone's responsibility.",
    },
];

/// Runs all seed steps in order.
pub async fn run(pool: &SqlitePool, config: &Config) -> Result<(), AppError> {
    whitelist::seed_defaults(pool, &config.fallback_whitelist).await?;
    seed_admin_user(pool, config).await?;
    if config.seed_sample_course {
        seed_sample_course(pool, config.admin_email.as_deref()).await?;
    }
    Ok(())
}

/// Creates the verified admin named by `ADMIN_EMAIL` / `ADMIN_PASSWORD`.
pub async fn seed_admin_user(pool: &SqlitePool, config: &Config) -> Result<(), AppError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        tracing::debug!("ADMIN_EMAIL or ADMIN_PASSWORD not set, skipping admin seed");
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;
    if exists.is_some() {
        return Ok(());
    }

    tracing::info!(email = %email, "Seeding admin user");
    let password_hash = hash_password(password)?;

    sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, name, department, team, job_title, job_level, role, verified)
        VALUES (?, ?, ?, 'Management', 'Product Team', 'Product Team Leader', 'Assistant Manager', 'admin', 1)
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(&config.admin_name)
    .execute(pool)
    .await?;

    tracing::info!("Admin user created successfully.");
    Ok(())
}

/// Adds a demo compliance course with four questions when no course exists.
pub async fn seed_sample_course(pool: &SqlitePool, created_by: Option<&str>) -> Result<(), AppError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    let course_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO courses
        (title_local, title_en, description_local, description_en, category, video_url,
         target_groups, deadline, pass_score, quiz_count, time_limit, max_attempts, created_by)
        VALUES (?, ?, ?, ?, 'Compliance', ?, ?, '2026-04-30', 3, 4, 15, 3, ?)
        RETURNING id
        "#,
    )
    .bind("Workplace Safety Regulations")
    .bind("Workplace Safety Regulations")
    .bind("Basic workplace safety rules for the factory floor.")
    .bind("Basic workplace safety rules for the factory floor.")
    .bind("https://www.youtube.com/embed/dQw4w9WgXcQ")
    .bind(Json(vec![
        "Sales & Marketing Vietnam".to_string(),
        "Back-office".to_string(),
    ]))
    .bind(created_by)
    .fetch_one(&mut *tx)
    .await?;

    for q in SAMPLE_QUESTIONS {
        sqlx::query(
            r#"
            INSERT INTO questions
            (course_id, text, option_a, option_b, option_c, option_d, answer, explanation, source)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'sample')
            "#,
        )
        .bind(course_id)
        .bind(q.text)
        .bind(q.options[0])
        .bind(q.options[1])
        .bind(q.options[2])
        .bind(q.options[3])
        .bind(q.answer)
        .bind(q.explanation)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    tracing::info!(course_id, "Sample course seeded");
    Ok(())
}
