// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use learning_hub::{
    config::Config,
    mail::{Mailer, Notifier},
    routes, seed,
    state::AppState,
};
use regex::Regex;
use serde_json::{Value, json};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "admin@test.local";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const PASSWORD: &str = "learner-pass";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer double that records every email and reports `deliver` as the outcome.
pub struct RecordingMailer {
    pub deliver: AtomicBool,
    pub sent: Mutex<Vec<SentEmail>>,
}

impl RecordingMailer {
    pub fn set_delivering(&self, deliver: bool) {
        self.deliver.store(deliver, Ordering::SeqCst);
    }

    pub fn emails_to(&self, to: &str) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|email| email.to == to)
            .cloned()
            .collect()
    }

    /// The code from the most recent verification email sent to `to`.
    pub fn last_code_for(&self, to: &str) -> String {
        let pattern = Regex::new(r">(\d{6})<").unwrap();
        let email = self
            .emails_to(to)
            .into_iter()
            .rev()
            .find(|email| email.subject.contains("Confirm"))
            .expect("no verification email recorded");
        pattern.captures(&email.body).expect("no code in email")[1].to_string()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> bool {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        self.deliver.load(Ordering::SeqCst)
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub mailer: Arc<RecordingMailer>,
    pub client: reqwest::Client,
    _dir: TempDir,
}

/// Spawns the app on a random port over a fresh SQLite file.
pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("lms.db"))
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to open SQLite database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let vars: HashMap<&str, &str> = HashMap::from([
        ("JWT_SECRET", "test_secret_for_integration_tests"),
        ("JWT_EXPIRATION", "600"),
        ("RUST_LOG", "error"),
        ("ADMIN_EMAIL", ADMIN_EMAIL),
        ("ADMIN_PASSWORD", ADMIN_PASSWORD),
        ("SEED_SAMPLE_COURSE", "false"),
        ("WHITELIST_FALLBACK", "fallback@test.local"),
    ]);
    let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("Failed to build config");

    seed::run(&pool, &config).await.expect("Failed to seed");

    let mailer = Arc::new(RecordingMailer {
        deliver: AtomicBool::new(true),
        sent: Mutex::new(Vec::new()),
    });

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config),
        notifier: Notifier::new(mailer.clone()),
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        pool,
        mailer,
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200, "login failed for {email}");
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn allow_email(&self, admin_token: &str, email: &str) {
        let response = self
            .client
            .post(self.url("/api/admin/whitelist"))
            .bearer_auth(admin_token)
            .json(&json!({ "email": email, "note": "test" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }

    pub async fn register(&self, email: &str, department: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "email": email,
                "password": PASSWORD,
                "name": "Test Learner",
                "department": department,
            }))
            .send()
            .await
            .unwrap()
    }

    /// Whitelists, registers and verifies a learner; returns their token.
    pub async fn create_learner(&self, admin_token: &str, email: &str, department: &str) -> String {
        self.allow_email(admin_token, email).await;
        let response = self.register(email, department).await;
        assert_eq!(response.status().as_u16(), 201);

        let code = self.mailer.last_code_for(email);
        let response = self
            .client
            .post(self.url("/api/auth/verify"))
            .json(&json!({ "email": email, "code": code }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_course(&self, token: &str, body: Value) -> i64 {
        let response = self
            .client
            .post(self.url("/api/admin/courses"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let course: Value = response.json().await.unwrap();
        course["id"].as_i64().unwrap()
    }

    pub async fn import_questions(&self, token: &str, course_id: i64, data: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/admin/courses/{course_id}/questions/import")))
            .bearer_auth(token)
            .json(&json!({ "data": data }))
            .send()
            .await
            .unwrap()
    }

    /// Question id -> correct letter, read through the admin API.
    pub async fn answer_key(&self, admin_token: &str, course_id: i64) -> HashMap<i64, String> {
        let questions: Vec<Value> = self
            .client
            .get(self.url(&format!("/api/admin/courses/{course_id}/questions")))
            .bearer_auth(admin_token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        questions
            .iter()
            .map(|q| {
                (
                    q["id"].as_i64().unwrap(),
                    q["answer"].as_str().unwrap().to_string(),
                )
            })
            .collect()
    }

    pub async fn start_quiz(&self, token: &str, course_id: i64) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/api/quiz/{course_id}")))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// Starts a quiz and answers every served question, correctly or with a wrong letter.
    pub async fn take_quiz(
        &self,
        token: &str,
        course_id: i64,
        key: &HashMap<i64, String>,
        correct: bool,
    ) -> reqwest::Response {
        let response = self.start_quiz(token, course_id).await;
        assert_eq!(response.status().as_u16(), 200);
        let paper: Value = response.json().await.unwrap();

        let ids: Vec<i64> = paper["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_i64().unwrap())
            .collect();
        let answers: HashMap<String, String> = ids
            .iter()
            .map(|id| {
                let right = key[id].clone();
                let letter = if correct {
                    right
                } else if right == "a" {
                    "b".to_string()
                } else {
                    "a".to_string()
                };
                (id.to_string(), letter)
            })
            .collect();

        self.client
            .post(self.url(&format!("/api/quiz/{course_id}/submit")))
            .bearer_auth(token)
            .json(&json!({ "question_ids": ids, "answers": answers }))
            .send()
            .await
            .unwrap()
    }
}

pub const TWO_QUESTIONS: &str = "2 + 2 = ?|3|4|5|6|b|Basic arithmetic\n\
Capital of France?|Berlin|Madrid|Paris|Rome|c|Geography";

pub fn course_body(title: &str, departments: &[&str], max_attempts: i64, pass_score: i64) -> Value {
    json!({
        "title_local": title,
        "title_en": title,
        "description_local": "<p>Intro</p><script>alert(1)</script>",
        "category": "Compliance",
        "target_groups": departments,
        "pass_score": pass_score,
        "max_attempts": max_attempts,
    })
}
