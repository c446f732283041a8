// tests/auth_tests.rs

mod common;

use common::{PASSWORD, spawn_app};
use serde_json::{Value, json};

#[tokio::test]
async fn unknown_route_returns_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_rejects_email_outside_whitelist() {
    let app = spawn_app().await;

    let response = app.register("stranger@corp.com", "Back-office").await;

    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "not_eligible");
}

#[tokio::test]
async fn register_verify_and_login_flow() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let email = "An.Nguyen@Corp.com";
    app.allow_email(&admin, email).await;

    // Act: register with mixed case, stored lower-case
    let response = app.register(email, "Back-office").await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "an.nguyen@corp.com");
    assert_eq!(body["email_sent"], true);
    assert!(body.get("verify_code").is_none());

    // Login before verification is refused
    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // Wrong code changes nothing
    let code = app.mailer.last_code_for("an.nguyen@corp.com");
    let wrong = if code == "000000" { "111111" } else { "000000" };
    let response = app
        .client
        .post(app.url("/api/auth/verify"))
        .json(&json!({ "email": email, "code": wrong }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "verification_mismatch");

    // Right code verifies and signs in
    let response = app
        .client
        .post(app.url("/api/auth/verify"))
        .json(&json!({ "email": email, "code": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["verified"], true);
    assert_eq!(body["user"]["role"], "learner");

    let token = app.login("an.nguyen@corp.com", PASSWORD).await;
    let me: Value = app
        .client
        .get(app.url("/api/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], "an.nguyen@corp.com");
    assert_eq!(me["department"], "Back-office");
    assert_eq!(me["attempts_count"], 0);
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn register_discloses_code_when_email_fails() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    app.allow_email(&admin, "offline@corp.com").await;
    app.mailer.set_delivering(false);

    let response = app.register("offline@corp.com", "Management").await;

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email_sent"], false);
    let code = body["verify_code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);

    let response = app
        .client
        .post(app.url("/api/auth/verify"))
        .json(&json!({ "email": "offline@corp.com", "code": code }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn duplicate_registration_is_reported() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    app.allow_email(&admin, "twice@corp.com").await;

    assert_eq!(app.register("twice@corp.com", "Back-office").await.status().as_u16(), 201);
    let response = app.register("TWICE@corp.com", "Back-office").await;

    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "already_registered");
    assert!(body["error"].as_str().unwrap().contains("pending verification"));
}

#[tokio::test]
async fn short_password_is_rejected_after_eligibility() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    app.allow_email(&admin, "short@corp.com").await;

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "email": "short@corp.com", "password": "123", "name": "S" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn wrong_password_is_invalid_credential() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": common::ADMIN_EMAIL, "password": "nope" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalid_credential");
}

#[tokio::test]
async fn learner_cannot_reach_admin_routes() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let learner = app.create_learner(&admin, "plain@corp.com", "Back-office").await;

    let response = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(&learner)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app.client.get(app.url("/api/me")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn trainer_cannot_promote_to_admin() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    app.create_learner(&admin, "coach@corp.com", "Management").await;
    app.create_learner(&admin, "pupil@corp.com", "Back-office").await;

    let users: Vec<Value> = app
        .client
        .get(app.url("/api/admin/users"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id_of = |email: &str| {
        users
            .iter()
            .find(|u| u["email"] == email)
            .and_then(|u| u["id"].as_i64())
            .unwrap()
    };
    let update = |role: &str, department: &str| {
        json!({ "role": role, "department": department, "status": "active" })
    };

    // Admin makes coach a trainer
    let response = app
        .client
        .put(app.url(&format!("/api/admin/users/{}", id_of("coach@corp.com"))))
        .bearer_auth(&admin)
        .json(&update("trainer", "Management"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Trainer asks for admin, gets trainer
    let trainer = app.login("coach@corp.com", PASSWORD).await;
    let response = app
        .client
        .put(app.url(&format!("/api/admin/users/{}", id_of("pupil@corp.com"))))
        .bearer_auth(&trainer)
        .json(&update("admin", "Back-office"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["role"], "trainer");

    // Trainer still lacks whitelist access
    let response = app
        .client
        .get(app.url("/api/admin/whitelist"))
        .bearer_auth(&trainer)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn deactivated_user_is_locked_out() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.create_learner(&admin, "gone@corp.com", "Back-office").await;

    sqlx::query("UPDATE users SET status = 'inactive' WHERE email = 'gone@corp.com'")
        .execute(&app.pool)
        .await
        .unwrap();

    let response = app
        .client
        .get(app.url("/api/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "gone@corp.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}
