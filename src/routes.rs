// src/routes.rs

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method, header},
    middleware::{self, Next},
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::{Capability, auth_middleware, require_capability},
    handlers::{admin, auth, certificate, course, outreach, profile, quiz, reports},
    state::AppState,
};

/// Restricts every route of `router` to principals holding `capability`.
fn gated(router: Router<AppState>, capability: Capability) -> Router<AppState> {
    router.route_layer(middleware::from_fn(move |req: Request, next: Next| {
        require_capability(capability, req, next)
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * Public auth routes.
/// * Signed-in routes behind `auth_middleware`.
/// * Admin route groups, each gated by one capability.
/// * Global Trace and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/verify", post(auth::verify))
        .route("/resend-code", post(auth::resend_code))
        .route("/login", post(auth::login));

    let learner_routes = Router::new()
        .route("/api/me", get(profile::get_me).put(profile::update_me))
        .route("/api/me/password", put(profile::change_password))
        .route("/api/me/signature", put(profile::save_signature))
        .route("/api/me/results", get(profile::my_results))
        .route("/api/me/certificates", get(profile::my_certificates))
        .route("/api/courses", get(course::list_courses))
        .route("/api/courses/{id}", get(course::get_course))
        .route("/api/quiz/results/{result_id}", get(quiz::get_result))
        .route("/api/quiz/{course_id}", get(quiz::start_quiz))
        .route("/api/quiz/{course_id}/submit", post(quiz::submit_quiz))
        .route("/api/certificates/{result_id}", get(certificate::get_certificate))
        .route(
            "/api/certificates/{result_id}/email",
            post(certificate::email_certificate),
        );

    let user_admin = gated(
        Router::new()
            .route("/api/admin/users", get(admin::list_users))
            .route("/api/admin/users/{id}", put(admin::update_user)),
        Capability::ManageUsers,
    );

    let whitelist_admin = gated(
        Router::new()
            .route(
                "/api/admin/whitelist",
                get(admin::list_whitelist).post(admin::add_whitelist),
            )
            .route("/api/admin/whitelist/{id}/toggle", post(admin::toggle_whitelist))
            .route(
                "/api/admin/whitelist/{id}",
                delete(admin::delete_whitelist),
            ),
        Capability::ManageWhitelist,
    );

    let content_admin = gated(
        Router::new()
            .route("/api/admin/courses", post(admin::create_course))
            .route(
                "/api/admin/courses/{id}",
                put(admin::update_course).delete(admin::delete_course),
            )
            .route("/api/admin/courses/{id}/settings", put(admin::update_quiz_settings))
            .route(
                "/api/admin/courses/{id}/questions",
                get(admin::list_questions).post(admin::create_question),
            )
            .route(
                "/api/admin/courses/{id}/questions/import",
                post(admin::import_questions),
            )
            .route(
                "/api/admin/courses/{id}/questions/{question_id}",
                delete(admin::delete_question),
            )
            .route("/api/admin/courses/{id}/retest", post(outreach::grant_retest))
            .route("/api/admin/reminders", post(outreach::send_reminders))
            .route("/api/admin/analytics", get(reports::analytics))
            .route("/api/admin/export.csv", get(reports::export_csv)),
        Capability::ManageContent,
    );

    let diagnostics = gated(
        Router::new().route("/api/admin/smtp-test", post(outreach::smtp_test)),
        Capability::RunDiagnostics,
    );

    // Capability gates run inside authentication.
    let protected = learner_routes
        .merge(user_admin)
        .merge(whitelist_admin)
        .merge(content_admin)
        .merge(diagnostics)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(protected)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
