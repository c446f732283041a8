// src/auth.rs

//! Request authentication and the role capability table.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    error::AppError,
    models::user::{Role, USER_COLUMNS, User, UserStatus},
    quiz::eligibility::Learner,
    state::AppState,
    utils::jwt::verify_jwt,
};

/// Something a route group needs beyond being signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// See courses regardless of department targeting.
    BrowseAllCourses,
    /// Courses, questions, retests, reminders, analytics, exports.
    ManageContent,
    /// Edit users' role, org fields and status.
    ManageUsers,
    /// Registration whitelist.
    ManageWhitelist,
    /// Promote a user to admin.
    GrantAdmin,
    /// SMTP self-test.
    RunDiagnostics,
}

const TRAINER_CAPABILITIES: &[Capability] = &[
    Capability::BrowseAllCourses,
    Capability::ManageContent,
    Capability::ManageUsers,
];

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::BrowseAllCourses,
    Capability::ManageContent,
    Capability::ManageUsers,
    Capability::ManageWhitelist,
    Capability::GrantAdmin,
    Capability::RunDiagnostics,
];

pub fn capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Learner => &[],
        Role::Trainer => TRAINER_CAPABILITIES,
        Role::Admin => ADMIN_CAPABILITIES,
    }
}

/// The authenticated caller, reloaded from the users table on every request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub department: String,
    pub role: Role,
    pub status: UserStatus,
}

impl Principal {
    pub fn can(&self, capability: Capability) -> bool {
        capabilities(self.role).contains(&capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden("You do not have access to this action".to_string()))
        }
    }

    pub fn learner(&self) -> Learner<'_> {
        Learner {
            email: &self.email,
            department: &self.department,
        }
    }
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            department: user.department,
            role: user.role,
            status: user.status,
        }
    }
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header, loads the user and
/// injects a `Principal` into the request extensions. Inactive or unverified
/// accounts are refused even with a valid token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = verify_jwt(token, &state.config.jwt_secret)?;
    let user_id = claims.user_id()?;

    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    if user.status == UserStatus::Inactive {
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }
    if !user.verified {
        return Err(AppError::Forbidden("Account is not verified".to_string()));
    }

    req.extensions_mut().insert(Principal::from(user));
    Ok(next.run(req).await)
}

/// Axum Middleware: capability check.
///
/// Must run after `auth_middleware`. Wrap with
/// `middleware::from_fn(|req, next| require_capability(cap, req, next))`.
pub async fn require_capability(
    capability: Capability,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))?;

    if !principal.can(capability) {
        tracing::warn!(
            email = %principal.email,
            role = principal.role.as_str(),
            ?capability,
            "Capability check failed"
        );
    }
    principal.require(capability)?;

    Ok(next.run(req).await)
}
