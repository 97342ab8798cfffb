//! Authentication routes (login, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::form::csrf::{clear_csrf_tokens, generate_csrf_token, verify_csrf_token};
use crate::models::User;
use crate::session::SESSION_USER_ID;
use crate::state::AppState;

/// Token action of the login form.
const LOGIN_ACTION: &str = "user_login";

/// Typed login error for explicit status code mapping.
#[derive(Debug)]
enum LoginError {
    /// The form token was missing, stale, or already used (400).
    InvalidToken,
    /// Invalid credentials: wrong username or password (401).
    InvalidCredentials,
    /// Internal server error: database failure, etc. (500).
    Internal,
}

impl LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            LoginError::InvalidToken => StatusCode::BAD_REQUEST,
            LoginError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            LoginError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            LoginError::InvalidToken => "Invalid form token. Please try again.",
            LoginError::InvalidCredentials => "Invalid username or password",
            LoginError::Internal => "Internal server error",
        }
    }
}

/// Form-based login request.
#[derive(Debug, Deserialize)]
struct LoginFormRequest {
    username: String,
    password: String,
    #[serde(rename = "_token", default)]
    csrf_token: String,
}

/// Login form handler.
///
/// GET /user/login
async fn login_form(State(state): State<AppState>, session: Session) -> Response {
    render_login(&state, &session, StatusCode::OK, None).await
}

/// Form-based login handler.
///
/// POST /user/login
async fn login_form_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginFormRequest>,
) -> Response {
    match do_login(&state, &session, &form).await {
        Ok(()) => Redirect::to("/admin").into_response(),
        Err(e) => render_login(&state, &session, e.status_code(), Some(e.message())).await,
    }
}

/// Render the login form with a fresh token.
async fn render_login(
    state: &AppState,
    session: &Session,
    status: StatusCode,
    error: Option<&str>,
) -> Response {
    let csrf_token = match generate_csrf_token(session, LOGIN_ACTION).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to generate CSRF token");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Error</h1><p>Failed to generate form token</p>"),
            )
                .into_response();
        }
    };

    let mut context = tera::Context::new();
    context.insert("csrf_token", &csrf_token);
    context.insert("error", &error);

    match state.theme().render("user/login.html", &context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render login form");
            (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Error</h1>")).into_response()
        }
    }
}

/// Perform login and return typed error on failure.
async fn do_login(
    state: &AppState,
    session: &Session,
    form: &LoginFormRequest,
) -> Result<(), LoginError> {
    match verify_csrf_token(session, LOGIN_ACTION, &form.csrf_token).await {
        Ok(true) => {}
        Ok(false) => return Err(LoginError::InvalidToken),
        Err(e) => {
            tracing::error!(error = %e, "failed to verify login token");
            return Err(LoginError::Internal);
        }
    }

    let user = match User::find_by_name(state.db(), &form.username).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(LoginError::InvalidCredentials),
        Err(e) => {
            tracing::error!(error = %e, "database error during login");
            return Err(LoginError::Internal);
        }
    };

    if !user.is_active() || !user.verify_password(&form.password) {
        info!(name = %form.username, "failed login attempt");
        return Err(LoginError::InvalidCredentials);
    }

    // New session id on privilege change
    session.cycle_id().await.map_err(|e| {
        tracing::error!(error = %e, "failed to cycle session id");
        LoginError::Internal
    })?;
    if let Err(e) = clear_csrf_tokens(session).await {
        warn!(error = %e, "failed to clear anonymous form tokens");
    }
    session
        .insert(SESSION_USER_ID, user.id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to insert user_id into session");
            LoginError::Internal
        })?;

    if let Err(e) = User::touch_login(state.db(), user.id).await {
        warn!(error = %e, user_id = %user.id, "failed to update login timestamp");
    }
    state.permissions().invalidate_user(user.id);

    info!(user_id = %user.id, name = %user.name, "user logged in");
    Ok(())
}

/// Logout handler.
///
/// POST /user/logout
async fn logout(session: Session) -> Response {
    let user_id: Option<uuid::Uuid> = session.get(SESSION_USER_ID).await.ok().flatten();

    if let Err(e) = session.delete().await {
        tracing::error!(error = %e, "failed to delete session");
        return (StatusCode::INTERNAL_SERVER_ERROR, Html("<h1>Error</h1>")).into_response();
    }

    if let Some(id) = user_id {
        info!(user_id = %id, "user logged out");
    }
    Redirect::to("/").into_response()
}

/// Create the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/login", get(login_form).post(login_form_submit))
        .route("/user/logout", post(logout))
}
