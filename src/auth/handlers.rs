use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::dto::{
        ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser, ResetPasswordRequest,
        SignupRequest,
    },
    state::AppState,
    users::{self, StoreError, UserRecord},
};

const MIN_PASSWORD_LEN: usize = 8;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_new_password(password: &str, confirm: &str) -> Result<(), (StatusCode, String)> {
    if password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }
    if password != confirm {
        warn!("password confirmation mismatch");
        return Err((StatusCode::BAD_REQUEST, "Passwords do not match".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    check_new_password(&payload.password, &payload.confirm_password)?;

    let now = OffsetDateTime::now_utc();
    let record = UserRecord::new(payload.email.as_str(), payload.password.as_str(), now)
        .map_err(|e| {
            error!(error = %e, "build user record failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    let timestamp = record.timestamp.clone();

    match state.users.append(record).await {
        Ok(()) => {
            info!(email = %payload.email, "user signed up");
            Ok(Json(PublicUser {
                email: payload.email,
                timestamp,
            }))
        }
        Err(StoreError::DuplicateEmail) => {
            warn!(email = %payload.email, "email already registered");
            Err((StatusCode::CONFLICT, "Email already registered".into()))
        }
        Err(e) => {
            error!(error = %e, "append user failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_string();

    let records = state.users.load_all().await;
    let user = match users::find_by_email(&records, &payload.email) {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
    };

    if user.password != payload.password {
        warn!(email = %payload.email, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    if user.blocked {
        warn!(email = %payload.email, "login on blocked account");
        return Err((StatusCode::FORBIDDEN, "Account blocked".into()));
    }

    info!(email = %user.email, "user logged in");
    Ok(Json(PublicUser {
        email: user.email.clone(),
        timestamp: user.timestamp.clone(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let records = state.users.load_all().await;
    if users::find_by_email(&records, &payload.email).is_none() {
        warn!(email = %payload.email, "forgot-password for unknown email");
        return Err((StatusCode::NOT_FOUND, "No account with that email".into()));
    }
    Ok(Json(MessageResponse {
        message: "Email verified".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    check_new_password(&payload.password, &payload.confirm_password)?;

    match state
        .users
        .update_password(&payload.email, &payload.password)
        .await
    {
        Ok(()) => {
            info!(email = %payload.email, "password reset");
            Ok(Json(MessageResponse {
                message: "Password updated".into(),
            }))
        }
        Err(StoreError::NotFound) => {
            warn!(email = %payload.email, "reset for unknown email");
            Err((StatusCode::NOT_FOUND, "No account with that email".into()))
        }
        Err(e) => {
            error!(error = %e, "update password failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
