use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    admin::{
        dto::{
            AdminLoginRequest, AdminLoginResponse, BlockResponse, DeleteResponse,
            UserActionRequest, UserRow, UsersQuery,
        },
        guard::{AdminSession, ADMIN_SESSION_KEY},
    },
    auth::password::verify_password,
    state::AppState,
    users::{self, StoreError},
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
        .route("/admin/users", get(list_users).delete(delete_user))
        .route("/admin/users/block", post(block_user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, (StatusCode, String)> {
    let admin = &state.config.admin;

    if payload.email.trim() != admin.email {
        warn!(email = %payload.email, "admin login unknown email");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let ok = verify_password(&payload.password, &admin.password_hash).map_err(|e| {
        error!(error = %e, "verify admin password failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    if !ok {
        warn!("admin login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let token = Uuid::new_v4().to_string();
    state
        .storage
        .write(ADMIN_SESSION_KEY, &token)
        .await
        .map_err(|e| {
            error!(error = %e, "store admin session failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    info!("admin logged in");
    Ok(Json(AdminLoginResponse { token }))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<StatusCode, (StatusCode, String)> {
    state.storage.remove(ADMIN_SESSION_KEY).await.map_err(|e| {
        error!(error = %e, "clear admin session failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    info!("admin logged out");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(q): Query<UsersQuery>,
) -> Result<Json<Vec<UserRow>>, (StatusCode, String)> {
    let now = OffsetDateTime::now_utc();
    let mut records = state.users.load_all().await;

    if let Some(needle) = q.search.as_deref() {
        if !needle.is_empty() {
            records = users::search(&records, needle);
        }
    }
    let rows = users::filter_by_date_bucket(&records, q.range, now)
        .into_iter()
        .map(UserRow::from)
        .collect();

    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn block_user(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(payload): Json<UserActionRequest>,
) -> Result<Json<BlockResponse>, (StatusCode, String)> {
    match state.users.toggle_blocked(&payload.email).await {
        Ok(blocked) => {
            info!(email = %payload.email, blocked, "block toggled");
            Ok(Json(BlockResponse {
                email: payload.email,
                blocked,
            }))
        }
        Err(StoreError::NotFound) => {
            warn!(email = %payload.email, "block unknown email");
            Err((StatusCode::NOT_FOUND, "User not found".into()))
        }
        Err(e) => {
            error!(error = %e, "toggle blocked failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(payload): Json<UserActionRequest>,
) -> Result<Json<DeleteResponse>, (StatusCode, String)> {
    match state.users.remove(&payload.email).await {
        Ok(removed) => {
            info!(email = %payload.email, removed, "user deleted");
            Ok(Json(DeleteResponse {
                email: payload.email,
                removed,
            }))
        }
        Err(StoreError::NotFound) => {
            warn!(email = %payload.email, "delete unknown email");
            Err((StatusCode::NOT_FOUND, "User not found".into()))
        }
        Err(e) => {
            error!(error = %e, "remove user failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{DateBucket, UserRecord};
    use time::Duration;

    async fn seed_user(state: &AppState, email: &str, created: OffsetDateTime) {
        state
            .users
            .append(UserRecord::new(email, "secret-12", created).expect("record"))
            .await
            .expect("seed user");
    }

    fn users_query(search: Option<&str>, range: DateBucket) -> Query<UsersQuery> {
        Query(UsersQuery {
            search: search.map(Into::into),
            range,
        })
    }

    #[tokio::test]
    async fn admin_login_issues_a_token_the_guard_accepts() {
        let state = AppState::fake();
        let Json(resp) = login(
            State(state.clone()),
            Json(AdminLoginRequest {
                email: "admin@test.local".into(),
                password: "admin-secret".into(),
            }),
        )
        .await
        .expect("admin login");

        let stored = state
            .storage
            .read(ADMIN_SESSION_KEY)
            .await
            .expect("read session");
        assert_eq!(stored.as_deref(), Some(resp.token.as_str()));
    }

    #[tokio::test]
    async fn admin_login_rejects_bad_credentials() {
        let state = AppState::fake();

        let (status, _) = login(
            State(state.clone()),
            Json(AdminLoginRequest {
                email: "admin@test.local".into(),
                password: "wrong".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = login(
            State(state),
            Json(AdminLoginRequest {
                email: "someone@else.local".into(),
                password: "admin-secret".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_clears_the_session() {
        let state = AppState::fake();
        state
            .storage
            .write(ADMIN_SESSION_KEY, "tok")
            .await
            .expect("seed session");

        let status = logout(State(state.clone()), AdminSession)
            .await
            .expect("logout");
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(
            state
                .storage
                .read(ADMIN_SESSION_KEY)
                .await
                .expect("read session"),
            None
        );
    }

    #[tokio::test]
    async fn list_users_applies_search_then_range() {
        let state = AppState::fake();
        let now = OffsetDateTime::now_utc();
        seed_user(&state, "Alice@x.com", now - Duration::hours(1)).await;
        seed_user(&state, "bob@y.com", now - Duration::days(3)).await;
        seed_user(&state, "carol@x.com", now - Duration::days(40)).await;

        let Json(rows) = list_users(
            State(state.clone()),
            AdminSession,
            users_query(None, DateBucket::All),
        )
        .await
        .expect("list all");
        assert_eq!(rows.len(), 3);

        let Json(rows) = list_users(
            State(state.clone()),
            AdminSession,
            users_query(Some("alice"), DateBucket::All),
        )
        .await
        .expect("search is case-insensitive");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "Alice@x.com");

        let Json(rows) = list_users(
            State(state.clone()),
            AdminSession,
            users_query(None, DateBucket::Week),
        )
        .await
        .expect("list week");
        assert_eq!(rows.len(), 2);

        let Json(rows) = list_users(
            State(state),
            AdminSession,
            users_query(Some("x.com"), DateBucket::Month),
        )
        .await
        .expect("search and range compose");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].email, "Alice@x.com");
    }

    #[tokio::test]
    async fn block_and_delete_round_trip() {
        let state = AppState::fake();
        let now = OffsetDateTime::now_utc();
        seed_user(&state, "a@x.com", now).await;

        let Json(resp) = block_user(
            State(state.clone()),
            AdminSession,
            Json(UserActionRequest {
                email: "a@x.com".into(),
            }),
        )
        .await
        .expect("block");
        assert!(resp.blocked);

        let Json(resp) = delete_user(
            State(state.clone()),
            AdminSession,
            Json(UserActionRequest {
                email: "a@x.com".into(),
            }),
        )
        .await
        .expect("delete");
        assert_eq!(resp.removed, 1);

        let (status, _) = delete_user(
            State(state),
            AdminSession,
            Json(UserActionRequest {
                email: "a@x.com".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
