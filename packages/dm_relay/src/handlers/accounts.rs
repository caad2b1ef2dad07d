use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use crate::AppState;
use crate::error::{ApiError, require};
use crate::models::{PublicUser, User};
use crate::repository::{hash_password, verify_password};

#[derive(Deserialize)]
pub struct RegisterRequest {
    username: Option<String>,
    password: Option<String>,
    avatar: Option<String>,
    email: Option<String>,
}

pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = require(req.username.as_deref(), "username")?;
    let password = require(req.password.as_deref(), "password")?;
    let avatar = require(req.avatar.as_deref(), "avatar")?;
    let email = require(req.email.as_deref(), "email")?;

    let existing = state
        .repository
        .get_user_by_username(username)
        .await
        .map_err(|e| ApiError::internal("Failed to look up user", e))?;
    if existing.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    let password_hash =
        hash_password(password).map_err(|e| ApiError::internal("Failed to create user", e))?;
    let now = chrono::Utc::now().timestamp();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: email.to_string(),
        avatar: avatar.to_string(),
        password_hash,
        created_at: now,
        updated_at: now,
    };
    let created = state
        .repository
        .create_user(&user)
        .await
        .map_err(|e| ApiError::internal("Failed to create user", e))?;
    if !created {
        return Err(ApiError::UsernameTaken);
    }

    info!(user = %user.id, username = %user.username, "Account registered");
    Ok(Json(serde_json::json!({ "message": "create success" })))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = require(req.username.as_deref(), "username")?;
    let password = require(req.password.as_deref(), "password")?;

    let user = state
        .repository
        .get_user_by_username(username)
        .await
        .map_err(|e| ApiError::internal("Failed to look up user", e))?
        .ok_or(ApiError::UserNotFound)?;

    let ok = verify_password(password, &user.password_hash)
        .map_err(|e| ApiError::internal("Failed to verify password", e))?;
    if !ok {
        return Err(ApiError::WrongPassword);
    }

    Ok(Json(serde_json::json!({ "user": PublicUser::from(user) })))
}

/// Everyone the caller could start a conversation with.
pub async fn list_contacts_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = require(Some(id.as_str()), "params")?;
    let users = state
        .repository
        .list_contacts(id)
        .await
        .map_err(|e| ApiError::internal("Failed to list users", e))?;
    Ok(Json(serde_json::json!({ "users": users })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::post,
    };
    use tower::ServiceExt;

    fn test_router(state: AppState) -> Router {
        Router::new()
            .route("/register", post(register_handler))
            .route("/login", post(login_handler))
            .route("/get-all-user/{id}", post(list_contacts_handler))
            .with_state(state)
    }

    async fn post_json(
        app: &Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn alice() -> serde_json::Value {
        serde_json::json!({
            "username": "alice",
            "password": "hunter2",
            "avatar": "alice.png",
            "email": "alice@example.com"
        })
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let state = crate::test_helpers::test_app_state().await;
        let app = test_router(state);

        let (status, body) = post_json(&app, "/register", alice()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "create success");

        let (status, body) = post_json(
            &app,
            "/login",
            serde_json::json!({ "username": "alice", "password": "hunter2" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "alice");
        assert_eq!(body["user"]["avatar"], "alice.png");
        assert!(body["user"]["_id"].is_string());
        assert!(body["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_missing_fields() {
        let state = crate::test_helpers::test_app_state().await;
        let app = test_router(state);

        let (status, body) = post_json(&app, "/register", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "username is required !");

        let mut no_email = alice();
        no_email.as_object_mut().unwrap().remove("email");
        let (status, body) = post_json(&app, "/register", no_email).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "email is required !");
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let state = crate::test_helpers::test_app_state().await;
        let app = test_router(state);

        post_json(&app, "/register", alice()).await;
        let (status, body) = post_json(&app, "/register", alice()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "username taken !");
    }

    #[tokio::test]
    async fn test_concurrent_registrations_of_same_username() {
        let state = crate::test_helpers::test_app_state().await;
        let app = test_router(state.clone());

        let (first, second) = tokio::join!(
            post_json(&app, "/register", alice()),
            post_json(&app, "/register", alice())
        );
        let mut statuses = vec![first.0, second.0];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::BAD_REQUEST]);

        let loser = if first.0 == StatusCode::OK { second.1 } else { first.1 };
        assert_eq!(loser["message"], "username taken !");
        assert_eq!(state.repository.list_contacts("").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let state = crate::test_helpers::test_app_state().await;
        let app = test_router(state);
        post_json(&app, "/register", alice()).await;

        let (status, body) = post_json(
            &app,
            "/login",
            serde_json::json!({ "username": "bob", "password": "x" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "user not found !");

        let (status, body) = post_json(
            &app,
            "/login",
            serde_json::json!({ "username": "alice", "password": "wrong" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "password not correct !");

        let (_, body) =
            post_json(&app, "/login", serde_json::json!({ "username": "alice" })).await;
        assert_eq!(body["message"], "password is required !");
    }

    #[tokio::test]
    async fn test_list_contacts_excludes_caller() {
        let state = crate::test_helpers::test_app_state().await;
        let app = test_router(state.clone());
        post_json(&app, "/register", alice()).await;
        post_json(
            &app,
            "/register",
            serde_json::json!({
                "username": "bob", "password": "pw", "avatar": "bob.png", "email": "bob@example.com"
            }),
        )
        .await;

        let alice_id = state
            .repository
            .get_user_by_username("alice")
            .await
            .unwrap()
            .unwrap()
            .id;

        let (status, body) =
            post_json(&app, &format!("/get-all-user/{alice_id}"), serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let users = body["users"].as_array().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["username"], "bob");
        assert_eq!(users[0]["avatar"], "bob.png");
        assert!(users[0]["_id"].is_string());
        assert!(users[0].get("email").is_none());
    }
}
