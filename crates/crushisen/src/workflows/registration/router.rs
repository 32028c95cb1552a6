use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ProfileSubmission, UserId};
use super::repository::{BlobStore, RepositoryError, UserRepository};
use super::service::{AuthenticationError, RegistrationService};
use crate::error::AppError;

/// Credentials posted to the sign-in endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    /// Email or pseudo.
    pub identifier: String,
    pub password: String,
}

/// Router builder exposing account creation, lookup and sign-in.
pub fn registration_router<R, B>(service: Arc<RegistrationService<R, B>>) -> Router
where
    R: UserRepository + 'static,
    B: BlobStore + 'static,
{
    Router::new()
        .route("/api/v1/accounts", post(register_handler::<R, B>))
        .route("/api/v1/accounts/:user_id", get(account_handler::<R, B>))
        .route("/api/v1/sessions", post(sign_in_handler::<R, B>))
        .with_state(service)
}

pub(crate) async fn register_handler<R, B>(
    State(service): State<Arc<RegistrationService<R, B>>>,
    axum::Json(submission): axum::Json<ProfileSubmission>,
) -> Response
where
    R: UserRepository + 'static,
    B: BlobStore + 'static,
{
    match service.register(submission).await {
        // The photo task keeps running after the handle is dropped.
        Ok(registration) => {
            (StatusCode::CREATED, axum::Json(registration.receipt)).into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

pub(crate) async fn account_handler<R, B>(
    State(service): State<Arc<RegistrationService<R, B>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: UserRepository + 'static,
    B: BlobStore + 'static,
{
    let id = UserId(user_id);
    match service.get(&id).await {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(RepositoryError::NotFound) => {
            let payload = json!({
                "user_id": id.0,
                "error": "user not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn sign_in_handler<R, B>(
    State(service): State<Arc<RegistrationService<R, B>>>,
    axum::Json(request): axum::Json<SignInRequest>,
) -> Response
where
    R: UserRepository + 'static,
    B: BlobStore + 'static,
{
    match service
        .authenticate(&request.identifier, &request.password)
        .await
    {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(AuthenticationError::InvalidCredentials) => {
            let payload = json!({
                "error": AuthenticationError::InvalidCredentials.to_string(),
            });
            (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
