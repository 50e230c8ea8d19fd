//! HTTP endpoint that hands out token requests.
//!
//! `GET` or `POST /api/createTokenRequest` returns a signed token request for
//! the configured client identity. Failures come back as a JSON error body
//! instead of an unhandled rejection.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::TOKEN_ROUTE;
use crate::error::TokenError;
use crate::token::{IssueToken, TokenParams, TokenRequest};

#[derive(Clone)]
pub struct IssuerState {
    issuer: Arc<dyn IssueToken>,
    params: Arc<TokenParams>,
}

impl IssuerState {
    pub fn new(issuer: Arc<dyn IssueToken>, params: TokenParams) -> Self {
        Self {
            issuer,
            params: Arc::new(params),
        }
    }
}

/// Error response for a failed issuance
pub struct ApiError(TokenError);

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TokenError::MissingKey(_) | TokenError::InvalidKey(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({
            "error": {
                "message": self.0.to_string(),
                "code": self.0.code(),
                "statusCode": status.as_u16(),
            }
        });
        (status, Json(body)).into_response()
    }
}

pub fn router(state: IssuerState) -> Router {
    Router::new()
        .route(TOKEN_ROUTE, get(create_token_request).post(create_token_request))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `router` on `listener` until ctrl-c.
pub async fn serve(listener: TcpListener, state: IssuerState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Token issuer listening on http://{}{}", addr, TOKEN_ROUTE);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down token issuer");
        })
        .await
}

async fn create_token_request(
    State(state): State<IssuerState>,
) -> Result<Json<TokenRequest>, ApiError> {
    match state.issuer.create_token_request(&state.params) {
        Ok(request) => {
            tracing::info!(client_id = %request.client_id, "issued token request");
            Ok(Json(request))
        }
        Err(e) => {
            tracing::error!("Token request failed: {}", e);
            Err(e.into())
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}
