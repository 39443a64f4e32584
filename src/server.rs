//! HTTP facade over [QueryClient].

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;

use crate::error::QueryError;
use crate::players::QueryClient;

#[derive(Clone)]
pub struct AppState {
    pub client: QueryClient,
}

#[derive(Debug, Deserialize)]
pub struct PlayersQuery {
    /// Target as `IP:PORT`.
    pub ip: Option<String>,
}

pub enum ApiError {
    MissingTarget,
    Query(QueryError),
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::Query(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MissingTarget => (
                StatusCode::BAD_REQUEST,
                "missing ?ip=IP:PORT parameter".to_string(),
            ),
            ApiError::Query(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Query(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("query error: {err}"),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/players", get(get_players))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

async fn get_players(
    State(state): State<AppState>,
    Query(params): Query<PlayersQuery>,
) -> Result<Response, ApiError> {
    let host: String = params
        .ip
        .filter(|ip| !ip.is_empty())
        .ok_or(ApiError::MissingTarget)?;

    match state.client.query_players(&host).await {
        Ok(players) => {
            info!("{host}: {} players", players.len());
            Ok(Json(players).into_response())
        }
        Err(err) => {
            warn!("{host}: {err}");
            Err(err.into())
        }
    }
}
