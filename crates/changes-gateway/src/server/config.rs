//! Subscription control over HTTP
//!
//! `GET|POST /changes/config?id=&command=&value=` updates the subscriptions
//! of a session, creating it if the events socket has not connected yet.

use crate::protocol::ChangesCommand;
use crate::server::GatewayState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use changes_common::{AppError, ErrorResponse};
use serde::{Deserialize, Serialize};

/// Query string of the configuration endpoint
#[derive(Debug, Deserialize)]
pub struct ConfigQuery {
    pub id: Option<String>,
    pub command: Option<String>,
    pub value: Option<String>,
}

/// Connection statistics
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub connections: usize,
}

/// HTTP wrapper for `AppError`
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, "Request rejected");
        }

        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// Apply one subscription command
pub async fn config_handler(
    State(state): State<GatewayState>,
    Query(query): Query<ConfigQuery>,
) -> Result<StatusCode, ApiError> {
    let id = query
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidInput("id is required".to_string()))?;
    let command = query
        .command
        .as_deref()
        .ok_or_else(|| AppError::InvalidInput("command is required".to_string()))?;

    let command = ChangesCommand::parse(command, query.value.as_deref())
        .map_err(AppError::invalid_command)?;

    let session = state.registry().session_for(id);
    command.apply(&session);

    Ok(StatusCode::NO_CONTENT)
}

/// Live session count
pub async fn stats_handler(State(state): State<GatewayState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        connections: state.registry().connection_count(),
    })
}
