use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::{App, ErrorBody};
use crate::service::gateway::GatewayError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardRequest {
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[instrument(skip_all)]
pub async fn forward(
    State(app): State<App>,
    payload: Result<Json<ForwardRequest>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let Json(request) = payload.map_err(|rejection| GatewayError::MalformedBody {
        reason: rejection.body_text(),
    })?;

    tracing::debug!(endpoint = ?request.endpoint, "forwarding request");
    let body = app.forward(request.endpoint.as_deref()).await?;

    Ok(Json(body))
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(ErrorBody::new("Method Not Allowed".to_string())),
    )
}
