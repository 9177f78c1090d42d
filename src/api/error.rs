use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use derive_new::new;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::service::gateway::GatewayError;

/// JSON body of every non-success response: `{message, details?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct ErrorBody {
    pub message: String,
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self {
            GatewayError::Credential { source } => {
                tracing::error!(error = %source, "proxy is misconfigured or cannot obtain a token")
            }
            error if status.is_server_error() => tracing::error!(error = ?error, "request failed"),
            error => tracing::info!(%status, %error, "request rejected"),
        }

        let body = ErrorBody {
            message: self.to_string(),
            details: self.details(),
        };

        (status, Json(body)).into_response()
    }
}
