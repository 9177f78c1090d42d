use serde_json::Value;
use snafu::Snafu;

use crate::service::credential::CredentialError;
use crate::service::transport::TransportError;

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum GatewayError {
    #[snafu(display("API endpoint is required in the request body."))]
    MissingEndpoint,

    #[snafu(display("Request body is not valid JSON: {reason}"))]
    MalformedBody { reason: String },

    #[snafu(display("API endpoint `{endpoint}` is not allowed."))]
    DisallowedEndpoint { endpoint: String },

    #[snafu(display("Failed to retrieve App Access Token."))]
    Credential { source: CredentialError },

    #[snafu(display("Twitch API request failed: {status_text}"))]
    Upstream {
        status: u16,
        status_text: String,
        details: Value,
    },

    #[snafu(display("Internal Server Error."))]
    Unreachable { source: TransportError },

    #[snafu(display("Internal Server Error."))]
    UpstreamBody { source: serde_json::Error },
}

impl GatewayError {
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::MissingEndpoint
            | GatewayError::MalformedBody { .. }
            | GatewayError::DisallowedEndpoint { .. } => 400,
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::Credential { .. }
            | GatewayError::Unreachable { .. }
            | GatewayError::UpstreamBody { .. } => 500,
        }
    }

    /// Extra detail attached to the response body. Configuration and client errors carry
    /// only their message.
    pub fn details(&self) -> Option<Value> {
        match self {
            GatewayError::Upstream { details, .. } => Some(details.clone()),
            GatewayError::Unreachable { source } => Some(Value::String(source.to_string())),
            GatewayError::UpstreamBody { source } => Some(Value::String(source.to_string())),
            _ => None,
        }
    }
}
