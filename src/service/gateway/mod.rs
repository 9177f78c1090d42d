use std::sync::Arc;

use derive_new::new;
use secrecy::ExposeSecret as _;
use serde_json::{json, Value};
use snafu::{ensure, ResultExt};
use tracing::instrument;
use url::Url;

use crate::service::credential::CredentialCache;
use crate::service::transport::{HttpRequest, HttpTransport};

pub use error::*;

mod error;

/// Read-only Helix resources the proxy is willing to forward.
pub const ALLOWED_RESOURCES: &[&str] = &[
    "users",
    "videos",
    "streams",
    "search/channels",
    "channels/followed",
];

/// A relative Helix path with an optional query, e.g. `videos?user_id=1&first=100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn parse(text: &str) -> Result<Self> {
        let endpoint = text.trim();
        ensure!(!endpoint.is_empty(), MissingEndpointSnafu);

        let resource = endpoint.split('?').next().unwrap_or_default();
        let escapes_base = endpoint.starts_with('/')
            || endpoint.contains("://")
            || endpoint.contains("..")
            || endpoint.contains('#')
            || endpoint.contains(char::is_whitespace);

        ensure!(
            !escapes_base && ALLOWED_RESOURCES.contains(&resource),
            DisallowedEndpointSnafu { endpoint }
        );

        Ok(Self(endpoint.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Forwards a single endpoint instruction to Helix under the app access token.
#[derive(Debug, new)]
pub struct Gateway {
    credentials: Arc<CredentialCache>,
    transport: Arc<dyn HttpTransport>,
    helix_url: Url,
    client_id: String,
}

impl Gateway {
    /// Issue exactly one upstream GET for `endpoint`. Paging is left to the caller, which
    /// repeats the call with an `after` cursor.
    #[instrument(skip(self))]
    pub async fn forward(&self, endpoint: Option<&str>) -> Result<Value> {
        let endpoint = Endpoint::parse(endpoint.unwrap_or_default())?;

        let token = self.credentials.token().await.context(CredentialSnafu)?;

        let url = self
            .helix_url
            .join(endpoint.as_str())
            .map_err(|_| GatewayError::DisallowedEndpoint {
                endpoint: endpoint.as_str().to_string(),
            })?;

        let request = HttpRequest::get(url)
            .header("Client-ID", self.client_id.clone())
            .header("Authorization", format!("Bearer {}", token.expose_secret()));

        let response = self
            .transport
            .execute(request)
            .await
            .context(UnreachableSnafu)?;

        if !response.is_success() {
            let details = response.json::<Value>().unwrap_or_else(|_| json!({}));
            tracing::warn!(status = response.status, endpoint = endpoint.as_str(), ?details, "upstream request failed");

            if response.status == 401 {
                self.credentials.invalidate().await;
            }

            return UpstreamSnafu {
                status: response.status,
                status_text: response.status_text(),
                details,
            }
            .fail();
        }

        response.json().context(UpstreamBodySnafu)
    }
}
