use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use derivative::Derivative;
use secrecy::ExposeSecret as _;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use snafu::{ensure, ResultExt};
use tracing::instrument;
use url::Url;

use crate::model::Page;
use crate::service::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::timeline::auth::UserToken;

pub use error::*;

mod error;

/// How requests reach Helix. Chosen once per session.
#[derive(Derivative)]
#[derivative(Debug)]
pub enum Mode {
    /// Direct calls under the signed-in user's token.
    Authenticated {
        helix_url: Url,
        client_id: String,
        token: UserToken,
    },
    /// Guest mode: every call goes through the proxy, which holds the app credential.
    Proxied { proxy_url: Url },
}

/// Error body the proxy answers with on failure.
#[derive(Deserialize)]
struct ProxyError {
    message: String,
}

#[derive(Debug)]
pub struct RemoteClient {
    transport: Arc<dyn HttpTransport>,
    mode: Mode,
    revoked: AtomicBool,
}

impl RemoteClient {
    pub fn new(transport: Arc<dyn HttpTransport>, mode: Mode) -> Self {
        Self {
            transport,
            mode,
            revoked: AtomicBool::new(false),
        }
    }

    pub fn is_proxied(&self) -> bool {
        matches!(self.mode, Mode::Proxied { .. })
    }

    /// Fetch `endpoint` and return its records in arrival order. With `paginate`, pages are
    /// requested until the upstream stops returning a cursor; otherwise only the first page
    /// is read. Any failure abandons the whole aggregation.
    #[instrument(skip(self))]
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        paginate: bool,
    ) -> Result<Vec<T>> {
        let mut records = Vec::new();
        let mut page: Page<T> = self.fetch_page(endpoint).await?;
        let mut pages = 1;

        loop {
            let cursor = page.cursor().map(str::to_owned);
            records.append(&mut page.data);

            match cursor {
                Some(cursor) if paginate => {
                    page = self.fetch_page(&with_cursor(endpoint, &cursor)).await?;
                    pages += 1;
                }
                _ => break,
            }
        }

        tracing::debug!(endpoint, pages, records = records.len(), "fetched records");
        Ok(records)
    }

    async fn fetch_page<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Page<T>> {
        let response = match &self.mode {
            Mode::Authenticated {
                helix_url,
                client_id,
                token,
            } => {
                ensure!(!self.revoked.load(Ordering::SeqCst), LoginRequiredSnafu);

                let url = helix_url
                    .join(endpoint)
                    .context(InvalidEndpointSnafu { endpoint })?;
                let request = HttpRequest::get(url)
                    .header("Client-Id", client_id.clone())
                    .header("Authorization", format!("Bearer {}", token.0.expose_secret()));

                let response = self.send(endpoint, request).await?;
                if response.status == 401 {
                    tracing::warn!(endpoint, "user access token was rejected");
                    self.revoked.store(true, Ordering::SeqCst);
                    return LoginRequiredSnafu.fail();
                }
                response
            }
            Mode::Proxied { proxy_url } => {
                let request = HttpRequest::post(proxy_url.clone()).json(json!({ "endpoint": endpoint }));
                self.send(endpoint, request).await?
            }
        };

        if !response.is_success() {
            let message = response.json::<ProxyError>().ok().map(|body| body.message);
            return StatusSnafu {
                endpoint,
                status: response.status,
                message,
            }
            .fail();
        }

        response.json().context(DecodeSnafu { endpoint })
    }

    async fn send(&self, endpoint: &str, request: HttpRequest) -> Result<HttpResponse> {
        self.transport
            .execute(request)
            .await
            .context(TransportSnafu { endpoint })
    }
}

/// Append the continuation cursor as the `after` query parameter.
fn with_cursor(endpoint: &str, cursor: &str) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    let cursor: String = url::form_urlencoded::byte_serialize(cursor.as_bytes()).collect();
    format!("{endpoint}{separator}after={cursor}")
}
