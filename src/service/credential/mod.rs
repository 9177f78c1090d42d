use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use derivative::Derivative;
use derive_new::new;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use snafu::{ensure, OptionExt as _, ResultExt};
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use crate::service::transport::{HttpRequest, HttpTransport};
use crate::time::{Clock, Timestamp};

pub use error::*;

mod error;

/// Tokens are treated as expired this long before the issuer says they are, so a token
/// handed out never lapses while the forwarded request is still in flight.
pub const SAFETY_MARGIN_SECONDS: i64 = 60;

#[derive(Derivative, new)]
#[derivative(Debug)]
pub struct IssuedToken {
    #[derivative(Debug = "ignore")]
    pub access_token: SecretString,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

#[async_trait]
pub trait TokenIssuer: Send + Sync + std::fmt::Debug {
    async fn issue(&self) -> Result<IssuedToken>;
}

#[derive(Clone, Derivative, new)]
#[derivative(Debug)]
pub struct ServiceCredentials {
    pub client_id: String,
    #[derivative(Debug = "ignore")]
    pub client_secret: Arc<SecretString>,
}

/// Issues app access tokens through the OAuth client-credentials grant.
#[derive(Debug, Clone, new)]
pub struct TwitchTokenIssuer {
    transport: Arc<dyn HttpTransport>,
    token_url: Url,
    credentials: Option<ServiceCredentials>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[async_trait]
impl TokenIssuer for TwitchTokenIssuer {
    #[instrument(skip(self))]
    async fn issue(&self) -> Result<IssuedToken> {
        let credentials = self.credentials.as_ref().context(MissingCredentialsSnafu)?;

        let form = vec![
            ("client_id".to_string(), credentials.client_id.clone()),
            (
                "client_secret".to_string(),
                credentials.client_secret.expose_secret().clone(),
            ),
            ("grant_type".to_string(), "client_credentials".to_string()),
        ];

        let request = HttpRequest::post(self.token_url.clone()).form(form);
        let response = self
            .transport
            .execute(request)
            .await
            .context(TokenRequestSnafu)?;

        ensure!(
            response.is_success(),
            TokenRejectedSnafu {
                status: response.status,
                reason: response.status_text(),
            }
        );

        let TokenResponse {
            access_token,
            expires_in,
        } = response.json().context(TokenBodySnafu)?;

        tracing::info!(expires_in, "issued a new app access token");
        Ok(IssuedToken::new(SecretString::new(access_token), expires_in))
    }
}

struct Credential {
    token: SecretString,
    expires_at: Timestamp,
}

/// Process-wide cache of the single app access token.
///
/// The token is refreshed lazily: the first caller after expiry pays for the issuance and
/// the lock is held across it, so concurrent callers wait for that one refresh instead of
/// issuing their own. A failed issuance leaves the cache empty so the next request retries.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct CredentialCache {
    issuer: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    #[derivative(Debug = "ignore")]
    cached: Mutex<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(issuer: Arc<dyn TokenIssuer>, clock: Arc<dyn Clock>) -> Self {
        Self {
            issuer,
            clock,
            cached: Mutex::new(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn token(&self) -> Result<SecretString> {
        let mut cached = self.cached.lock().await;

        if let Some(credential) = cached.as_ref() {
            if self.clock.now() < credential.expires_at {
                return Ok(SecretString::new(credential.token.expose_secret().clone()));
            }
            tracing::debug!(expired_at = %credential.expires_at, "cached app access token expired");
        }

        let issued = self.issuer.issue().await.and_then(|issued| {
            let expires_at = self.expiry(issued.expires_in)?;
            Ok((issued, expires_at))
        });

        match issued {
            Ok((issued, expires_at)) => {
                let token = SecretString::new(issued.access_token.expose_secret().clone());

                *cached = Some(Credential {
                    token: issued.access_token,
                    expires_at,
                });

                Ok(token)
            }
            Err(error) => {
                tracing::error!(%error, "could not obtain an app access token");
                *cached = None;
                Err(error)
            }
        }
    }

    /// When a token issued now with a lifetime of `expires_in` seconds stops being served.
    fn expiry(&self, expires_in: i64) -> Result<Timestamp> {
        expires_in
            .checked_sub(SAFETY_MARGIN_SECONDS)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .context(TokenLifetimeSnafu { expires_in })
    }

    pub async fn invalidate(&self) {
        tracing::info!("dropping cached app access token");
        *self.cached.lock().await = None;
    }
}
