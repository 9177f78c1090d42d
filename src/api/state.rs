use std::{ops::Deref, sync::Arc};

use derive_new::new;
use snafu::ResultExt;

use crate::config::Config;
use crate::error::{ApplicationError, HttpClientSnafu};
use crate::service::credential::{CredentialCache, TwitchTokenIssuer};
use crate::service::gateway::Gateway;
use crate::service::transport::ReqwestTransport;
use crate::time::SystemClock;

#[derive(Debug, Clone, new)]
pub struct App {
    pub gateway: Arc<Gateway>,
}

impl Deref for App {
    type Target = Gateway;

    fn deref(&self) -> &Self::Target {
        &self.gateway
    }
}

/// Wire the credential cache and gateway over a real HTTP client. The cache starts empty;
/// the first forwarded request issues the token.
pub fn create_app(config: &Config) -> Result<App, ApplicationError> {
    let twitch = &config.twitch;
    let transport = Arc::new(ReqwestTransport::new(twitch.request_timeout).context(HttpClientSnafu)?);

    let credentials = twitch.service_credentials();
    if credentials.is_none() {
        tracing::warn!("TWITCH_CLIENT_ID or TWITCH_CLIENT_SECRET is not set, every forwarded request will fail");
    }

    let issuer = TwitchTokenIssuer::new(transport.clone(), twitch.token_url.clone(), credentials);
    let cache = CredentialCache::new(Arc::new(issuer), Arc::new(SystemClock));

    let gateway = Gateway::new(
        Arc::new(cache),
        transport,
        twitch.helix_url.clone(),
        twitch.client_id.clone().unwrap_or_default(),
    );

    Ok(App::new(Arc::new(gateway)))
}
