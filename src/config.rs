use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use derivative::Derivative;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use snafu::ResultExt;
use url::Url;

use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::service::credential::ServiceCredentials;

pub fn load() -> Result<Config, ApplicationError> {
    envy::from_env::<Config>().context(ConfigLoadSnafu)
}

#[derive(Clone, Deserialize, Derivative)]
#[derivative(Debug)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(flatten)]
    pub twitch: TwitchConfig,
}

#[derive(Clone, Deserialize, Derivative)]
#[derivative(Debug)]
pub struct TwitchConfig {
    #[serde(rename = "twitch_client_id", default)]
    pub client_id: Option<String>,
    #[serde(rename = "twitch_client_secret", default)]
    #[derivative(Debug = "ignore")]
    pub client_secret: Option<String>,
    #[serde(default = "default_helix_url")]
    pub helix_url: Url,
    #[serde(default = "default_token_url")]
    pub token_url: Url,
    /// Upper bound for every outbound call, e.g. `10s` or `1m 30s`.
    #[serde(default = "default_timeout", deserialize_with = "human_duration")]
    pub request_timeout: Duration,
}

impl TwitchConfig {
    /// Both halves of the service credential, or nothing. An unset or blank variable counts
    /// as missing.
    pub fn service_credentials(&self) -> Option<ServiceCredentials> {
        let present = |value: &Option<String>| value.clone().filter(|v| !v.trim().is_empty());

        let client_id = present(&self.client_id)?;
        let client_secret = present(&self.client_secret)?;

        Some(ServiceCredentials::new(
            client_id,
            Arc::new(SecretString::new(client_secret)),
        ))
    }
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            helix_url: default_helix_url(),
            token_url: default_token_url(),
            request_timeout: default_timeout(),
        }
    }
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_helix_url() -> Url {
    Url::parse("https://api.twitch.tv/helix/").expect("static url is valid")
}

fn default_token_url() -> Url {
    Url::parse("https://id.twitch.tv/oauth2/token").expect("static url is valid")
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn human_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()));
        envy::from_iter(vars).unwrap()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = from_pairs(&[]);
        assert_eq!(config.host, default_host());
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.twitch.helix_url.as_str(), "https://api.twitch.tv/helix/");
        assert_eq!(config.twitch.request_timeout, Duration::from_secs(10));
        assert!(config.twitch.service_credentials().is_none());
    }

    #[test]
    fn reads_credentials_and_timeout() {
        let config = from_pairs(&[
            ("HOST_ADDRESS", "0.0.0.0:8080"),
            ("TWITCH_CLIENT_ID", "client"),
            ("TWITCH_CLIENT_SECRET", "shh"),
            ("REQUEST_TIMEOUT", "1m 30s"),
        ]);

        assert_eq!(config.host.port(), 8080);
        assert_eq!(config.twitch.request_timeout, Duration::from_secs(90));

        let credentials = config.twitch.service_credentials().unwrap();
        assert_eq!(credentials.client_id, "client");
        assert!(!format!("{config:?}").contains("shh"));
    }

    #[test]
    fn blank_secret_counts_as_missing() {
        let config = from_pairs(&[("TWITCH_CLIENT_ID", "client"), ("TWITCH_CLIENT_SECRET", " ")]);
        assert!(config.twitch.service_credentials().is_none());
    }
}
