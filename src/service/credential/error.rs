use snafu::Snafu;

use crate::service::transport::TransportError;

pub type Result<T, E = CredentialError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum CredentialError {
    #[snafu(display("TWITCH_CLIENT_ID or TWITCH_CLIENT_SECRET is not set"))]
    MissingCredentials,

    #[snafu(display("Failed to reach the token endpoint: {source}"))]
    TokenRequest { source: TransportError },

    #[snafu(display("Token endpoint refused to issue a token: {status} {reason}"))]
    TokenRejected { status: u16, reason: String },

    #[snafu(display("Failed to parse the token response: {source}"))]
    TokenBody { source: serde_json::Error },

    #[snafu(display("Token endpoint returned an unusable lifetime of {expires_in} seconds"))]
    TokenLifetime { expires_in: i64 },
}
