use snafu::Snafu;

use crate::service::transport::TransportError;

pub type Result<T, E = FetchError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum FetchError {
    #[snafu(display("the user access token is no longer valid, sign in again"))]
    LoginRequired,

    #[snafu(display("`{endpoint}` is not a valid endpoint: {source}"))]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },

    #[snafu(display("request for `{endpoint}` failed with status {status}"))]
    Status {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },

    #[snafu(display("request for `{endpoint}` did not complete: {source}"))]
    Transport {
        endpoint: String,
        source: TransportError,
    },

    #[snafu(display("unexpected response for `{endpoint}`: {source}"))]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn is_login_required(&self) -> bool {
        matches!(self, FetchError::LoginRequired)
    }
}
