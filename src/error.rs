use std::net::SocketAddr;

use snafu::{Location, Snafu};

use crate::service::transport::TransportError;
use crate::Located;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApplicationError {
    /// could not read the configuration from the environment
    ConfigLoad {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not build the outbound HTTP client
    HttpClient {
        source: TransportError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not serve the application
    WebServer {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not bind to the given address, check if it's already in use
    BindAddress {
        address: SocketAddr,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Located for ApplicationError {
    fn location(&self) -> Location {
        match self {
            ApplicationError::ConfigLoad { location, .. }
            | ApplicationError::HttpClient { location, .. }
            | ApplicationError::WebServer { location, .. }
            | ApplicationError::BindAddress { location, .. }
            | ApplicationError::InitializeLogger { location, .. } => *location,
        }
    }
}
