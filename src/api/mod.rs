use std::net::SocketAddr;

use axum::http::{header, Method};
use axum::routing::post;
use axum::Router;
use snafu::ResultExt;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ApplicationError, BindAddressSnafu, WebServerSnafu};

mod error;
mod routes;
mod state;

pub use error::*;
pub use routes::ForwardRequest;
pub use state::*;

/// The single endpoint the browser talks to in guest mode.
pub const FORWARD_PATH: &str = "/api/twitch";

pub fn create_router(app: App) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            FORWARD_PATH,
            post(routes::forward)
                .options(routes::preflight)
                .fallback(routes::method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app)
}

pub async fn serve(address: SocketAddr, app: App) -> Result<(), ApplicationError> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .context(BindAddressSnafu { address })?;

    tracing::info!(%address, path = FORWARD_PATH, "proxy is listening");

    axum::serve(listener, create_router(app))
        .await
        .context(WebServerSnafu)
}
