use dotenvy::dotenv;
use vod_timeline::error::ApplicationError;
use vod_timeline::{api, config, logger, Located as _};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = config::load()?;

    let _guard = logger::init(&config)?;
    tracing::debug!(?config, "loaded configuration");

    let app = api::create_app(&config)?;

    api::serve(config.host, app).await.inspect_err(|error| {
        tracing::error!(%error, location = %error.location(), "proxy stopped");
    })
}
