use snafu::Snafu;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransportError {
    #[snafu(display("could not build the HTTP client: {source}"))]
    Build { source: reqwest::Error },

    #[snafu(display("request to `{url}` failed: {source}"))]
    Send {
        url: String,
        #[snafu(source(from(reqwest::Error, Box::new)))]
        source: BoxedError,
    },

    #[snafu(display("could not read the response from `{url}`: {source}"))]
    ReadBody { url: String, source: reqwest::Error },
}
