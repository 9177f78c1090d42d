use std::time::Duration;

use async_trait::async_trait;
use derivative::Derivative;
use derive_new::new;
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use url::Url;

pub use error::*;

mod error;

#[cfg(test)]
pub mod fake;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// An outbound request. Header values may carry credentials, so requests are never logged
/// with their headers.
#[derive(Clone, PartialEq, Derivative, new)]
#[derivative(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    #[new(default)]
    #[derivative(Debug = "ignore")]
    pub headers: Vec<(&'static str, String)>,
    #[new(default)]
    #[derivative(Debug = "ignore")]
    pub body: Option<Body>,
}

impl HttpRequest {
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: Url) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(Body::Json(body));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(Body::Form(fields));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Canonical reason phrase of the status, e.g. `Not Found`.
    pub fn status_text(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown Status")
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ReqwestTransport {
    #[derivative(Debug = "ignore")]
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context(BuildSnafu)?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let target = format!("{}{}", url.origin().ascii_serialization(), url.path());
        tracing::debug!(?method, url = %target, timeout = ?self.timeout, "sending request");

        let mut builder = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        builder = match body {
            Some(Body::Json(value)) => builder.json(&value),
            Some(Body::Form(fields)) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&fields)
                    .finish();
                builder
                    .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(encoded)
            }
            None => builder,
        };

        let response = builder.send().await.context(SendSnafu { url: &target })?;
        let status = response.status().as_u16();
        let body = response.bytes().await.context(ReadBodySnafu { url: &target })?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
