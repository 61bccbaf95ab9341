use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{header::LINK, Client};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

pub const DEFAULT_API_PREFIX: &str = "/api/0";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Post => f.write_str("POST"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    pub link: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Issues API requests relative to the API root. Implementations return
/// `Err` for anything that is not a 2xx response.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn request(&self, method: Method, path: &str) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T> ApiTransport for Arc<T>
where
    T: ApiTransport + ?Sized,
{
    async fn request(&self, method: Method, path: &str) -> Result<ApiResponse, TransportError> {
        (**self).request(method, path).await
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub server_url: String,
    pub api_prefix: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl HttpTransportConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            auth_token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct HttpTransport {
    http: Client,
    api_root: String,
    auth_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let server_url = Url::parse(config.server_url.trim())?;
        if server_url.cannot_be_a_base() {
            return Err(TransportError::CannotBeABase(config.server_url));
        }

        let prefix = config.api_prefix.trim().trim_matches('/');
        let mut api_root = server_url.as_str().trim_end_matches('/').to_string();
        if !prefix.is_empty() {
            api_root.push('/');
            api_root.push_str(prefix);
        }

        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            api_root,
            auth_token: config.auth_token.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{path}", self.api_root))?)
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn request(&self, method: Method, path: &str) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "api request");

        let mut request = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let res = request.send().await?;
        let status = res.status().as_u16();
        let link = res
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = res.bytes().await?.to_vec();

        if !(200..300).contains(&status) {
            debug!(%method, path, status, "api request rejected");
            return Err(TransportError::status(status, &body));
        }

        Ok(ApiResponse { status, link, body })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
