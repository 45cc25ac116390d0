use super::VerifyError;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-API-Key";

/// Status and decoded body of one backend answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    /// `None` when the body is empty or not JSON.
    pub body: Option<Value>,
}

impl Response {
    pub fn is(&self, status: u16) -> bool {
        self.status == status
    }

    /// The `id` field of an object body; numeric ids are stringified.
    pub fn id(&self) -> Option<String> {
        match self.body.as_ref()?.get("id")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.as_ref()?.get(key)?.as_str()
    }

    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.body.as_ref()?.get(key)?.as_f64()
    }

    /// Length of an array body.
    pub fn count(&self) -> Option<usize> {
        self.body.as_ref()?.as_array().map(Vec::len)
    }
}

/// Client for the backend under test. One request at a time, no retries.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl BackendClient {
    /// Client without a request timeout; a slow backend is waited for.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, VerifyError> {
        Self::build(base_url, api_key, None)
    }

    /// Client that gives up on any request taking longer than `timeout`.
    pub fn with_timeout(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, VerifyError> {
        Self::build(base_url, api_key, Some(timeout))
    }

    fn build(base_url: &str, api_key: &str, timeout: Option<Duration>) -> Result<Self, VerifyError> {
        let base_url = base_url.trim_end_matches('/');
        match url::Url::parse(base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(VerifyError::InvalidBaseUrl {
                    url: base_url.to_string(),
                    reason: format!("unsupported scheme `{}`", url.scheme()),
                })
            }
            Err(e) => {
                return Err(VerifyError::InvalidBaseUrl {
                    url: base_url.to_string(),
                    reason: e.to_string(),
                })
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> Result<Response, VerifyError> {
        self.send(Method::GET, path, &self.api_key, None).await
    }

    /// GET with a different API key than the run's.
    pub async fn get_with_key(&self, path: &str, api_key: &str) -> Result<Response, VerifyError> {
        self.send(Method::GET, path, api_key, None).await
    }

    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<Response, VerifyError> {
        self.send(Method::POST, path, &self.api_key, body).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Response, VerifyError> {
        self.send(Method::PUT, path, &self.api_key, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, VerifyError> {
        self.send(Method::DELETE, path, &self.api_key, None).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        api_key: &str,
        body: Option<&Value>,
    ) -> Result<Response, VerifyError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "request");

        let mut request = self.http.request(method, &url).header(API_KEY_HEADER, api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(Response {
            status,
            body: serde_json::from_slice(&bytes).ok(),
        })
    }

    fn classify(&self, err: reqwest::Error) -> VerifyError {
        if err.is_connect() {
            VerifyError::Unreachable {
                base_url: self.base_url.clone(),
            }
        } else {
            VerifyError::Request(err)
        }
    }
}
