//! Outbound client for the insurance backend.
//!
//! Turns a tool's JSON arguments into one HTTP request for the matching
//! [`Operation`]. Every request carries the static API-key header; there are no
//! retries and no caching.

use crate::config::BackendConfig;
use crate::openapi::{HttpMethod, Operation, ParamLocation};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

/// Argument name that carries a request body verbatim.
pub const BODY_ARG: &str = "body";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(String),
    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),
    #[error("missing required parameter: {0}")]
    MissingParameter(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Decoded JSON body; `null` when empty, a string when not JSON.
    pub body: Value,
}

/// Request components derived from an operation and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParts {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let base_url = config
            .parsed_base_url()
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let mut headers = HeaderMap::new();
        let key_name = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| ClientError::Build(format!("API key header name: {e}")))?;
        let mut key_value = HeaderValue::from_str(&config.api_key)
            .map_err(|e| ClientError::Build(format!("API key value: {e}")))?;
        key_value.set_sensitive(true);
        headers.insert(key_name, key_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send one request for `op` and decode the response.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingParameter`] before anything is sent,
    /// [`ClientError::Transport`] for connection and timeout failures, and
    /// [`ClientError::Status`] for any non-2xx answer.
    pub async fn execute(
        &self,
        op: &Operation,
        args: &Map<String, Value>,
    ) -> Result<ApiResponse, ClientError> {
        let parts = build_request(&self.base_url, op, args)?;

        let mut request = self.http.request(reqwest_method(op.method), parts.url);
        for (name, value) in parts.headers {
            request = request.header(name, value);
        }
        if let Some(body) = parts.body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = decode_body(&bytes);

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Resolve the URL, headers and body for `op` from tool arguments.
///
/// Path parameters are substituted segment by segment so reserved characters
/// in values are percent-encoded. Arguments that are not parameters form the
/// JSON body when the operation takes an object body.
pub fn build_request(
    base: &Url,
    op: &Operation,
    args: &Map<String, Value>,
) -> Result<RequestParts, ClientError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(base.to_string()))?;
        segments.pop_if_empty();
        for raw in op.path.split('/').filter(|s| !s.is_empty()) {
            segments.push(&substitute_segment(raw, op, args)?);
        }
    }

    let mut pairs = Vec::new();
    for param in op.parameters_in(ParamLocation::Query) {
        match args.get(&param.name) {
            Some(Value::Array(items)) => {
                pairs.extend(items.iter().map(|v| (param.name.as_str(), scalar_text(v))))
            }
            Some(Value::Null) | None if param.required => {
                return Err(ClientError::MissingParameter(param.name.clone()))
            }
            Some(Value::Null) | None => {}
            Some(value) => pairs.push((param.name.as_str(), scalar_text(value))),
        }
    }
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    let mut headers = Vec::new();
    for param in op.parameters_in(ParamLocation::Header) {
        match args.get(&param.name) {
            Some(Value::Null) | None if param.required => {
                return Err(ClientError::MissingParameter(param.name.clone()))
            }
            Some(Value::Null) | None => {}
            Some(value) => headers.push((param.name.clone(), scalar_text(value))),
        }
    }

    Ok(RequestParts {
        url,
        headers,
        body: build_body(op, args)?,
    })
}

fn substitute_segment(
    raw: &str,
    op: &Operation,
    args: &Map<String, Value>,
) -> Result<String, ClientError> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let value = match args.get(name) {
            Some(Value::Null) | None => {
                return Err(ClientError::MissingParameter(name.to_string()));
            }
            Some(value) => scalar_text(value),
        };
        out.push_str(&rest[..start]);
        out.push_str(&value);
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);

    if out.is_empty() {
        return Err(ClientError::MissingParameter(format!(
            "{} (empty path segment in {})",
            raw, op.path
        )));
    }
    Ok(out)
}

fn build_body(op: &Operation, args: &Map<String, Value>) -> Result<Option<Value>, ClientError> {
    let Some(body) = &op.request_body else {
        return Ok(None);
    };

    let Some(shape) = body.object_shape() else {
        return match args.get(BODY_ARG) {
            Some(Value::Null) | None if body.required => {
                Err(ClientError::MissingParameter(BODY_ARG.to_string()))
            }
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(value.clone())),
        };
    };

    if !shape.properties.contains_key(BODY_ARG) {
        if let Some(value) = args.get(BODY_ARG).filter(|v| !v.is_null()) {
            return Ok(Some(value.clone()));
        }
    }

    let fields: Map<String, Value> = args
        .iter()
        .filter(|(key, _)| !op.parameters.iter().any(|p| &p.name == *key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if fields.is_empty() && !body.required {
        return Ok(None);
    }
    Ok(Some(Value::Object(fields)))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Pick the most useful message out of an error response body.
pub fn error_message(status: StatusCode, body: &Value) -> String {
    let field = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    field("error")
        .or_else(|| field("message"))
        .or_else(|| {
            body.as_str()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        })
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("API request failed: {}", status.as_u16()))
}
