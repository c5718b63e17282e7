//! API Request Layer
//!
//! Builds requests against the configured base URL, attaches the operator's
//! bearer token, and unwraps the `{code, timestamp, msg, data}` envelope into
//! either typed data or a single [`ApiError`].

use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::ApiError;
use super::types::ApiEnvelope;
use crate::config::Config;
use crate::token::TokenStore;

/// Per-call options
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Attach the stored bearer token (default: true)
    pub auth: bool,
    /// JSON body; `None` and `Value::Null` both mean "no body"
    pub body: Option<Value>,
    /// Aborts the call when cancelled
    pub cancel: Option<CancellationToken>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            auth: true,
            body: None,
            cancel: None,
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Send without the bearer token
    pub fn public(mut self) -> Self {
        self.auth = false;
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn cancel_on(mut self, token: Option<CancellationToken>) -> Self {
        self.cancel = token;
        self
    }
}

/// Typed client for the Stellar admin API
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &Config, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let base_url = resolve_base(&config.api_base, &config.origin);

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport {
                message: e.to_string(),
                url: base_url.clone(),
            })?;

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Absolute base every path is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Full URL for an API path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Issue one request and unwrap its envelope
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let RequestOptions {
            method,
            auth,
            body,
            cancel,
        } = options;

        let url = self.build_url(path);
        let call = self.execute(method.clone(), &url, auth, body);

        let result = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ApiError::Cancelled),
                    result = call => result,
                }
            }
            None => call.await,
        };

        match &result {
            Err(ApiError::Cancelled) => debug!("{} {} cancelled", method, url),
            Err(e) => warn!("{} {} failed: {}", method, url, e),
            Ok(_) => {}
        }

        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        auth: bool,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut builder = self.http.request(method.clone(), url);

        if let Some(body) = body.filter(|b| !b.is_null()) {
            builder = builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(&body)?);
        }

        if auth {
            let token = self.tokens.get_token();
            if !token.is_empty() {
                builder = builder.bearer_auth(token);
            }
        }

        debug!("Calling Stellar API: {} {}", method, url);

        let transport = |e: reqwest::Error| ApiError::Transport {
            message: e.to_string(),
            url: url.to_string(),
        };

        let response = builder.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let raw = response.text().await.map_err(transport)?;

        decode_envelope(status, &raw)
    }
}

/// Unwrap a response body into typed data.
///
/// A body that is not JSON yields [`ApiError::Http`] for non-2xx statuses and
/// [`ApiError::NonJson`] otherwise. A non-2xx status, a missing envelope or
/// a code other than 200 yields [`ApiError::Rejected`] carrying the envelope
/// `msg` when there is one.
pub fn decode_envelope<T: DeserializeOwned>(status: u16, raw: &str) -> Result<T, ApiError> {
    let success = (200..300).contains(&status);

    let payload = if raw.is_empty() {
        None
    } else {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Some(value),
            Err(_) if !success => {
                return Err(ApiError::Http {
                    status,
                    body: raw.to_string(),
                })
            }
            Err(_) => return Err(ApiError::NonJson),
        }
    };

    let envelope = payload.and_then(|v| serde_json::from_value::<ApiEnvelope<Value>>(v).ok());

    match envelope {
        Some(envelope) if success && envelope.is_success() => {
            let data = envelope.data.unwrap_or(Value::Null);
            serde_json::from_value(data).map_err(ApiError::Decode)
        }
        envelope => {
            let code = envelope.as_ref().map(|e| e.code);
            let message = envelope
                .map(|e| e.msg)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("request failed with status {}", status));

            Err(ApiError::Rejected {
                status,
                code,
                message,
            })
        }
    }
}

fn resolve_base(api_base: &str, origin: &str) -> String {
    if api_base.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), api_base)
    } else {
        api_base.to_string()
    }
}
