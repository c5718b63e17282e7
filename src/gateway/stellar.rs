//! Stellar provider
//!
//! Forwards admin operations to the Stellar API, authenticating with the
//! shared gateway key header. Upstream envelopes are unwrapped here; error
//! envelopes become [`UpstreamError::Status`].

use async_trait::async_trait;
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::config::StellarProviderConfig;
use super::provider::{AdminProvider, UpstreamError};
use crate::api::admin::{encode_path_segment, list_query};
use crate::api::{
    AdminUserUpdateRequest, AdminUsersPage, ApiEnvelope, AppConfig, AppConfigUpsertRequest,
    PaginationResponse, PlanetItem, User,
};

pub struct StellarProvider {
    config: StellarProviderConfig,
    http: Client,
}

impl StellarProvider {
    pub fn new(config: StellarProviderConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Internal(format!("build http client failed: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn call<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, UpstreamError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let url = format!("{}/{}", self.config.base_url, path.trim_start_matches('/'));
        debug!("Upstream {} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(header::ACCEPT, "application/json")
            .header(self.config.gateway_header.as_str(), self.config.gateway_key.as_str());

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Internal(format!("request upstream failed: {}", e)))?;

        let status = response.status().as_u16();
        let raw = response
            .text()
            .await
            .map_err(|e| UpstreamError::Internal(format!("read upstream response failed: {}", e)))?;

        let result = unwrap_upstream(status, &raw);
        if let Err(e) = &result {
            warn!("Upstream {} failed: {}", url, e);
        }
        result
    }
}

/// Apply the envelope rules to an upstream reply
pub fn unwrap_upstream<T>(status: u16, raw: &str) -> Result<T, UpstreamError>
where
    T: DeserializeOwned + Default,
{
    let ok_status = (200..300).contains(&status);

    let envelope: ApiEnvelope<Value> = if raw.trim().is_empty() {
        ApiEnvelope::message(0, "")
    } else {
        match serde_json::from_str(raw) {
            Ok(envelope) => envelope,
            Err(_) if ok_status => {
                return Err(UpstreamError::Internal(format!(
                    "upstream response is not json: {}",
                    raw
                )))
            }
            Err(_) => {
                return Err(UpstreamError::Status {
                    status,
                    message: raw.to_string(),
                })
            }
        }
    };

    if !ok_status || !envelope.is_success() {
        let message = match envelope.msg.trim() {
            "" => format!("upstream request failed: status={}", status),
            msg => msg.to_string(),
        };
        return Err(UpstreamError::Status { status, message });
    }

    match envelope.data {
        None | Some(Value::Null) => Ok(T::default()),
        Some(data) => serde_json::from_value(data)
            .map_err(|e| UpstreamError::Internal(format!("unmarshal upstream data failed: {}", e))),
    }
}

#[async_trait]
impl AdminProvider for StellarProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        keyword: &str,
    ) -> Result<AdminUsersPage, UpstreamError> {
        let path = format!("/admin/users?{}", list_query(page, page_size, Some(keyword)));
        self.call::<(), _>(Method::GET, &path, None).await
    }

    async fn list_user_planets(
        &self,
        user_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<PaginationResponse<PlanetItem>, UpstreamError> {
        let path = format!(
            "/admin/users/{}/planets?{}",
            user_id,
            list_query(page, page_size, None)
        );
        self.call::<(), _>(Method::GET, &path, None).await
    }

    async fn update_user(
        &self,
        user_id: u64,
        req: &AdminUserUpdateRequest,
    ) -> Result<User, UpstreamError> {
        self.call(Method::PUT, &format!("/admin/users/{}", user_id), Some(req))
            .await
    }

    async fn delete_user(&self, user_id: u64) -> Result<(), UpstreamError> {
        self.call::<(), ()>(Method::DELETE, &format!("/admin/users/{}", user_id), None)
            .await
    }

    async fn list_configs(&self) -> Result<Vec<AppConfig>, UpstreamError> {
        self.call::<(), _>(Method::GET, "/admin/configs", None).await
    }

    async fn upsert_config(
        &self,
        key: &str,
        req: &AppConfigUpsertRequest,
    ) -> Result<AppConfig, UpstreamError> {
        let path = format!("/admin/configs/{}", encode_path_segment(key));
        self.call(Method::PUT, &path, Some(req)).await
    }

    async fn delete_config(&self, key: &str) -> Result<(), UpstreamError> {
        let path = format!("/admin/configs/{}", encode_path_segment(key));
        self.call::<(), ()>(Method::DELETE, &path, None).await
    }
}
