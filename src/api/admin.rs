//! Admin API bindings
//!
//! One method per endpoint of the Stellar admin API. Each call is a single
//! round trip: no retry, no caching.
//!
//! # Endpoints
//!
//! - `POST /auth/admin/login` - Exchange the admin password for a token
//! - `GET /admin/auth/me` - Current operator profile
//! - `GET /admin/users` - Paginated users with subscriber count
//! - `PUT /admin/users/:id` - Update user fields
//! - `DELETE /admin/users/:id` - Delete user
//! - `GET /admin/users/:id/planets` - Paginated planets of one user
//! - `GET /admin/configs` - All config entries
//! - `PUT /admin/configs/:key` - Create or update a config entry
//! - `DELETE /admin/configs/:key` - Delete a config entry

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::form_urlencoded;

use super::client::{ApiClient, RequestOptions};
use super::error::ApiError;
use super::types::{
    AdminProfile, AdminUserUpdateRequest, AdminUsersPage, AppConfig, AppConfigUpsertRequest,
    LoginRequest, LoginResponse, PaginationResponse, PlanetItem, User,
};

/// Typed bindings over [`ApiClient`]
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
    strict_auth: bool,
    cancel: Option<CancellationToken>,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            strict_auth: false,
            cancel: None,
        }
    }

    /// Refuse authenticated calls locally when no token is stored
    pub fn with_strict_auth(mut self, strict: bool) -> Self {
        self.strict_auth = strict;
        self
    }

    /// Copy whose calls are all aborted when `token` is cancelled
    pub fn scoped(&self, token: CancellationToken) -> Self {
        Self {
            client: self.client.clone(),
            strict_auth: self.strict_auth,
            cancel: Some(token),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Token bound by [`AdminApi::scoped`], if any
    pub fn cancel_token(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Scope bound to a child of the current token, so cancelling either
    /// this scope or its parent aborts the calls
    pub fn child_scope(&self) -> (Self, CancellationToken) {
        let token = self
            .cancel
            .as_ref()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        (self.scoped(token.clone()), token)
    }

    pub async fn login(&self, payload: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let body = serde_json::to_value(payload)?;
        self.send("/auth/admin/login", RequestOptions::post().public().body(body))
            .await
    }

    pub async fn me(&self) -> Result<AdminProfile, ApiError> {
        self.send_authed("/admin/auth/me", RequestOptions::get()).await
    }

    pub async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        keyword: &str,
    ) -> Result<AdminUsersPage, ApiError> {
        let path = format!("/admin/users?{}", list_query(page, page_size, Some(keyword)));
        self.send_authed(&path, RequestOptions::get()).await
    }

    pub async fn update_user(
        &self,
        user_id: u64,
        payload: &AdminUserUpdateRequest,
    ) -> Result<User, ApiError> {
        let body = serde_json::to_value(payload)?;
        self.send_authed(
            &format!("/admin/users/{}", user_id),
            RequestOptions::put().body(body),
        )
        .await
    }

    pub async fn delete_user(&self, user_id: u64) -> Result<(), ApiError> {
        self.send_authed(&format!("/admin/users/{}", user_id), RequestOptions::delete())
            .await
    }

    pub async fn list_user_planets(
        &self,
        user_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<PaginationResponse<PlanetItem>, ApiError> {
        let path = format!(
            "/admin/users/{}/planets?{}",
            user_id,
            list_query(page, page_size, None)
        );
        self.send_authed(&path, RequestOptions::get()).await
    }

    pub async fn list_configs(&self) -> Result<Vec<AppConfig>, ApiError> {
        self.send_authed("/admin/configs", RequestOptions::get()).await
    }

    pub async fn upsert_config(
        &self,
        key: &str,
        payload: &AppConfigUpsertRequest,
    ) -> Result<AppConfig, ApiError> {
        let body = serde_json::to_value(payload)?;
        self.send_authed(
            &format!("/admin/configs/{}", encode_path_segment(key)),
            RequestOptions::put().body(body),
        )
        .await
    }

    pub async fn delete_config(&self, key: &str) -> Result<(), ApiError> {
        self.send_authed(
            &format!("/admin/configs/{}", encode_path_segment(key)),
            RequestOptions::delete(),
        )
        .await
    }

    async fn send_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        if self.strict_auth && self.client.tokens().get_token().is_empty() {
            return Err(ApiError::MissingToken);
        }
        self.send(path, options).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.client
            .request(path, options.cancel_on(self.cancel.clone()))
            .await
    }
}

/// `page=..&pageSize=..[&keyword=..]`; blank keywords are left out
pub fn list_query(page: u32, page_size: u32, keyword: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("page", &page.to_string())
        .append_pair("pageSize", &page_size.to_string());

    if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
        query.append_pair("keyword", keyword);
    }

    query.finish()
}

/// Percent-encode one path segment (spaces as `%20`, `/` escaped)
pub fn encode_path_segment(raw: &str) -> String {
    // form encoding turns ' ' into '+' and escapes literal '+' as %2B
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
