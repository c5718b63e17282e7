//! Admin providers
//!
//! A provider is one backing application the gateway can administer. The
//! registry maps provider keys to implementations and falls back to a
//! default key when the request does not name one.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::api::{
    AdminUserUpdateRequest, AdminUsersPage, AppConfig, AppConfigUpsertRequest,
    PaginationResponse, PlanetItem, User,
};

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with an error envelope or status
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    /// Transport, decoding or other local failure
    #[error("{0}")]
    Internal(String),
}

#[async_trait]
pub trait AdminProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        keyword: &str,
    ) -> Result<AdminUsersPage, UpstreamError>;

    async fn list_user_planets(
        &self,
        user_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<PaginationResponse<PlanetItem>, UpstreamError>;

    async fn update_user(
        &self,
        user_id: u64,
        req: &AdminUserUpdateRequest,
    ) -> Result<User, UpstreamError>;

    async fn delete_user(&self, user_id: u64) -> Result<(), UpstreamError>;

    async fn list_configs(&self) -> Result<Vec<AppConfig>, UpstreamError>;

    async fn upsert_config(
        &self,
        key: &str,
        req: &AppConfigUpsertRequest,
    ) -> Result<AppConfig, UpstreamError>;

    async fn delete_config(&self, key: &str) -> Result<(), UpstreamError>;
}

/// Provider lookup by key
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn AdminProvider>>>,
    default_key: String,
}

impl ProviderRegistry {
    pub fn new(default_key: &str) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            default_key: default_key.trim().to_string(),
        }
    }

    pub fn default_key(&self) -> &str {
        &self.default_key
    }

    pub fn register(&self, key: &str, provider: Arc<dyn AdminProvider>) {
        self.providers.write().insert(key.trim().to_string(), provider);
    }

    /// Registered keys, sorted
    pub fn list(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.providers.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Provider for `key`; a blank key selects the default
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn AdminProvider>, UpstreamError> {
        let key = match key.trim() {
            "" => self.default_key.as_str(),
            key => key,
        };

        self.providers
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| UpstreamError::ProviderNotFound(key.to_string()))
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list())
            .field("default_key", &self.default_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl AdminProvider for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn list_users(&self, page: u32, page_size: u32, _: &str) -> Result<AdminUsersPage, UpstreamError> {
            Ok(AdminUsersPage {
                page: PaginationResponse::new(vec![], 0, page, page_size),
                subscriber_total: 0,
            })
        }

        async fn list_user_planets(&self, _: u64, page: u32, page_size: u32) -> Result<PaginationResponse<PlanetItem>, UpstreamError> {
            Ok(PaginationResponse::new(vec![], 0, page, page_size))
        }

        async fn update_user(&self, _: u64, _: &AdminUserUpdateRequest) -> Result<User, UpstreamError> {
            Err(UpstreamError::Internal("unsupported".to_string()))
        }

        async fn delete_user(&self, _: u64) -> Result<(), UpstreamError> {
            Ok(())
        }

        async fn list_configs(&self) -> Result<Vec<AppConfig>, UpstreamError> {
            Ok(vec![])
        }

        async fn upsert_config(&self, _: &str, _: &AppConfigUpsertRequest) -> Result<AppConfig, UpstreamError> {
            Err(UpstreamError::Internal("unsupported".to_string()))
        }

        async fn delete_config(&self, _: &str) -> Result<(), UpstreamError> {
            Ok(())
        }
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let registry = ProviderRegistry::new(" stellar ");
        registry.register("stellar", Arc::new(Named("stellar")));
        registry.register("nebula", Arc::new(Named("nebula")));

        assert_eq!(registry.resolve("").unwrap().name(), "stellar");
        assert_eq!(registry.resolve(" nebula ").unwrap().name(), "nebula");
        assert_eq!(registry.list(), vec!["nebula", "stellar"]);
    }

    #[test]
    fn test_unknown_provider() {
        let registry = ProviderRegistry::new("stellar");
        let err = registry.resolve("ghost").err().unwrap();
        assert_eq!(err.to_string(), "provider not found: ghost");
    }
}
