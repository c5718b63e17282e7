//! Admin Gateway
//!
//! Backend-for-frontend in front of the Stellar API. Issues operator tokens,
//! enforces the admin role and proxies user/config operations to a provider.
//!
//! # Routes
//!
//! ```text
//! GET    /api/v1/health                     public
//! POST   /api/v1/auth/admin/login           public
//! GET    /api/v1/admin/auth/me              admin
//! GET    /api/v1/admin/providers            admin
//! GET    /api/v1/admin/users                admin
//! GET    /api/v1/admin/users/{id}/planets   admin
//! PUT    /api/v1/admin/users/{id}           admin
//! DELETE /api/v1/admin/users/{id}           admin
//! GET    /api/v1/admin/configs              admin
//! PUT    /api/v1/admin/configs/{key}        admin
//! DELETE /api/v1/admin/configs/{key}        admin
//! ```

pub mod auth;
pub mod config;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod provider;
pub mod response;
pub mod server;
pub mod stellar;

use std::sync::Arc;

pub use auth::{AdminAuthService, AuthError, ADMIN_USER_ID};
pub use config::{parse_duration, AdminAccount, GatewayConfig, JwtConfig, StellarProviderConfig};
pub use jwt::{Claims, TokenError, TokenIssuer};
pub use provider::{AdminProvider, ProviderRegistry, UpstreamError};
pub use response::GatewayError;
pub use server::{api_router, GatewayServer};
pub use stellar::StellarProvider;

/// Shared handler state
#[derive(Clone)]
pub struct GatewayState {
    pub auth: Arc<AdminAuthService>,
    pub registry: Arc<ProviderRegistry>,
}

impl GatewayState {
    pub fn new(auth: AdminAuthService, registry: ProviderRegistry) -> Self {
        Self {
            auth: Arc::new(auth),
            registry: Arc::new(registry),
        }
    }
}
