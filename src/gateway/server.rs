//! Gateway HTTP Server
//!
//! Axum router with CORS, request tracing, a request deadline and graceful
//! shutdown on Ctrl-C or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::{get, post, put},
    Router,
};
use serde_json::json;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::auth::{login_handler, me_handler, AdminAuthService};
use super::config::GatewayConfig;
use super::handlers::{self, APP_KEY_HEADER};
use super::jwt::TokenIssuer;
use super::middleware::{authenticate, require_admin};
use super::provider::ProviderRegistry;
use super::response::ok_with;
use super::stellar::StellarProvider;
use super::GatewayState;

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "stellar-admin-gateway";

pub struct GatewayServer {
    config: GatewayConfig,
    state: GatewayState,
}

impl GatewayServer {
    /// Wire the auth service and register enabled providers
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let auth = AdminAuthService::new(
            config.admin.clone(),
            TokenIssuer::new(config.jwt.clone()),
        );

        let registry = ProviderRegistry::new(&config.default_provider);
        if config.stellar.enabled {
            let provider = StellarProvider::new(config.stellar.clone())
                .context("failed to create stellar provider")?;
            info!(
                "Provider registered: {} -> {}",
                config.stellar.name,
                provider.base_url()
            );
            registry.register(&config.stellar.name, Arc::new(provider));
        }

        if registry.resolve("").is_err() {
            warn!(
                "Default provider '{}' is not registered",
                registry.default_key()
            );
        }

        Ok(Self {
            config,
            state: GatewayState::new(auth, registry),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    /// Full router with outer middleware
    pub fn build_router(&self) -> Router {
        api_router(self.state.clone())
            .layer(timeout_layer(self.config.request_timeout()))
            .layer(TraceLayer::new_for_http())
            .layer(self.cors_layer())
    }

    fn cors_layer(&self) -> CorsLayer {
        let origin = if self.config.allows_any_origin() {
            AllowOrigin::from(Any)
        } else {
            AllowOrigin::list(
                self.config
                    .cors_allow_origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok()),
            )
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                header::ORIGIN,
                header::CONTENT_TYPE,
                header::ACCEPT,
                header::AUTHORIZATION,
                HeaderName::from_static(APP_KEY_HEADER),
            ])
    }

    /// Bind and serve until a shutdown signal arrives
    pub async fn run(self) -> Result<()> {
        let addr = self.config.bind_addr();
        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        info!("Admin gateway listening on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Admin gateway shut down gracefully");
        Ok(())
    }
}

/// Routes under `/api/v1` without the outer middleware
pub fn api_router(state: GatewayState) -> Router {
    let admin = Router::new()
        .route("/auth/me", get(me_handler))
        .route("/providers", get(handlers::list_providers))
        .route("/users", get(handlers::list_users))
        .route("/users/{id}/planets", get(handlers::list_user_planets))
        .route(
            "/users/{id}",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        .route("/configs", get(handlers::list_configs))
        .route(
            "/configs/{key}",
            put(handlers::upsert_config).delete(handlers::delete_config),
        )
        .layer(from_fn(require_admin))
        .layer(from_fn_with_state(state.clone(), authenticate));

    let v1 = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/admin/login", post(login_handler))
        .nest("/admin", admin)
        .with_state(state);

    Router::new().nest("/api/v1", v1)
}

/// Requests past `timeout` are answered with 408
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

async fn health_handler() -> Response {
    ok_with("ok", json!({ "service": SERVICE_NAME }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_slow_request_times_out_with_408() {
        let router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(50)));

        let req = Request::get("/slow").body(Body::empty()).unwrap();
        let response = router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
