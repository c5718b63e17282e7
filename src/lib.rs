//! Stellar Admin
//!
//! Operator tooling for the Stellar service.
//!
//! # Features
//!
//! - **API Client**: Token-aware requests with envelope unwrapping and cancellation
//! - **Token Store**: Single-slot bearer token persistence (file or memory)
//! - **Console**: Headless session shell plus users/configs page controllers
//! - **Effects**: Light-ray background lifecycle controller
//! - **Gateway**: Axum backend-for-frontend issuing operator JWTs and proxying providers
//!
//! # Architecture
//!
//! ```text
//! CLI / UI ──► Console ──► AdminApi ──► ApiClient ──► Admin Gateway ──► Stellar API
//!                │                         │             (axum)      (X-Gateway-Key)
//!                │                         └── TokenStore
//!                └── Session (role gate)
//! ```

pub mod api;
pub mod config;
pub mod console;
pub mod effects;
pub mod gateway;
pub mod token;

pub use api::{AdminApi, ApiClient, ApiError, RequestOptions};
pub use config::Config;
pub use console::{ConfigsPage, ConsoleError, Session, SessionState, UsersPage};
pub use gateway::{GatewayConfig, GatewayServer};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
