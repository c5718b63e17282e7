//! Stellar Admin API client
//!
//! Token-aware request layer plus typed endpoint bindings.

pub mod admin;
pub mod client;
pub mod error;
pub mod types;

pub use admin::AdminApi;
pub use client::{decode_envelope, ApiClient, RequestOptions};
pub use error::ApiError;
pub use types::{
    AdminProfile, AdminUserUpdateRequest, AdminUsersPage, ApiEnvelope, AppConfig,
    AppConfigUpsertRequest, ConfigValueType, LoginRequest, LoginResponse, PaginationResponse,
    PlanetItem, User, UserRole, UserStatus,
};
