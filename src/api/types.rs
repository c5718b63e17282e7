//! Wire Types
//!
//! Envelope, pagination and entity records shared by the console client and
//! the admin gateway. Field names on the wire are camelCase.

use serde::{Deserialize, Deserializer, Serialize};

/// Envelope code that marks a successful response
pub const SUCCESS_CODE: i64 = 200;

/// Read an explicit `null` as the type's default (empty lists arrive as `null`)
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Response envelope wrapping every API payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub code: i64,
    /// Unix milliseconds
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope carrying `data`
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            timestamp: chrono::Utc::now().timestamp_millis(),
            msg: "success".to_string(),
            data: Some(data),
        }
    }

    /// Envelope without payload (errors, delete confirmations)
    pub fn message(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            timestamp: chrono::Utc::now().timestamp_millis(),
            msg: msg.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

/// One page of a server-side listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse<T> {
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
    #[serde(
        default = "Vec::new",
        deserialize_with = "null_as_default",
        bound(deserialize = "T: Deserialize<'de>")
    )]
    pub data: Vec<T>,
}

impl<T> PaginationResponse<T> {
    /// Build a page, deriving `totalPages`, `hasNext` and `hasPrevious`
    pub fn new(data: Vec<T>, total: i64, page: u32, page_size: u32) -> Self {
        let total_pages = total_pages(total, page_size);
        Self {
            total,
            page,
            page_size,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T> Default for PaginationResponse<T> {
    fn default() -> Self {
        Self::new(Vec::new(), 0, 1, 0)
    }
}

/// `ceil(total / page_size)`; zero when either side is empty
pub fn total_pages(total: i64, page_size: u32) -> u32 {
    if total <= 0 || page_size == 0 {
        return 0;
    }
    let size = i64::from(page_size);
    u32::try_from((total + size - 1) / size).unwrap_or(u32::MAX)
}

/// User listing page with the subscriber count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUsersPage {
    #[serde(flatten)]
    pub page: PaginationResponse<User>,
    #[serde(default)]
    pub subscriber_total: i64,
}

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
    Guest,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Account status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Disabled,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Stellar user account
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub avatar: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(default)]
    pub is_subscriber: bool,
    #[serde(default)]
    pub subscription_expires_at: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// Partial user update; unset fields are left untouched server-side
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_subscriber: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_expires_at: Option<String>,
}

/// A planet generated by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetItem {
    pub id: String,
    pub name: String,
    pub user_id: u64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub date_key: String,
    #[serde(default)]
    pub planet_no: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// How a config value should be interpreted by the app
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigValueType {
    #[default]
    String,
    Number,
    Boolean,
    Json,
}

impl ConfigValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Json => "json",
        }
    }

    /// Input hint shown next to the value field
    pub fn helper_text(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean values: true / false",
            Self::Number => "number values: 3 or 3.14",
            Self::Json => r#"json values: {"a":1} or [1,2,3]"#,
            Self::String => "string values are stored verbatim",
        }
    }
}

impl std::str::FromStr for ConfigValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "boolean" | "bool" => Ok(Self::Boolean),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown value type: {}", other)),
        }
    }
}

/// Application configuration entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub id: u64,
    pub config_key: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub config_value: String,
    #[serde(default)]
    pub value_type: ConfigValueType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Create-or-update payload for a config entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfigUpsertRequest {
    pub alias: String,
    pub config_value: String,
    pub value_type: ConfigValueType,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub token: String,
}

impl LoginResponse {
    /// `accessToken`, falling back to the legacy `token` field
    pub fn bearer(&self) -> Option<&str> {
        [self.access_token.as_str(), self.token.as_str()]
            .into_iter()
            .find(|t| !t.is_empty())
    }
}

/// The signed-in operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub user_id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: String,
}

impl AdminProfile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin.as_str()
    }
}
