//! Gateway Configuration
//!
//! Loaded from the environment once at start-up. Blank variables count as
//! unset; unparseable numbers, booleans and durations fall back to defaults.

use std::time::Duration;

use anyhow::{bail, Result};

/// Default bind host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port
pub const DEFAULT_PORT: u16 = 8090;

/// Default upstream for the stellar provider
pub const DEFAULT_STELLAR_BASE_URL: &str = "http://127.0.0.1:8080/api/v1";

/// Header carrying the shared gateway key upstream
pub const DEFAULT_GATEWAY_HEADER: &str = "X-Gateway-Key";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret_key: String,
    pub expires_in: Duration,
    pub refresh_expires_in: Duration,
}

/// The single operator account
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct StellarProviderConfig {
    pub enabled: bool,
    pub name: String,
    /// No trailing slash
    pub base_url: String,
    pub gateway_key: String,
    pub gateway_header: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// `*` allows any origin
    pub cors_allow_origins: Vec<String>,
    pub jwt: JwtConfig,
    pub admin: AdminAccount,
    pub default_provider: String,
    pub stellar: StellarProviderConfig,
}

impl GatewayConfig {
    /// Load from the environment and validate
    pub fn from_env() -> Result<Self> {
        let stellar_name = env_or("STELLAR_PROVIDER_NAME", "stellar");

        let mut config = Self {
            host: env_or("SERVER_HOST", DEFAULT_HOST),
            port: env_parse("SERVER_PORT", DEFAULT_PORT),
            read_timeout: env_duration("SERVER_READ_TIMEOUT", Duration::from_secs(10)),
            write_timeout: env_duration("SERVER_WRITE_TIMEOUT", Duration::from_secs(10)),
            cors_allow_origins: env_or("CORS_ALLOW_ORIGINS", "*")
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            jwt: JwtConfig {
                secret_key: env_or("JWT_SECRET_KEY", ""),
                expires_in: env_duration("JWT_EXPIRES_IN", Duration::from_secs(2 * 3600)),
                refresh_expires_in: env_duration(
                    "JWT_REFRESH_EXPIRES_IN",
                    Duration::from_secs(168 * 3600),
                ),
            },
            admin: AdminAccount {
                username: env_or("ADMIN_USERNAME", "stellar_admin"),
                email: env_or("ADMIN_EMAIL", "stellar_admin@local"),
                password: env_or("ADMIN_PASSWORD", ""),
            },
            default_provider: env_or("DEFAULT_APP_PROVIDER", &stellar_name),
            stellar: StellarProviderConfig {
                enabled: env_bool("STELLAR_ENABLED", true),
                name: stellar_name,
                base_url: env_or("STELLAR_API_BASE_URL", DEFAULT_STELLAR_BASE_URL)
                    .trim_end_matches('/')
                    .to_string(),
                gateway_key: env_or("STELLAR_GATEWAY_KEY", ""),
                gateway_header: env_or("STELLAR_GATEWAY_HEADER", DEFAULT_GATEWAY_HEADER),
                timeout: env_duration("STELLAR_TIMEOUT", Duration::from_secs(10)),
            },
        };

        if config.cors_allow_origins.is_empty() {
            config.cors_allow_origins.push("*".to_string());
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt.secret_key.is_empty() {
            bail!("JWT_SECRET_KEY is required");
        }
        if self.admin.password.is_empty() {
            bail!("ADMIN_PASSWORD is required");
        }
        if self.stellar.enabled {
            if self.stellar.name.is_empty() {
                bail!("STELLAR_PROVIDER_NAME is required when the stellar provider is enabled");
            }
            if self.stellar.base_url.is_empty() {
                bail!("STELLAR_API_BASE_URL is required when the stellar provider is enabled");
            }
            if self.stellar.gateway_key.is_empty() {
                bail!("STELLAR_GATEWAY_KEY is required when the stellar provider is enabled");
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-request deadline applied by the timeout layer
    pub fn request_timeout(&self) -> Duration {
        self.read_timeout.max(self.write_timeout)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_allow_origins.iter().any(|o| o == "*")
    }
}

/// `500ms`, `10s`, `5m`, `2h`, or a bare number of seconds
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (number, unit) = match raw.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => raw.split_at(idx),
        None => (raw, "s"),
    };

    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let secs = match unit {
        "ms" => value / 1000.0,
        "s" => value,
        "m" => value * 60.0,
        "h" => value * 3600.0,
        _ => return None,
    };
    Some(Duration::from_secs_f64(secs))
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(fallback)
}

fn env_bool(key: &str, fallback: bool) -> bool {
    match std::env::var(key).map(|v| v.trim().to_lowercase()) {
        Ok(v) if v == "true" || v == "1" => true,
        Ok(v) if v == "false" || v == "0" => false,
        _ => fallback,
    }
}

fn env_duration(key: &str, fallback: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_duration(&v))
        .unwrap_or(fallback)
}
