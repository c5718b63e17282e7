//! Operator tokens
//!
//! HS256 JWTs signed with the gateway secret. Access tokens carry the
//! operator identity; refresh tokens carry registered claims only.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::config::JwtConfig;

/// `iss` claim on every token the gateway issues
pub const ISSUER: &str = "stellar-admin-gateway";

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("Token not provided")]
    Missing,

    #[error("Invalid token")]
    Malformed,

    #[error("Invalid or expired token")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String,
    iss: String,
    iat: i64,
    nbf: i64,
    exp: i64,
    jti: String,
}

/// Signs and verifies gateway tokens
#[derive(Clone)]
pub struct TokenIssuer {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("expires_in", &self.config.expires_in)
            .field("refresh_expires_in", &self.config.refresh_expires_in)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret_key.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            config,
        }
    }

    pub fn generate_token(
        &self,
        user_id: u64,
        username: &str,
        email: &str,
        role: &str,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            iat: now,
            nbf: now,
            exp: now + self.config.expires_in.as_secs() as i64,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn generate_refresh_token(&self, user_id: u64) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iss: ISSUER.to_string(),
            iat: now,
            nbf: now,
            exp: now + self.config.refresh_expires_in.as_secs() as i64,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature, algorithm, issuer, `exp` and `nbf`
    pub fn parse_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}

/// Token from an `Authorization: Bearer <t>` header value
pub fn extract_token_from_header(header: Option<&str>) -> Result<&str, TokenError> {
    let header = header.map(str::trim).unwrap_or_default();
    if header.is_empty() {
        return Err(TokenError::Missing);
    }
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .ok_or(TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(JwtConfig {
            secret_key: secret.to_string(),
            expires_in: Duration::from_secs(3600),
            refresh_expires_in: Duration::from_secs(7200),
        })
    }

    #[test]
    fn test_token_carries_identity() {
        let issuer = issuer("secret");
        let token = issuer
            .generate_token(1000001, "admin", "admin@local", "admin")
            .unwrap();
        let claims = issuer.parse_token(&token).unwrap();
        assert_eq!(claims.user_id, 1000001);
        assert_eq!(claims.sub, "1000001");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = issuer("one")
            .generate_token(1, "a", "a@b", "admin")
            .unwrap();
        assert_eq!(issuer("two").parse_token(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let issuer = issuer("secret");
        let refresh = issuer.generate_refresh_token(1).unwrap();
        assert_eq!(issuer.parse_token(&refresh), Err(TokenError::Invalid));
    }

    #[test]
    fn test_extract_header() {
        assert_eq!(extract_token_from_header(None), Err(TokenError::Missing));
        assert_eq!(extract_token_from_header(Some("  ")), Err(TokenError::Missing));
        assert_eq!(
            extract_token_from_header(Some("Basic abc")),
            Err(TokenError::Malformed)
        );
        assert_eq!(extract_token_from_header(Some("Bearer abc")), Ok("abc"));
    }
}
