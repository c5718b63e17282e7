//! Operator authentication
//!
//! There is exactly one operator account, configured through the
//! environment. Logging in with its password yields an access/refresh token
//! pair for the fixed admin user id.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Extension, Json,
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use super::config::AdminAccount;
use super::jwt::{Claims, TokenError, TokenIssuer};
use super::response::{ok, GatewayError};
use super::GatewayState;
use crate::api::{AdminProfile, LoginRequest, LoginResponse, UserRole};

/// User id stamped on operator tokens
pub const ADMIN_USER_ID: u64 = 1000001;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid password")]
    InvalidPassword,

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<AuthError> for GatewayError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidPassword => Self::Unauthorized(err.to_string()),
            AuthError::Token(e) => e.into(),
        }
    }
}

#[derive(Debug)]
pub struct AdminAuthService {
    account: AdminAccount,
    issuer: TokenIssuer,
}

impl AdminAuthService {
    pub fn new(account: AdminAccount, issuer: TokenIssuer) -> Self {
        Self { account, issuer }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Check the password and issue tokens
    pub fn login(&self, password: &str) -> Result<LoginResponse, AuthError> {
        if !digest_eq(password, &self.account.password) {
            warn!("Rejected operator login");
            return Err(AuthError::InvalidPassword);
        }

        let role = UserRole::Admin.as_str();
        let access_token = self.issuer.generate_token(
            ADMIN_USER_ID,
            &self.account.username,
            &self.account.email,
            role,
        )?;
        let refresh_token = self.issuer.generate_refresh_token(ADMIN_USER_ID)?;

        info!("Operator {} logged in", self.account.username);

        Ok(LoginResponse {
            user_id: ADMIN_USER_ID,
            username: self.account.username.clone(),
            email: self.account.email.clone(),
            role: role.to_string(),
            token: access_token.clone(),
            access_token,
            refresh_token,
        })
    }
}

/// Compare SHA-256 digests so timing does not depend on the common prefix
fn digest_eq(candidate: &str, expected: &str) -> bool {
    let a = Sha256::digest(candidate.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// `POST /auth/admin/login`
pub async fn login_handler(
    State(state): State<GatewayState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(req) = body.map_err(|_| GatewayError::invalid_body())?;
    let response = state.auth.login(&req.password)?;
    Ok(ok(response))
}

/// `GET /admin/auth/me`
pub async fn me_handler(Extension(claims): Extension<Claims>) -> Response {
    ok(AdminProfile {
        user_id: claims.user_id,
        username: claims.username,
        email: claims.email,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::config::JwtConfig;
    use std::time::Duration;

    fn service() -> AdminAuthService {
        AdminAuthService::new(
            AdminAccount {
                username: "stellar_admin".to_string(),
                email: "stellar_admin@local".to_string(),
                password: "hunter2".to_string(),
            },
            TokenIssuer::new(JwtConfig {
                secret_key: "secret".to_string(),
                expires_in: Duration::from_secs(60),
                refresh_expires_in: Duration::from_secs(120),
            }),
        )
    }

    #[test]
    fn test_login_issues_matching_tokens() {
        let service = service();
        let resp = service.login("hunter2").unwrap();
        assert_eq!(resp.user_id, ADMIN_USER_ID);
        assert_eq!(resp.role, "admin");
        assert_eq!(resp.token, resp.access_token);
        assert_ne!(resp.access_token, resp.refresh_token);

        let claims = service.issuer().parse_token(&resp.access_token).unwrap();
        assert_eq!(claims.username, "stellar_admin");
    }

    #[test]
    fn test_wrong_password() {
        let err = service().login("hunter3").unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
        assert_eq!(err.to_string(), "invalid password");
    }

    #[test]
    fn test_digest_eq() {
        assert!(digest_eq("a", "a"));
        assert!(!digest_eq("a", "ab"));
        assert!(!digest_eq("", "a"));
    }
}
