//! Auth middleware for the `/admin` routes

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use super::jwt::{extract_token_from_header, Claims};
use super::response::GatewayError;
use super::GatewayState;
use crate::api::UserRole;

/// Verify the bearer token and stash its claims in the request extensions
pub async fn authenticate(
    State(state): State<GatewayState>,
    mut req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = extract_token_from_header(header)?;
    let claims = state.auth.issuer().parse_token(token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Reject authenticated callers whose role is not admin
pub async fn require_admin(req: Request, next: Next) -> Result<Response, GatewayError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| GatewayError::Unauthorized("Unauthorized".to_string()))?;

    if claims.role != UserRole::Admin.as_str() {
        return Err(GatewayError::Forbidden);
    }

    Ok(next.run(req).await)
}
