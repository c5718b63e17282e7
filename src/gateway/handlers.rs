//! Provider-backed admin handlers
//!
//! Each handler resolves the target provider from the `X-App-Key` header
//! (or the `app` query parameter), validates its inputs and forwards.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::HeaderMap,
    response::Response,
    Json,
};

use super::provider::AdminProvider;
use super::response::{ok, ok_message, GatewayError};
use super::GatewayState;
use crate::api::{AdminUserUpdateRequest, AppConfigUpsertRequest};

/// Header naming the provider
pub const APP_KEY_HEADER: &str = "x-app-key";

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

type Params = HashMap<String, String>;

/// `page` (>= 1) and `pageSize` / `page_size` (1..=100, default 10)
pub fn pagination_params(params: &Params) -> (u32, u32) {
    let int = |key: &str| params.get(key).and_then(|v| v.trim().parse::<i64>().ok());

    let page = int("page").unwrap_or(1).max(1);
    let page_size = int("pageSize")
        .or_else(|| int("page_size"))
        .unwrap_or(i64::from(DEFAULT_PAGE_SIZE));
    let page_size = if page_size < 1 {
        i64::from(DEFAULT_PAGE_SIZE)
    } else {
        page_size.min(i64::from(MAX_PAGE_SIZE))
    };

    (
        u32::try_from(page).unwrap_or(u32::MAX),
        page_size as u32,
    )
}

fn resolve_provider(
    state: &GatewayState,
    headers: &HeaderMap,
    params: &Params,
) -> Result<Arc<dyn AdminProvider>, GatewayError> {
    let key = headers
        .get(APP_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_else(|| params.get("app").map(|k| k.trim()))
        .unwrap_or_default();

    Ok(state.registry.resolve(key)?)
}

fn parse_user_id(raw: &str) -> Result<u64, GatewayError> {
    raw.trim()
        .parse()
        .map_err(|_| GatewayError::BadRequest("Invalid user id".to_string()))
}

fn config_key(raw: &str) -> Result<String, GatewayError> {
    match raw.trim() {
        "" => Err(GatewayError::BadRequest("Config key is required".to_string())),
        key => Ok(key.to_string()),
    }
}

/// `GET /admin/providers`
pub async fn list_providers(State(state): State<GatewayState>) -> Response {
    ok(state.registry.list())
}

/// `GET /admin/users`
pub async fn list_users(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Result<Response, GatewayError> {
    let provider = resolve_provider(&state, &headers, &params)?;
    let (page, page_size) = pagination_params(&params);
    let keyword = params.get("keyword").map(|k| k.trim()).unwrap_or_default();

    let result = provider.list_users(page, page_size, keyword).await?;
    Ok(ok(result))
}

/// `GET /admin/users/{id}/planets`
pub async fn list_user_planets(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Response, GatewayError> {
    let provider = resolve_provider(&state, &headers, &params)?;
    let user_id = parse_user_id(&id)?;
    let (page, page_size) = pagination_params(&params);

    let result = provider.list_user_planets(user_id, page, page_size).await?;
    Ok(ok(result))
}

/// `PUT /admin/users/{id}`
pub async fn update_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Params>,
    body: Result<Json<AdminUserUpdateRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let provider = resolve_provider(&state, &headers, &params)?;
    let user_id = parse_user_id(&id)?;
    let Json(req) = body.map_err(|_| GatewayError::invalid_body())?;

    let updated = provider.update_user(user_id, &req).await?;
    Ok(ok(updated))
}

/// `DELETE /admin/users/{id}`
pub async fn delete_user(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<Params>,
) -> Result<Response, GatewayError> {
    let provider = resolve_provider(&state, &headers, &params)?;
    let user_id = parse_user_id(&id)?;

    provider.delete_user(user_id).await?;
    Ok(ok_message("User deleted successfully"))
}

/// `GET /admin/configs`
pub async fn list_configs(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Result<Response, GatewayError> {
    let provider = resolve_provider(&state, &headers, &params)?;
    Ok(ok(provider.list_configs().await?))
}

/// `PUT /admin/configs/{key}`
pub async fn upsert_config(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(key): Path<String>,
    Query(params): Query<Params>,
    body: Result<Json<AppConfigUpsertRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let provider = resolve_provider(&state, &headers, &params)?;
    let key = config_key(&key)?;
    let Json(req) = body.map_err(|_| GatewayError::invalid_body())?;

    Ok(ok(provider.upsert_config(&key, &req).await?))
}

/// `DELETE /admin/configs/{key}`
pub async fn delete_config(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Path(key): Path<String>,
    Query(params): Query<Params>,
) -> Result<Response, GatewayError> {
    let provider = resolve_provider(&state, &headers, &params)?;
    let key = config_key(&key)?;

    provider.delete_config(&key).await?;
    Ok(ok_message("Config deleted successfully"))
}
