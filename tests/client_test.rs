//! API client integration tests
//!
//! Runs the client against an in-process axum stub of the Stellar admin API.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use stellar_admin::api::{AppConfigUpsertRequest, ConfigValueType, LoginRequest};
use stellar_admin::{AdminApi, ApiClient, ApiError, Config, MemoryTokenStore, TokenStore};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
struct Seen {
    authorization: Option<String>,
    content_type: Option<String>,
    query: Option<String>,
    path: Option<String>,
    body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn seen(headers: &HeaderMap) -> Seen {
    let get = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Seen {
        authorization: get(header::AUTHORIZATION),
        content_type: get(header::CONTENT_TYPE),
        ..Default::default()
    }
}

fn envelope(data: Value) -> Json<Value> {
    Json(json!({ "code": 200, "timestamp": 1, "msg": "success", "data": data }))
}

fn user_json(id: u64) -> Value {
    json!({
        "id": id,
        "username": format!("user{}", id),
        "phone": "",
        "avatar": "",
        "role": "user",
        "status": "active",
        "isSubscriber": false,
        "subscriptionExpiresAt": null,
        "createdAt": "2024-01-01T00:00:00Z"
    })
}

fn stub(log: Log) -> Router {
    Router::new()
        .route(
            "/api/v1/auth/admin/login",
            post(
                |State(log): State<Log>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let mut s = seen(&headers);
                    s.body = Some(body);
                    log.lock().push(s);
                    envelope(json!({
                        "userId": 1000001,
                        "username": "admin",
                        "email": "admin@local",
                        "role": "admin",
                        "accessToken": "tok-123",
                        "refreshToken": "ref-456",
                        "token": "tok-123"
                    }))
                },
            ),
        )
        .route(
            "/api/v1/admin/auth/me",
            get(|State(log): State<Log>, headers: HeaderMap| async move {
                log.lock().push(seen(&headers));
                envelope(json!({
                    "userId": 1000001,
                    "username": "admin",
                    "email": "admin@local",
                    "role": "admin"
                }))
            }),
        )
        .route(
            "/api/v1/admin/users",
            get(
                |State(log): State<Log>, headers: HeaderMap, RawQuery(query): RawQuery| async move {
                    let mut s = seen(&headers);
                    s.query = query;
                    log.lock().push(s);
                    envelope(json!({
                        "total": 45,
                        "page": 3,
                        "pageSize": 20,
                        "totalPages": 3,
                        "hasNext": false,
                        "hasPrevious": true,
                        "data": (41..=45).map(user_json).collect::<Vec<_>>(),
                        "subscriberTotal": 7
                    }))
                },
            ),
        )
        .route(
            "/api/v1/admin/configs/{key}",
            put(
                |State(log): State<Log>,
                 headers: HeaderMap,
                 Path(key): Path<String>,
                 Json(body): Json<Value>| async move {
                    let mut s = seen(&headers);
                    s.path = Some(key.clone());
                    s.body = Some(body.clone());
                    log.lock().push(s);
                    envelope(json!({
                        "id": 9,
                        "configKey": key,
                        "alias": body["alias"],
                        "configValue": body["configValue"],
                        "valueType": body["valueType"],
                        "description": body["description"]
                    }))
                },
            ),
        )
        .route(
            "/api/v1/rejected",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "code": 401, "timestamp": 1, "msg": "invalid token" })),
                )
            }),
        )
        .route(
            "/api/v1/soft-reject",
            get(|| async { Json(json!({ "code": 500, "timestamp": 1, "msg": "" })) }),
        )
        .route("/api/v1/html", get(|| async { "<html>ok</html>" }))
        .route(
            "/api/v1/broken",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down").into_response() }),
        )
        .route(
            "/api/v1/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                envelope(json!(null))
            }),
        )
        .with_state(log)
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api/v1/", addr)
}

async fn setup() -> (AdminApi, Arc<MemoryTokenStore>, Log) {
    let log: Log = Arc::default();
    let base = spawn(stub(log.clone())).await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let client = ApiClient::new(&Config::with_api_base(&base), tokens.clone()).unwrap();
    (AdminApi::new(client), tokens, log)
}

#[tokio::test]
async fn test_login_is_public_and_sends_json() {
    let (api, tokens, log) = setup().await;
    tokens.set_token("stale").unwrap();

    let resp = api
        .login(&LoginRequest {
            password: "secret".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(resp.bearer(), Some("tok-123"));

    let seen = log.lock()[0].clone();
    assert_eq!(seen.authorization, None);
    assert_eq!(seen.content_type.as_deref(), Some("application/json"));
    assert_eq!(seen.body, Some(json!({ "password": "secret" })));
}

#[tokio::test]
async fn test_bearer_header_attached_when_token_stored() {
    let (api, tokens, log) = setup().await;

    api.me().await.unwrap();
    tokens.set_token("abc").unwrap();
    let profile = api.me().await.unwrap();
    assert!(profile.is_admin());

    let log = log.lock();
    assert_eq!(log[0].authorization, None);
    assert_eq!(log[1].authorization.as_deref(), Some("Bearer abc"));
}

#[tokio::test]
async fn test_list_users_query_and_pagination() {
    let (api, _tokens, log) = setup().await;

    let page = api.list_users(3, 20, " bob ").await.unwrap();
    assert_eq!(page.page.total_pages, 3);
    assert!(page.page.data.len() <= 20);
    assert_eq!(page.subscriber_total, 7);

    api.list_users(1, 20, "   ").await.unwrap();

    let log = log.lock();
    assert_eq!(log[0].query.as_deref(), Some("page=3&pageSize=20&keyword=bob"));
    assert_eq!(log[1].query.as_deref(), Some("page=1&pageSize=20"));
}

#[tokio::test]
async fn test_config_key_is_one_path_segment() {
    let (api, _tokens, log) = setup().await;

    let saved = api
        .upsert_config(
            "home banner/title",
            &AppConfigUpsertRequest {
                alias: "Banner".to_string(),
                config_value: "hello".to_string(),
                value_type: ConfigValueType::String,
                description: String::new(),
            },
        )
        .await
        .unwrap();
    assert_eq!(saved.config_key, "home banner/title");

    let seen = log.lock()[0].clone();
    assert_eq!(seen.path.as_deref(), Some("home banner/title"));
    assert_eq!(seen.body.unwrap()["valueType"], "string");
}

#[tokio::test]
async fn test_rejected_envelope_surfaces_msg() {
    let (api, _tokens, _log) = setup().await;

    let err = api
        .client()
        .request::<Value>("/rejected", Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid token");
    assert!(err.is_unauthorized());

    let err = api
        .client()
        .request::<Value>("soft-reject", Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "request failed with status 200");
}

#[tokio::test]
async fn test_non_json_bodies() {
    let (api, _tokens, _log) = setup().await;

    let err = api
        .client()
        .request::<Value>("/html", Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NonJson));
    assert_eq!(err.to_string(), "non-JSON response");

    let err = api
        .client()
        .request::<Value>("/broken", Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP 502: upstream down");
}

#[tokio::test]
async fn test_transport_error_names_url() {
    let client = ApiClient::new(
        &Config::with_api_base("http://127.0.0.1:1/api/v1"),
        Arc::new(MemoryTokenStore::new()),
    )
    .unwrap();

    let err = AdminApi::new(client).list_configs().await.unwrap_err();
    match &err {
        ApiError::Transport { url, .. } => {
            assert_eq!(url, "http://127.0.0.1:1/api/v1/admin/configs")
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("(URL: http://127.0.0.1:1/api/v1/admin/configs)"));
}

#[tokio::test]
async fn test_cancelled_scope_aborts_in_flight_call() {
    let (api, _tokens, _log) = setup().await;
    let token = CancellationToken::new();
    let scoped = api.scoped(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let started = std::time::Instant::now();
    let err = scoped
        .client()
        .request::<Value>(
            "/slow",
            stellar_admin::RequestOptions::get().cancel_on(scoped.cancel_token().cloned()),
        )
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_strict_auth_fails_fast_without_token() {
    let (api, tokens, log) = setup().await;
    let strict = api.with_strict_auth(true);

    let err = strict.me().await.unwrap_err();
    assert!(matches!(err, ApiError::MissingToken));
    assert!(log.lock().is_empty());

    tokens.set_token("abc").unwrap();
    assert!(strict.me().await.is_ok());
}
