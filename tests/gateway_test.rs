//! Admin gateway tests
//!
//! Exercises the `/api/v1` router with a recording in-memory provider, then
//! drives it end to end with the console client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use stellar_admin::api::{
    AdminUserUpdateRequest, AdminUsersPage, AppConfig, AppConfigUpsertRequest, PaginationResponse,
    PlanetItem, User,
};
use stellar_admin::gateway::{
    api_router, AdminAccount, AdminAuthService, AdminProvider, GatewayState, JwtConfig,
    ProviderRegistry, TokenIssuer, UpstreamError,
};
use stellar_admin::{AdminApi, ApiClient, Config, MemoryTokenStore, Session, TokenStore};
use tower::ServiceExt;

const PASSWORD: &str = "correct horse";
const SECRET: &str = "gateway-test-secret";

/// Records every call; a pending failure is returned by the next call
#[derive(Default)]
struct FakeProvider {
    name: String,
    calls: Mutex<Vec<String>>,
    users: Mutex<HashMap<u64, User>>,
    configs: Mutex<Vec<AppConfig>>,
    fail_with: Mutex<Option<UpstreamError>>,
}

impl FakeProvider {
    fn new(name: &str) -> Self {
        let users = (1..=3)
            .map(|id| {
                (
                    id,
                    User {
                        id,
                        username: format!("user{}", id),
                        ..Default::default()
                    },
                )
            })
            .collect();
        Self {
            name: name.to_string(),
            users: Mutex::new(users),
            ..Default::default()
        }
    }

    fn record(&self, call: String) -> Result<(), UpstreamError> {
        self.calls.lock().push(call);
        match self.fail_with.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn last_call(&self) -> Option<String> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl AdminProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        keyword: &str,
    ) -> Result<AdminUsersPage, UpstreamError> {
        self.record(format!("list_users {} {} {:?}", page, page_size, keyword))?;
        let mut data: Vec<User> = self.users.lock().values().cloned().collect();
        data.sort_by_key(|u| u.id);
        let total = data.len() as i64;
        Ok(AdminUsersPage {
            page: PaginationResponse::new(data, total, page, page_size),
            subscriber_total: 0,
        })
    }

    async fn list_user_planets(
        &self,
        user_id: u64,
        page: u32,
        page_size: u32,
    ) -> Result<PaginationResponse<PlanetItem>, UpstreamError> {
        self.record(format!("list_user_planets {} {} {}", user_id, page, page_size))?;
        Ok(PaginationResponse::new(Vec::new(), 0, page, page_size))
    }

    async fn update_user(
        &self,
        user_id: u64,
        req: &AdminUserUpdateRequest,
    ) -> Result<User, UpstreamError> {
        self.record(format!("update_user {}", user_id))?;
        let mut users = self.users.lock();
        let user = users.get_mut(&user_id).ok_or(UpstreamError::Status {
            status: 404,
            message: "user not found".to_string(),
        })?;
        if let Some(name) = &req.username {
            user.username = name.clone();
        }
        if let Some(status) = req.status {
            user.status = status;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: u64) -> Result<(), UpstreamError> {
        self.record(format!("delete_user {}", user_id))?;
        self.users.lock().remove(&user_id);
        Ok(())
    }

    async fn list_configs(&self) -> Result<Vec<AppConfig>, UpstreamError> {
        self.record("list_configs".to_string())?;
        Ok(self.configs.lock().clone())
    }

    async fn upsert_config(
        &self,
        key: &str,
        req: &AppConfigUpsertRequest,
    ) -> Result<AppConfig, UpstreamError> {
        self.record(format!("upsert_config {}", key))?;
        let config = AppConfig {
            id: 1,
            config_key: key.to_string(),
            alias: req.alias.clone(),
            config_value: req.config_value.clone(),
            value_type: req.value_type,
            description: req.description.clone(),
            ..Default::default()
        };
        let mut configs = self.configs.lock();
        configs.retain(|c| c.config_key != key);
        configs.push(config.clone());
        Ok(config)
    }

    async fn delete_config(&self, key: &str) -> Result<(), UpstreamError> {
        self.record(format!("delete_config {}", key))?;
        self.configs.lock().retain(|c| c.config_key != key);
        Ok(())
    }
}

fn issuer() -> TokenIssuer {
    TokenIssuer::new(JwtConfig {
        secret_key: SECRET.to_string(),
        expires_in: Duration::from_secs(3600),
        refresh_expires_in: Duration::from_secs(7200),
    })
}

struct Harness {
    router: Router,
    stellar: Arc<FakeProvider>,
    other: Arc<FakeProvider>,
}

fn harness() -> Harness {
    let auth = AdminAuthService::new(
        AdminAccount {
            username: "stellar_admin".to_string(),
            email: "stellar_admin@local".to_string(),
            password: PASSWORD.to_string(),
        },
        issuer(),
    );

    let stellar = Arc::new(FakeProvider::new("stellar"));
    let other = Arc::new(FakeProvider::new("nebula"));
    let registry = ProviderRegistry::new("stellar");
    registry.register("stellar", stellar.clone());
    registry.register("nebula", other.clone());

    Harness {
        router: api_router(GatewayState::new(auth, registry)),
        stellar,
        other,
    }
}

fn admin_token() -> String {
    issuer()
        .generate_token(1000001, "stellar_admin", "stellar_admin@local", "admin")
        .unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn admin(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token()));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn get(uri: &str) -> Request<Body> {
    admin(Method::GET, uri, None)
}

#[tokio::test]
async fn test_health_is_public() {
    let h = harness();
    let req = Request::get("/api/v1/health").body(Body::empty()).unwrap();
    let (status, body) = send(&h.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["msg"], "ok");
    assert_eq!(body["data"]["service"], "stellar-admin-gateway");
}

#[tokio::test]
async fn test_login() {
    let h = harness();

    let login = |password: &str| {
        Request::post("/api/v1/auth/admin/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "password": password }).to_string()))
            .unwrap()
    };

    let (status, body) = send(&h.router, login("nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);
    assert_eq!(body["msg"], "invalid password");

    let (status, body) = send(&h.router, login(PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["userId"], 1000001);
    assert_eq!(body["data"]["role"], "admin");
    let access = body["data"]["accessToken"].as_str().unwrap();
    assert_eq!(body["data"]["token"], access);
    assert!(!body["data"]["refreshToken"].as_str().unwrap().is_empty());

    let claims = issuer().parse_token(access).unwrap();
    assert_eq!(claims.username, "stellar_admin");
}

#[tokio::test]
async fn test_login_rejects_malformed_body() {
    let h = harness();
    let req = Request::post("/api/v1/auth/admin/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&h.router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Invalid request body");
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let h = harness();

    let req = Request::get("/api/v1/admin/users").body(Body::empty()).unwrap();
    let (status, body) = send(&h.router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Token not provided");

    let req = Request::get("/api/v1/admin/users")
        .header(header::AUTHORIZATION, "Basic abc")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&h.router, req).await;
    assert_eq!(body["msg"], "Invalid token");

    let req = Request::get("/api/v1/admin/users")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Invalid or expired token");

    let foreign = TokenIssuer::new(JwtConfig {
        secret_key: "another-secret".to_string(),
        expires_in: Duration::from_secs(60),
        refresh_expires_in: Duration::from_secs(60),
    })
    .generate_token(1000001, "stellar_admin", "", "admin")
    .unwrap();
    let req = Request::get("/api/v1/admin/users")
        .header(header::AUTHORIZATION, format!("Bearer {}", foreign))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&h.router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(h.stellar.calls.lock().is_empty());
}

#[tokio::test]
async fn test_non_admin_role_is_forbidden() {
    let h = harness();
    let token = issuer().generate_token(42, "viewer", "", "user").unwrap();
    let req = Request::get("/api/v1/admin/configs")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.router, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);
    assert_eq!(body["msg"], "Forbidden");
    assert!(h.stellar.calls.lock().is_empty());
}

#[tokio::test]
async fn test_me_echoes_claims() {
    let h = harness();
    let (status, body) = send(&h.router, get("/api/v1/admin/auth/me")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "userId": 1000001,
            "username": "stellar_admin",
            "email": "stellar_admin@local",
            "role": "admin"
        })
    );
}

#[tokio::test]
async fn test_providers_listed_sorted() {
    let h = harness();
    let (_, body) = send(&h.router, get("/api/v1/admin/providers")).await;
    assert_eq!(body["data"], json!(["nebula", "stellar"]));
}

#[tokio::test]
async fn test_pagination_params_forwarded() {
    let h = harness();

    let (status, body) = send(
        &h.router,
        get("/api/v1/admin/users?page=2&pageSize=500&keyword=%20bob%20"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(
        h.stellar.last_call().as_deref(),
        Some(r#"list_users 2 100 "bob""#)
    );

    send(&h.router, get("/api/v1/admin/users?page=0&page_size=25")).await;
    assert_eq!(
        h.stellar.last_call().as_deref(),
        Some(r#"list_users 1 25 """#)
    );

    send(&h.router, get("/api/v1/admin/users/3/planets?pageSize=abc")).await;
    assert_eq!(
        h.stellar.last_call().as_deref(),
        Some("list_user_planets 3 1 10")
    );
}

#[tokio::test]
async fn test_provider_selection() {
    let h = harness();

    let req = Request::get("/api/v1/admin/configs")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token()))
        .header("X-App-Key", "nebula")
        .body(Body::empty())
        .unwrap();
    send(&h.router, req).await;
    assert_eq!(h.other.last_call().as_deref(), Some("list_configs"));

    send(&h.router, get("/api/v1/admin/configs?app=nebula")).await;
    assert_eq!(h.other.calls.lock().len(), 2);
    assert!(h.stellar.calls.lock().is_empty());

    let (status, body) = send(&h.router, get("/api/v1/admin/configs?app=andromeda")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "provider not found: andromeda");
}

#[tokio::test]
async fn test_upstream_errors_are_mapped() {
    let h = harness();

    *h.stellar.fail_with.lock() = Some(UpstreamError::Status {
        status: 404,
        message: "user not found".to_string(),
    });
    let (status, body) = send(&h.router, get("/api/v1/admin/users")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "user not found");

    *h.stellar.fail_with.lock() = Some(UpstreamError::Status {
        status: 200,
        message: "code 1003".to_string(),
    });
    let (status, body) = send(&h.router, get("/api/v1/admin/users")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], 502);

    *h.stellar.fail_with.lock() = Some(UpstreamError::Internal("connection reset".to_string()));
    let (status, body) = send(&h.router, get("/api/v1/admin/configs")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["msg"], "Internal server error");
}

#[tokio::test]
async fn test_user_mutations() {
    let h = harness();

    let (status, body) = send(
        &h.router,
        admin(
            Method::PUT,
            "/api/v1/admin/users/2",
            Some(json!({ "username": "renamed", "status": "disabled" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "renamed");
    assert_eq!(body["data"]["status"], "disabled");

    let (status, body) = send(&h.router, admin(Method::DELETE, "/api/v1/admin/users/2", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "User deleted successfully");
    assert!(body.get("data").is_none());

    let (status, body) = send(&h.router, admin(Method::DELETE, "/api/v1/admin/users/abc", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Invalid user id");

    let (status, body) = send(
        &h.router,
        admin(Method::PUT, "/api/v1/admin/users/1", Some(json!({ "status": "banned" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Invalid request body");
}

#[tokio::test]
async fn test_config_mutations() {
    let h = harness();

    let (status, body) = send(
        &h.router,
        admin(
            Method::PUT,
            "/api/v1/admin/configs/home%20banner",
            Some(json!({
                "alias": "Banner",
                "configValue": "hello",
                "valueType": "string",
                "description": ""
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["configKey"], "home banner");
    assert_eq!(
        h.stellar.last_call().as_deref(),
        Some("upsert_config home banner")
    );

    let (status, body) = send(
        &h.router,
        admin(Method::DELETE, "/api/v1/admin/configs/%20%20", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Config key is required");

    let (_, body) = send(
        &h.router,
        admin(Method::DELETE, "/api/v1/admin/configs/home%20banner", None),
    )
    .await;
    assert_eq!(body["msg"], "Config deleted successfully");
    assert!(h.stellar.configs.lock().is_empty());
}

#[tokio::test]
async fn test_console_against_gateway() {
    let h = harness();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = h.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let tokens = Arc::new(MemoryTokenStore::new());
    let config = Config::with_api_base(&format!("http://{}/api/v1", addr));
    let api = AdminApi::new(ApiClient::new(&config, tokens.clone()).unwrap());

    let mut session = Session::new(api.clone());
    let err = session.login("wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "invalid password");
    assert_eq!(tokens.get_token(), "");

    assert!(session.login(PASSWORD).await.unwrap().is_ready());
    assert!(!tokens.get_token().is_empty());

    let page = api.list_users(1, 20, "").await.unwrap();
    assert_eq!(page.page.total, 3);
    assert_eq!(page.page.data[0].username, "user1");

    api.delete_user(1).await.unwrap();
    let page = api.list_users(1, 20, "").await.unwrap();
    assert_eq!(page.page.total, 2);
}
