use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use shopgate_api::AppConfig;
use shopgate_api::app::{AppServices, build_app_with};
use shopgate_auth::{Argon2PasswordHasher, Role};
use shopgate_core::{Clock, ManualClock, UserId};
use shopgate_infra::{InMemorySessionRepository, InMemoryUserRepository, NewUser, UserRecord};

const SECRET: &str = "black-box-secret";
const PASSWORD: &str = "correct horse battery staple";

struct TestServer {
    base_url: String,
    clock: Arc<ManualClock>,
    services: AppServices,
    sessions: Arc<InMemorySessionRepository>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let sessions = Arc::new(InMemorySessionRepository::new());
        let config = AppConfig::new(SECRET.as_bytes().to_vec());

        // Cheap Argon2 parameters keep the suite fast.
        let services = AppServices::new(
            &config,
            Arc::new(InMemoryUserRepository::new()),
            sessions.clone(),
            clock.clone(),
        )
        .unwrap()
        .with_hasher(Arc::new(Argon2PasswordHasher::with_cost(8, 1).unwrap()));

        // Same router as prod, bound to an ephemeral port.
        let app = build_app_with(services.clone()).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            clock,
            services,
            sessions,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Insert a user directly into the system of record.
    async fn seed(&self, email: &str, role: Role) -> UserRecord {
        let hashed_password = self.services.hasher.hash(PASSWORD).unwrap();
        let username = email.split('@').next().unwrap().to_string();
        self.services
            .users
            .create(
                NewUser {
                    email: email.to_string(),
                    username,
                    hashed_password,
                    role,
                },
                self.clock.now(),
            )
            .await
            .unwrap()
    }

    fn credential(&self, user_id: UserId, role: &Role) -> String {
        self.services.codec.issue(user_id, role).unwrap()
    }

    async fn get_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn start_session(&self, email: &str) -> (reqwest::Response, String) {
        let res = self
            .client
            .post(self.url("/api/sessions"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .unwrap();
        let cookie = res
            .headers()
            .get("set-cookie")
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        (res, cookie)
    }

    async fn session_request(&self, method: reqwest::Method, token: &str) -> reqwest::Response {
        self.client
            .request(method, self.url("/api/sessions"))
            .header("cookie", format!("session_token={token}"))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn cookie_token(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("session_token="))
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    for header in ["Token abc", "Bearer", "Bearer a b", "Bearer  abc"] {
        let res = srv
            .client
            .get(srv.url("/whoami"))
            .header("authorization", header)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {header:?}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "invalid token, expects bearer token");
    }
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() {
    let srv = TestServer::spawn().await;
    let user = srv.seed("casey@shop.test", Role::USER).await;
    let token = srv.credential(user.id, &Role::USER);

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header("authorization", format!("bEaReR {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_login_and_whoami() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/auth/register"))
        .json(&json!({
            "email": "ada@shop.test",
            "username": "ada",
            "password": PASSWORD,
            "role": "user",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["role"], "user");
    assert!(created.get("hashed_password").is_none());
    let id = created["id"].as_i64().unwrap();

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "ada@shop.test", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    let res = srv.get_with_bearer("/whoami", &token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let whoami: Value = res.json().await.unwrap();
    assert_eq!(whoami["user_id"].as_i64().unwrap(), id);
    assert_eq!(whoami["role"], "user");

    let res = srv.get_with_bearer("/users/me", &token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["email"], "ada@shop.test");
}

#[tokio::test]
async fn bad_login_does_not_reveal_which_part_failed() {
    let srv = TestServer::spawn().await;
    srv.seed("bob@shop.test", Role::USER).await;

    let mut bodies = Vec::new();
    for (email, password) in [("bob@shop.test", "wrong"), ("nobody@shop.test", PASSWORD)] {
        let res = srv
            .client
            .post(srv.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        bodies.push(res.json::<Value>().await.unwrap());
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[0]["message"], "incorrect email or password");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let srv = TestServer::spawn().await;
    srv.seed("dup@shop.test", Role::USER).await;

    let res = srv
        .client
        .post(srv.url("/auth/register"))
        .json(&json!({
            "email": "dup@shop.test",
            "username": "someone-else",
            "password": PASSWORD,
            "role": "user",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "email already exists");
}

#[tokio::test]
async fn registering_an_admin_requires_an_admin() {
    let srv = TestServer::spawn().await;
    let admin = srv.seed("root@shop.test", Role::ADMIN).await;
    let user = srv.seed("eve@shop.test", Role::USER).await;

    let register = |n: u32| {
        json!({
            "email": format!("new{n}@shop.test"),
            "username": format!("new{n}"),
            "password": PASSWORD,
            "role": "admin",
        })
    };

    let res = srv
        .client
        .post(srv.url("/auth/register"))
        .json(&register(1))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .post(srv.url("/auth/register"))
        .bearer_auth(srv.credential(user.id, &Role::USER))
        .json(&register(2))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .post(srv.url("/auth/register"))
        .bearer_auth(srv.credential(admin.id, &Role::ADMIN))
        .json(&register(3))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn user_42_is_forbidden_and_admin_1_is_admitted() {
    let srv = TestServer::spawn().await;
    let admin = srv.seed("admin@shop.test", Role::ADMIN).await;
    assert_eq!(admin.id, UserId::new(1));

    let mut last = admin.clone();
    for n in 2..=42 {
        last = srv.seed(&format!("user{n}@shop.test"), Role::USER).await;
    }
    assert_eq!(last.id, UserId::new(42));

    let user_token = srv.credential(UserId::new(42), &Role::USER);
    let res = srv.get_with_bearer("/admin/users", &user_token).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let admin_token = srv.credential(UserId::new(1), &Role::ADMIN);
    let res = srv.get_with_bearer("/admin/users", &admin_token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let users: Value = res.json().await.unwrap();
    assert_eq!(users.as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn stored_role_overrides_credential_role() {
    let srv = TestServer::spawn().await;
    let admin = srv.seed("root@shop.test", Role::ADMIN).await;
    let user = srv.seed("mallory@shop.test", Role::USER).await;
    let admin_token = srv.credential(admin.id, &Role::ADMIN);

    // Issued while the stored role is "user".
    let user_token = srv.credential(user.id, &Role::USER);
    assert_eq!(
        srv.get_with_bearer("/admin/users", &user_token).await.status(),
        StatusCode::FORBIDDEN
    );

    let promote = srv
        .client
        .put(srv.url(&format!("/admin/users/{}/role", user.id)))
        .bearer_auth(&admin_token)
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(promote.status(), StatusCode::OK);

    // Same credential, still claiming "user", now admitted.
    assert_eq!(
        srv.get_with_bearer("/admin/users", &user_token).await.status(),
        StatusCode::OK
    );

    // Demoting the original admin revokes access despite its credential.
    let demote = srv
        .client
        .put(srv.url(&format!("/admin/users/{}/role", admin.id)))
        .bearer_auth(&user_token)
        .json(&json!({ "role": "user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(demote.status(), StatusCode::OK);
    assert_eq!(
        srv.get_with_bearer("/admin/users", &admin_token).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn unknown_user_looks_like_any_other_unauthorized() {
    let srv = TestServer::spawn().await;

    let ghost = srv.credential(UserId::new(999), &Role::ADMIN);
    let res = srv.get_with_bearer("/admin/users", &ghost).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let ghost_body: Value = res.json().await.unwrap();

    let res = srv.get_with_bearer("/admin/users", "not.a.credential").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let garbage_body: Value = res.json().await.unwrap();

    assert_eq!(ghost_body, garbage_body);

    let res = srv.get_with_bearer("/users/me", &ghost).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.json::<Value>().await.unwrap(), garbage_body);
}

#[tokio::test]
async fn credential_expires_after_thirty_minutes() {
    let srv = TestServer::spawn().await;
    let user = srv.seed("tick@shop.test", Role::USER).await;
    let token = srv.credential(user.id, &Role::USER);

    srv.clock.advance(Duration::minutes(29));
    assert_eq!(srv.get_with_bearer("/whoami", &token).await.status(), StatusCode::OK);

    srv.clock.advance(Duration::minutes(1) + Duration::seconds(1));
    assert_eq!(
        srv.get_with_bearer("/whoami", &token).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn credential_signed_with_another_key_is_rejected() {
    let srv = TestServer::spawn().await;
    let admin = srv.seed("root@shop.test", Role::ADMIN).await;

    let now = srv.clock.now().timestamp();
    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "sub": admin.id.to_string(),
            "role": "admin",
            "iat": now,
            "exp": now + 600,
        }),
        &EncodingKey::from_secret(b"someone-elses-key"),
    )
    .expect("failed to encode jwt");

    assert_eq!(
        srv.get_with_bearer("/admin/users", &forged).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn session_cookie_lifecycle() {
    let srv = TestServer::spawn().await;
    srv.seed("sam@shop.test", Role::USER).await;

    let (res, set_cookie) = srv.start_session("sam@shop.test").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    for attr in ["Path=/", "Max-Age=86400", "HttpOnly", "Secure"] {
        assert!(set_cookie.contains(attr), "missing {attr} in {set_cookie}");
    }
    let created: Value = res.json().await.unwrap();
    let token = cookie_token(&set_cookie);
    assert_eq!(created["token"], token.as_str());

    let res = srv.session_request(reqwest::Method::GET, &token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["user_id"], created["user_id"]);
    assert_eq!(fetched["expires_at"], created["expires_at"]);

    let res = srv.session_request(reqwest::Method::DELETE, &token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cleared = res.headers()["set-cookie"].to_str().unwrap().to_string();
    assert!(cleared.starts_with("session_token=;"));
    assert!(cleared.contains("Max-Age=0"));

    assert_eq!(
        srv.session_request(reqwest::Method::GET, &token).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        srv.session_request(reqwest::Method::DELETE, &token).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn session_for_user_7_is_evicted_after_24_hours() {
    let srv = TestServer::spawn().await;
    let mut last = None;
    for n in 1..=7 {
        last = Some(srv.seed(&format!("u{n}@shop.test"), Role::USER).await);
    }
    assert_eq!(last.unwrap().id, UserId::new(7));

    let (res, set_cookie) = srv.start_session("u7@shop.test").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let token = cookie_token(&set_cookie);
    assert_eq!(srv.sessions.len(), 1);

    srv.clock.advance(Duration::hours(24) + Duration::seconds(1));

    let res = srv.session_request(reqwest::Method::GET, &token).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(srv.sessions.is_empty());

    // Already gone, so a logout finds nothing.
    assert_eq!(
        srv.session_request(reqwest::Method::DELETE, &token).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn session_endpoints_require_a_cookie() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/sessions")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.client.delete(srv.url("/api/sessions")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_cookie_does_not_authenticate_bearer_routes() {
    let srv = TestServer::spawn().await;
    srv.seed("cookie@shop.test", Role::USER).await;
    let (_, set_cookie) = srv.start_session("cookie@shop.test").await;
    let token = cookie_token(&set_cookie);

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header("cookie", format!("session_token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_lookup_validates_id() {
    let srv = TestServer::spawn().await;
    let user = srv.seed("look@shop.test", Role::USER).await;
    let token = srv.credential(user.id, &Role::USER);

    let res = srv.get_with_bearer("/users/abc", &token).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv.get_with_bearer("/users/404", &token).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .get_with_bearer(&format!("/users/{}", user.id), &token)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn role_update_validates_input() {
    let srv = TestServer::spawn().await;
    let admin = srv.seed("root@shop.test", Role::ADMIN).await;
    let token = srv.credential(admin.id, &Role::ADMIN);

    let res = srv
        .client
        .put(srv.url(&format!("/admin/users/{}/role", admin.id)))
        .bearer_auth(&token)
        .json(&json!({ "role": "superuser" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .put(srv.url("/admin/users/999/role"))
        .bearer_auth(&token)
        .json(&json!({ "role": "user" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
