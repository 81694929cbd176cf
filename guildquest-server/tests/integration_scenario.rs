use axum::http::StatusCode;
use guildquest_server::{server, storage};
use guildquest_shared::api::{self, endpoints, rest};
use guildquest_shared::domain::ErrorCode;
use reqwest::Client;
use serde_json::{Value, json};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;

const JWT_SECRET: &str = "testsecret";
const APP_URL: &str = "http://quest.test";
const PASSWORD: &str = "correct-horse";

struct TestServer {
    base: String,
    client: Client,
    handle: tokio::task::JoinHandle<()>,
    _tempdir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn() -> Option<Self> {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let (addr, handle) = match start_server(&db_path).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                eprintln!("Skipping test due to sandbox restrictions: {e}");
                return None;
            }
            Err(e) => panic!("failed to start server: {e}"),
        };
        Some(Self {
            base: format!("http://{}", addr),
            client: Client::new(),
            handle,
            _tempdir: dir,
        })
    }

    /// Registers `email` and returns the access token.
    async fn register(&self, email: &str) -> String {
        let body = self
            .request_expect(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({"email": email, "password": PASSWORD})),
                StatusCode::CREATED,
            )
            .await;
        body["accessToken"]
            .as_str()
            .map(|s| s.to_string())
            .expect("accessToken missing from auth response")
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let url = format!("{}{}", self.base, path);
        let mut req = match method {
            "GET" => self.client.get(&url),
            "POST" => self.client.post(&url),
            "DELETE" => self.client.delete(&url),
            other => panic!("unsupported method {other}"),
        };
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }
        let resp = req.send().await.unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        let text = resp.text().await.unwrap();
        let val = if text.is_empty() {
            json!(null)
        } else {
            serde_json::from_str(&text).unwrap_or(json!({"raw": text}))
        };
        (status, val)
    }

    async fn request_expect(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let (status, value) = self.request(method, path, token, body).await;
        assert_eq!(
            status, expected,
            "{method} {path} returned {status:?} with body {value:?}",
        );
        value
    }

    /// Asserts the status and the stable error code of a failing request.
    async fn expect_error(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
        expected: StatusCode,
        code: ErrorCode,
    ) {
        let value = self.request_expect(method, path, token, body, expected).await;
        assert_eq!(value["code"], code.as_str(), "{method} {path}: {value:?}");
        assert!(value["error"].is_string());
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_server(
    tmp_db: &Path,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), std::io::Error> {
    let config = server::AppConfig {
        jwt_secret: JWT_SECRET.into(),
        app_url: APP_URL.into(),
        bcrypt_cost: 4,
        ..Default::default()
    };

    let store = storage::Store::connect_sqlite(tmp_db.to_str().unwrap())
        .await
        .expect("db");

    let state = server::AppState::new(config, store);
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok((addr, handle))
}

#[tokio::test]
async fn public_endpoints_work() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    server
        .request_expect("GET", "/healthz", None, None, StatusCode::OK)
        .await;
    let health = server
        .request_expect("GET", "/api/v1/health", None, None, StatusCode::OK)
        .await;
    assert_eq!(health["status"], "ok");
    server
        .expect_error(
            "GET",
            "/api/v1/nope",
            None,
            None,
            StatusCode::NOT_FOUND,
            ErrorCode::NotFound,
        )
        .await;
}

#[tokio::test]
async fn register_and_login() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let token = server.register("Hero@Guild.io").await;
    let me = server
        .request_expect("GET", "/api/v1/me", Some(&token), None, StatusCode::OK)
        .await;
    assert_eq!(me["email"], "hero@guild.io");
    assert_eq!(me["gold"], 0);
    assert!(me.get("passwordHash").is_none());

    let login = server
        .request_expect(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "hero@guild.io", "password": PASSWORD})),
            StatusCode::OK,
        )
        .await;
    assert!(login["refreshToken"].is_string());
    assert_eq!(login["user"]["id"], me["id"]);

    server
        .expect_error(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({"email": "hero@guild.io", "password": PASSWORD})),
            StatusCode::CONFLICT,
            ErrorCode::UserExists,
        )
        .await;
    server
        .expect_error(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "hero@guild.io", "password": "wrong-password"})),
            StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidCredentials,
        )
        .await;
    server
        .expect_error(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({"email": "ghost@guild.io", "password": PASSWORD})),
            StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidCredentials,
        )
        .await;
    server
        .expect_error(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({"email": "short@guild.io", "password": "short"})),
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
        )
        .await;
    server
        .expect_error(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({"email": 42})),
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
        )
        .await;
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let id = uuid::Uuid::new_v4();
    let cases: Vec<(&str, String, Option<Value>)> = vec![
        ("GET", "/api/v1/me".into(), None),
        ("GET", "/api/v1/tasks".into(), None),
        ("POST", "/api/v1/tasks".into(), Some(json!({"title": "x"}))),
        ("POST", "/api/v1/tasks/bulk".into(), Some(json!({"tasks": []}))),
        ("POST", format!("/api/v1/tasks/{id}/complete"), None),
        ("DELETE", format!("/api/v1/tasks/{id}"), None),
        ("GET", "/api/v1/pet".into(), None),
        ("POST", "/api/v1/pet/feed".into(), None),
        ("POST", "/api/v1/pet/play".into(), None),
        ("GET", "/api/v1/decorations".into(), None),
        (
            "POST",
            "/api/v1/decorations/buy".into(),
            Some(json!({"decoration": "hat"})),
        ),
        ("POST", "/api/v1/sync".into(), Some(json!({}))),
        ("POST", "/api/v1/invite".into(), Some(json!({"email": "a@b"}))),
    ];

    for (method, path, body) in cases.iter() {
        server
            .expect_error(
                method,
                path,
                None,
                body.clone(),
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
            )
            .await;
        server
            .expect_error(
                method,
                path,
                Some("not-a-jwt"),
                body.clone(),
                StatusCode::UNAUTHORIZED,
                ErrorCode::InvalidToken,
            )
            .await;
    }
}

#[tokio::test]
async fn refresh_and_foreign_tokens_are_rejected() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let auth = server
        .request_expect(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({"email": "hero@guild.io", "password": PASSWORD})),
            StatusCode::CREATED,
        )
        .await;
    let refresh = auth["refreshToken"].as_str().unwrap();
    server
        .expect_error(
            "GET",
            "/api/v1/me",
            Some(refresh),
            None,
            StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken,
        )
        .await;

    let now = chrono::Utc::now().timestamp();
    let forged = guildquest_shared::jwt::encode(
        &guildquest_shared::jwt::JwtClaims {
            sub: auth["user"]["id"].as_str().unwrap().to_string(),
            jti: "j".into(),
            iat: now,
            exp: now + 3600,
            kind: guildquest_shared::jwt::TokenKind::Access,
            email: None,
        },
        b"some-other-secret",
    )
    .unwrap();
    server
        .expect_error(
            "GET",
            "/api/v1/me",
            Some(&forged),
            None,
            StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken,
        )
        .await;

    // Validly signed, but for a user that does not exist.
    let ghost = guildquest_shared::jwt::encode(
        &guildquest_shared::jwt::JwtClaims {
            sub: uuid::Uuid::new_v4().to_string(),
            jti: "j".into(),
            iat: now,
            exp: now + 3600,
            kind: guildquest_shared::jwt::TokenKind::Access,
            email: None,
        },
        JWT_SECRET.as_bytes(),
    )
    .unwrap();
    server
        .expect_error(
            "GET",
            "/api/v1/tasks",
            Some(&ghost),
            None,
            StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken,
        )
        .await;
}

#[tokio::test]
async fn reward_economy_scenario() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let token = server.register("hero@guild.io").await;
    let t = Some(token.as_str());

    // Adopt the pet first so completions feed its progression.
    let pet = server
        .request_expect("GET", "/api/v1/pet", t, None, StatusCode::OK)
        .await;
    assert_eq!(pet["type"], "dragon");
    assert_eq!(pet["level"], 1);
    assert_eq!(pet["hunger"], 100);

    let task = server
        .request_expect(
            "POST",
            "/api/v1/tasks",
            t,
            Some(json!({"title": "Slay the dishes", "reward": 40})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(task["completed"], false);
    let default_reward = server
        .request_expect(
            "POST",
            "/api/v1/tasks",
            t,
            Some(json!({"title": "Sweep"})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(default_reward["reward"], api::DEFAULT_TASK_REWARD);

    let task_id = task["id"].as_str().unwrap();
    let done = server
        .request_expect(
            "POST",
            &format!("/api/v1/tasks/{task_id}/complete"),
            t,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(done["task"]["completed"], true);
    assert_eq!(done["gold"], 40);
    assert_eq!(done["pet"]["exp"], 10);
    assert_eq!(done["pet"]["happiness"], 100);

    server
        .expect_error(
            "POST",
            &format!("/api/v1/tasks/{task_id}/complete"),
            t,
            None,
            StatusCode::CONFLICT,
            ErrorCode::AlreadyCompleted,
        )
        .await;

    let fed = server
        .request_expect("POST", "/api/v1/pet/feed", t, None, StatusCode::OK)
        .await;
    assert_eq!(fed["gold"], 20);
    assert_eq!(fed["pet"]["hunger"], 100);

    let played = server
        .request_expect("POST", "/api/v1/pet/play", t, None, StatusCode::OK)
        .await;
    assert_eq!(played["gold"], 20);
    assert_eq!(played["pet"]["hunger"], 95);

    server
        .expect_error(
            "POST",
            "/api/v1/decorations/buy",
            t,
            Some(json!({"decoration": "hat"})),
            StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientGold,
        )
        .await;

    // Earn enough for a decoration.
    let big = server
        .request_expect(
            "POST",
            "/api/v1/tasks",
            t,
            Some(json!({"title": "Quest", "reward": 100})),
            StatusCode::CREATED,
        )
        .await;
    server
        .request_expect(
            "POST",
            &format!("/api/v1/tasks/{}/complete", big["id"].as_str().unwrap()),
            t,
            None,
            StatusCode::OK,
        )
        .await;

    let bought = server
        .request_expect(
            "POST",
            "/api/v1/decorations/buy",
            t,
            Some(json!({"decoration": "hat"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(bought["gold"], 70);
    assert_eq!(bought["decoration"]["decoration"], "hat");
    server
        .expect_error(
            "POST",
            "/api/v1/decorations/buy",
            t,
            Some(json!({"decoration": "hat"})),
            StatusCode::CONFLICT,
            ErrorCode::AlreadyOwned,
        )
        .await;

    let decorations = server
        .request_expect("GET", "/api/v1/decorations", t, None, StatusCode::OK)
        .await;
    assert_eq!(decorations.as_array().unwrap().len(), 1);

    let me = server
        .request_expect("GET", "/api/v1/me", t, None, StatusCode::OK)
        .await;
    assert_eq!(me["gold"], 70);

    // Deleting does not pay out.
    let sweep_id = default_reward["id"].as_str().unwrap();
    server
        .request_expect(
            "DELETE",
            &format!("/api/v1/tasks/{sweep_id}"),
            t,
            None,
            StatusCode::NO_CONTENT,
        )
        .await;
    server
        .expect_error(
            "DELETE",
            &format!("/api/v1/tasks/{sweep_id}"),
            t,
            None,
            StatusCode::NOT_FOUND,
            ErrorCode::TaskNotFound,
        )
        .await;
    let tasks = server
        .request_expect("GET", "/api/v1/tasks", t, None, StatusCode::OK)
        .await;
    assert_eq!(tasks.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn pet_actions_need_an_adopted_pet() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let token = server.register("hero@guild.io").await;
    let t = Some(token.as_str());

    server
        .expect_error(
            "POST",
            "/api/v1/pet/play",
            t,
            None,
            StatusCode::NOT_FOUND,
            ErrorCode::PetNotFound,
        )
        .await;
    // Funds are checked before the pet.
    server
        .expect_error(
            "POST",
            "/api/v1/pet/feed",
            t,
            None,
            StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientGold,
        )
        .await;

    // Completing without a pet must not adopt one.
    let task = server
        .request_expect(
            "POST",
            "/api/v1/tasks",
            t,
            Some(json!({"title": "Chores", "reward": 25})),
            StatusCode::CREATED,
        )
        .await;
    let done = server
        .request_expect(
            "POST",
            &format!("/api/v1/tasks/{}/complete", task["id"].as_str().unwrap()),
            t,
            None,
            StatusCode::OK,
        )
        .await;
    assert!(done["pet"].is_null());
    let sync = server
        .request_expect("POST", "/api/v1/sync", t, Some(json!({})), StatusCode::OK)
        .await;
    assert!(sync["pet"].is_null());

    server
        .expect_error(
            "POST",
            "/api/v1/pet/feed",
            t,
            None,
            StatusCode::NOT_FOUND,
            ErrorCode::PetNotFound,
        )
        .await;
    let me = server
        .request_expect("GET", "/api/v1/me", t, None, StatusCode::OK)
        .await;
    assert_eq!(me["gold"], 25);
}

#[tokio::test]
async fn tasks_are_private_to_their_owner() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let owner = server.register("owner@guild.io").await;
    let rogue = server.register("rogue@guild.io").await;

    let task = server
        .request_expect(
            "POST",
            "/api/v1/tasks",
            Some(&owner),
            Some(json!({"title": "Mine"})),
            StatusCode::CREATED,
        )
        .await;
    let id = task["id"].as_str().unwrap();

    server
        .expect_error(
            "POST",
            &format!("/api/v1/tasks/{id}/complete"),
            Some(&rogue),
            None,
            StatusCode::FORBIDDEN,
            ErrorCode::Forbidden,
        )
        .await;
    server
        .expect_error(
            "DELETE",
            &format!("/api/v1/tasks/{id}"),
            Some(&rogue),
            None,
            StatusCode::FORBIDDEN,
            ErrorCode::Forbidden,
        )
        .await;
    server
        .expect_error(
            "POST",
            "/api/v1/tasks/not-a-uuid/complete",
            Some(&rogue),
            None,
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
        )
        .await;

    let rogue_tasks = server
        .request_expect("GET", "/api/v1/tasks", Some(&rogue), None, StatusCode::OK)
        .await;
    assert!(rogue_tasks.as_array().unwrap().is_empty());
    let owner_tasks = server
        .request_expect("GET", "/api/v1/tasks", Some(&owner), None, StatusCode::OK)
        .await;
    assert_eq!(owner_tasks[0]["completed"], false);
}

#[tokio::test]
async fn bulk_create_is_all_or_nothing() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let token = server.register("hero@guild.io").await;
    let t = Some(token.as_str());

    server
        .expect_error(
            "POST",
            "/api/v1/tasks/bulk",
            t,
            Some(json!({"tasks": [{"title": "ok"}, {"title": "  "}]})),
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
        )
        .await;
    server
        .expect_error(
            "POST",
            "/api/v1/tasks/bulk",
            t,
            Some(json!({"tasks": [{"title": "ok"}, {"title": "rich", "reward": i32::MAX}]})),
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
        )
        .await;
    let tasks = server
        .request_expect("GET", "/api/v1/tasks", t, None, StatusCode::OK)
        .await;
    assert!(tasks.as_array().unwrap().is_empty());

    let created = server
        .request_expect(
            "POST",
            "/api/v1/tasks/bulk",
            t,
            Some(json!({"tasks": [
                {"title": "one", "reward": 5},
                {"title": "two", "description": "second"}
            ]})),
            StatusCode::CREATED,
        )
        .await;
    let created = created.as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(created[1]["description"], "second");
    assert_eq!(created[1]["reward"], 10);
}

#[tokio::test]
async fn sync_returns_deltas_since_watermark() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let token = server.register("hero@guild.io").await;
    let t = Some(token.as_str());

    server
        .request_expect(
            "POST",
            "/api/v1/tasks",
            t,
            Some(json!({"title": "first"})),
            StatusCode::CREATED,
        )
        .await;
    server
        .request_expect("GET", "/api/v1/pet", t, None, StatusCode::OK)
        .await;

    let full = server
        .request_expect("POST", "/api/v1/sync", t, Some(json!({})), StatusCode::OK)
        .await;
    assert_eq!(full["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(full["pet"]["type"], "dragon");
    assert_eq!(full["user"]["email"], "hero@guild.io");
    let mark = full["syncedAt"].as_str().unwrap().to_string();

    let empty = server
        .request_expect(
            "POST",
            "/api/v1/sync",
            t,
            Some(json!({"lastSyncAt": mark})),
            StatusCode::OK,
        )
        .await;
    assert!(empty["tasks"].as_array().unwrap().is_empty());
    assert!(empty["decorations"].as_array().unwrap().is_empty());
    assert!(empty["user"].is_object());

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = server
        .request_expect(
            "POST",
            "/api/v1/tasks",
            t,
            Some(json!({"title": "second"})),
            StatusCode::CREATED,
        )
        .await;
    let delta = server
        .request_expect(
            "POST",
            "/api/v1/sync",
            t,
            Some(json!({"lastSyncAt": mark})),
            StatusCode::OK,
        )
        .await;
    let tasks = delta["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], second["id"]);
}

#[tokio::test]
async fn invites_round_trip_and_render_qr() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let token = server.register("hero@guild.io").await;

    let invite = server
        .request_expect(
            "POST",
            "/api/v1/invite",
            Some(&token),
            Some(json!({"email": " Friend@Guild.io "})),
            StatusCode::OK,
        )
        .await;
    let invite_token = invite["token"].as_str().unwrap();
    assert_eq!(
        invite["inviteUrl"],
        endpoints::invite_landing(APP_URL, invite_token)
    );
    assert_eq!(
        invite["qrCodeUrl"],
        endpoints::invite_qr(APP_URL, invite_token)
    );

    let details = server
        .request_expect(
            "GET",
            &format!("/api/v1/invite/{invite_token}"),
            None,
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(details["email"], "friend@guild.io");

    let resp = server
        .client
        .get(endpoints::invite_qr(&server.base, invite_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    let png = resp.bytes().await.unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

    // An access token is not an invite.
    server
        .expect_error(
            "GET",
            &format!("/api/v1/invite/{token}/qr"),
            None,
            None,
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidInvite,
        )
        .await;
    let tampered = format!("{invite_token}x");
    server
        .expect_error(
            "GET",
            &format!("/api/v1/invite/{tampered}"),
            None,
            None,
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidInvite,
        )
        .await;
}

#[tokio::test]
async fn rest_client_drives_the_api() {
    let Some(server) = TestServer::spawn().await else {
        return;
    };
    let base = server.base.as_str();
    let auth = rest::register(
        base,
        &api::RegisterReq {
            email: "client@guild.io".into(),
            password: PASSWORD.into(),
        },
    )
    .await
    .unwrap();
    let bearer = auth.access_token.as_str();

    let pet = rest::get_pet(base, bearer).await.unwrap();
    assert_eq!(pet.species, "dragon");

    let created = rest::create_tasks_bulk(
        base,
        bearer,
        &api::BulkTaskReq {
            tasks: vec![api::CreateTaskReq {
                title: "Polish armor".into(),
                description: None,
                reward: 60,
            }],
        },
    )
    .await
    .unwrap();
    let done = rest::complete_task(base, bearer, created[0].id)
        .await
        .unwrap();
    assert_eq!(done.gold, 60);

    let err = rest::complete_task(base, bearer, created[0].id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::AlreadyCompleted));

    let bought = rest::buy_decoration(base, bearer, "banner").await.unwrap();
    assert_eq!(bought.gold, 10);
    let err = rest::feed_pet(base, bearer).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InsufficientGold));

    let snap = rest::sync(base, bearer, None).await.unwrap();
    assert_eq!(snap.tasks.len(), 1);
    assert_eq!(snap.decorations.len(), 1);
    assert_eq!(snap.user.map(|u| u.gold), Some(10));
    let delta = rest::sync(base, bearer, Some(snap.synced_at)).await.unwrap();
    assert!(delta.tasks.is_empty());

    let me = rest::me(base, bearer).await.unwrap();
    assert_eq!(me.email, "client@guild.io");
}
