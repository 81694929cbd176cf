//! Minimal REST client helpers for consumers (clients).

use super::endpoints as ep;
use super::*;
use once_cell::sync::Lazy;
use std::time::Duration;

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status {
        status: u16,
        /// Parsed from the error body when the server sent one.
        code: Option<ErrorCode>,
        body: String,
    },
    #[error("serde: {0}")]
    Serde(String),
}

impl RestError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            RestError::Status { code, .. } => *code,
            _ => None,
        }
    }
}

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .tcp_keepalive(Some(Duration::from_secs(180)))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(180))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build HTTP client")
});

fn client() -> reqwest::Client {
    HTTP_CLIENT.clone()
}

async fn status_error(res: reqwest::Response) -> RestError {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    let code = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|b| b.code);
    RestError::Status { status, code, body }
}

async fn handle_json<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
) -> Result<T, RestError> {
    if !res.status().is_success() {
        return Err(status_error(res).await);
    }
    res.json::<T>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))
}

async fn handle_empty(res: reqwest::Response) -> Result<(), RestError> {
    if res.status().is_success() {
        Ok(())
    } else {
        Err(status_error(res).await)
    }
}

async fn send(req: reqwest::RequestBuilder) -> Result<reqwest::Response, RestError> {
    req.send().await.map_err(|e| RestError::Http(e.to_string()))
}

pub async fn register(base: &str, req: &RegisterReq) -> Result<AuthResp, RestError> {
    let res = send(client().post(ep::auth_register(base)).json(req)).await?;
    handle_json(res).await
}

pub async fn login(base: &str, req: &LoginReq) -> Result<AuthResp, RestError> {
    let res = send(client().post(ep::auth_login(base)).json(req)).await?;
    handle_json(res).await
}

pub async fn me(base: &str, bearer: &str) -> Result<UserDto, RestError> {
    let res = send(client().get(ep::me(base)).bearer_auth(bearer)).await?;
    handle_json(res).await
}

pub async fn list_tasks(base: &str, bearer: &str) -> Result<Vec<TaskDto>, RestError> {
    let res = send(client().get(ep::tasks(base)).bearer_auth(bearer)).await?;
    handle_json(res).await
}

pub async fn create_task(
    base: &str,
    bearer: &str,
    req: &CreateTaskReq,
) -> Result<TaskDto, RestError> {
    let res = send(client().post(ep::tasks(base)).bearer_auth(bearer).json(req)).await?;
    handle_json(res).await
}

pub async fn create_tasks_bulk(
    base: &str,
    bearer: &str,
    req: &BulkTaskReq,
) -> Result<Vec<TaskDto>, RestError> {
    let res = send(
        client()
            .post(ep::tasks_bulk(base))
            .bearer_auth(bearer)
            .json(req),
    )
    .await?;
    handle_json(res).await
}

pub async fn complete_task(
    base: &str,
    bearer: &str,
    task_id: Uuid,
) -> Result<CompleteTaskResp, RestError> {
    let res = send(
        client()
            .post(ep::task_complete(base, task_id))
            .bearer_auth(bearer),
    )
    .await?;
    handle_json(res).await
}

pub async fn delete_task(base: &str, bearer: &str, task_id: Uuid) -> Result<(), RestError> {
    let res = send(client().delete(ep::task(base, task_id)).bearer_auth(bearer)).await?;
    handle_empty(res).await
}

pub async fn get_pet(base: &str, bearer: &str) -> Result<PetDto, RestError> {
    let res = send(client().get(ep::pet(base)).bearer_auth(bearer)).await?;
    handle_json(res).await
}

pub async fn feed_pet(base: &str, bearer: &str) -> Result<PetActionResp, RestError> {
    let res = send(client().post(ep::pet_feed(base)).bearer_auth(bearer)).await?;
    handle_json(res).await
}

pub async fn play_with_pet(base: &str, bearer: &str) -> Result<PetActionResp, RestError> {
    let res = send(client().post(ep::pet_play(base)).bearer_auth(bearer)).await?;
    handle_json(res).await
}

pub async fn list_decorations(base: &str, bearer: &str) -> Result<Vec<DecorationDto>, RestError> {
    let res = send(client().get(ep::decorations(base)).bearer_auth(bearer)).await?;
    handle_json(res).await
}

pub async fn buy_decoration(
    base: &str,
    bearer: &str,
    decoration: &str,
) -> Result<BuyDecorationResp, RestError> {
    let body = BuyDecorationReq {
        decoration: decoration.to_string(),
    };
    let res = send(
        client()
            .post(ep::decorations_buy(base))
            .bearer_auth(bearer)
            .json(&body),
    )
    .await?;
    handle_json(res).await
}

/// Pulls everything changed since `last_sync_at` (or everything, when `None`).
///
/// Overlay the returned records onto the local cache by id; the server value
/// wins. Deleted tasks are not reported.
pub async fn sync(
    base: &str,
    bearer: &str,
    last_sync_at: Option<DateTime<Utc>>,
) -> Result<SyncResp, RestError> {
    let body = SyncReq { last_sync_at };
    let res = send(client().post(ep::sync(base)).bearer_auth(bearer).json(&body)).await?;
    handle_json(res).await
}

pub async fn create_invite(
    base: &str,
    bearer: &str,
    email: &str,
) -> Result<InviteResp, RestError> {
    let body = InviteReq {
        email: email.to_string(),
    };
    let res = send(
        client()
            .post(ep::invite_create(base))
            .bearer_auth(bearer)
            .json(&body),
    )
    .await?;
    handle_json(res).await
}
