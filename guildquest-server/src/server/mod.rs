pub mod auth;
mod config;
mod invite;

use crate::game::{Game, GameError};
use crate::server::auth::AuthCtx;
use crate::storage::{Store, StorageError};
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::{IntoResponse, Response as AxumResponse};
use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::{Method, StatusCode, header},
    routing::{delete, get, post},
};
pub use config::{AppConfig, ConfigError, DEFAULT_PORT, Environment};
use guildquest_shared::api;
use guildquest_shared::domain::ErrorCode;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Span, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    pub game: Game<Store>,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        let game = Game::new(store.clone(), config.game_settings());
        Self {
            config,
            store,
            game,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

pub fn router(state: AppState) -> Router {
    let v1 = api::API_V1_PREFIX;
    let private = Router::new()
        .route(&format!("{v1}/me"), get(api_me))
        .route(&format!("{v1}/auth/me"), get(api_me))
        .route(&format!("{v1}/tasks"), get(api_list_tasks).post(api_create_task))
        .route(&format!("{v1}/tasks/bulk"), post(api_create_tasks_bulk))
        .route(&format!("{v1}/tasks/{{id}}"), delete(api_delete_task))
        .route(&format!("{v1}/tasks/{{id}}/complete"), post(api_complete_task))
        .route(&format!("{v1}/pet"), get(api_get_pet))
        .route(&format!("{v1}/pet/feed"), post(api_feed_pet))
        .route(&format!("{v1}/pet/play"), post(api_play_with_pet))
        .route(&format!("{v1}/decorations"), get(api_list_decorations))
        .route(&format!("{v1}/decorations/buy"), post(api_buy_decoration))
        .route(&format!("{v1}/sync"), post(api_sync))
        .route(&format!("{v1}/invite"), post(invite::create_invite))
        .with_state(state.clone())
        .layer(middleware::from_fn(set_auth_span_fields))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            user_id = tracing::field::Empty
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .route(&format!("{v1}/health"), get(api_health))
        .route(&format!("{v1}/auth/register"), post(api_auth_register))
        .route(&format!("{v1}/auth/login"), post(api_auth_login))
        .route(&format!("{v1}/invite/{{token}}"), get(invite::get_invite))
        .route(&format!("{v1}/invite/{{token}}/qr"), get(invite::get_invite_qr))
        .merge(private)
        .fallback(api_not_found)
        .with_state(state.clone())
        .layer(trace)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured
    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn api_health() -> Json<api::HealthDto> {
    Json(api::HealthDto {
        status: "ok".into(),
    })
}

async fn api_not_found() -> AppError {
    AppError::NotFound
}

fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> AxumResponse {
    AppError::Internal("handler panicked".into()).into_response()
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // Balances and tokens must never be cached
    if path == "/healthz" || path.starts_with("/api/") {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(
            HeaderName::from_static("pragma"),
            HeaderValue::from_static("no-cache"),
        );
    }

    Ok(resp)
}

async fn set_auth_span_fields(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    if let Some(auth) = req.extensions().get::<AuthCtx>() {
        Span::current().record("user_id", tracing::field::display(&auth.user_id));
    }
    Ok(next.run(req).await)
}

fn parse_task_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("invalid task id: {raw}")))
}

fn auth_response(
    state: &AppState,
    user: crate::storage::models::User,
) -> Result<api::AuthResp, AppError> {
    let tokens = auth::issue_token_pair(state, &user.id)?;
    Ok(api::AuthResp {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: user.to_dto()?,
    })
}

async fn api_auth_register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<api::RegisterReq>,
) -> Result<(StatusCode, Json<api::AuthResp>), AppError> {
    let user = state
        .game
        .accounts
        .register(&body.email, &body.password)
        .await?;
    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

async fn api_auth_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<api::LoginReq>,
) -> Result<Json<api::AuthResp>, AppError> {
    let user = state
        .game
        .accounts
        .authenticate(&body.email, &body.password)
        .await?;
    tracing::info!(user_id = %user.id, "login succeeded");
    Ok(Json(auth_response(&state, user)?))
}

async fn api_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<api::UserDto>, AppError> {
    let user = state.game.accounts.find(auth.user_id).await?;
    Ok(Json(user.to_dto()?))
}

async fn api_list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<api::TaskDto>>, AppError> {
    let rows = state.game.tasks.list(auth.user_id).await?;
    let items = rows
        .iter()
        .map(|t| t.to_dto())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

async fn api_create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    ApiJson(body): ApiJson<api::CreateTaskReq>,
) -> Result<(StatusCode, Json<api::TaskDto>), AppError> {
    let task = state.game.tasks.create(auth.user_id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(task.to_dto()?)))
}

async fn api_create_tasks_bulk(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    ApiJson(body): ApiJson<api::BulkTaskReq>,
) -> Result<(StatusCode, Json<Vec<api::TaskDto>>), AppError> {
    let specs = body.tasks.into_iter().map(Into::into).collect();
    let rows = state.game.tasks.create_bulk(auth.user_id, specs).await?;
    let items = rows
        .iter()
        .map(|t| t.to_dto())
        .collect::<Result<Vec<_>, _>>()?;
    Ok((StatusCode::CREATED, Json(items)))
}

async fn api_complete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<String>,
) -> Result<Json<api::CompleteTaskResp>, AppError> {
    let task_id = parse_task_id(&id)?;
    let done = state.game.tasks.complete(auth.user_id, task_id).await?;
    Ok(Json(api::CompleteTaskResp {
        task: done.task.to_dto()?,
        gold: done.gold,
        pet: done.pet.as_ref().map(|p| p.to_dto()).transpose()?,
    }))
}

async fn api_delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let task_id = parse_task_id(&id)?;
    state.game.tasks.delete(auth.user_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn api_get_pet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<api::PetDto>, AppError> {
    let pet = state.game.pets.get(auth.user_id).await?;
    Ok(Json(pet.to_dto()?))
}

async fn api_feed_pet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<api::PetActionResp>, AppError> {
    let out = state.game.pets.feed(auth.user_id).await?;
    Ok(Json(api::PetActionResp {
        pet: out.pet.to_dto()?,
        gold: out.gold,
    }))
}

async fn api_play_with_pet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<api::PetActionResp>, AppError> {
    let out = state.game.pets.play(auth.user_id).await?;
    Ok(Json(api::PetActionResp {
        pet: out.pet.to_dto()?,
        gold: out.gold,
    }))
}

async fn api_list_decorations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<api::DecorationDto>>, AppError> {
    let rows = state.game.decorations.list(auth.user_id).await?;
    let items = rows
        .iter()
        .map(|d| d.to_dto())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

async fn api_buy_decoration(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    ApiJson(body): ApiJson<api::BuyDecorationReq>,
) -> Result<Json<api::BuyDecorationResp>, AppError> {
    let bought = state
        .game
        .decorations
        .buy(auth.user_id, &body.decoration)
        .await?;
    Ok(Json(api::BuyDecorationResp {
        decoration: bought.decoration.to_dto()?,
        gold: bought.gold,
    }))
}

async fn api_sync(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    ApiJson(body): ApiJson<api::SyncReq>,
) -> Result<Json<api::SyncResp>, AppError> {
    let snap = state.game.sync.sync(auth.user_id, body.last_sync_at).await?;
    Ok(Json(api::SyncResp {
        tasks: snap
            .tasks
            .iter()
            .map(|t| t.to_dto())
            .collect::<Result<Vec<_>, _>>()?,
        decorations: snap
            .decorations
            .iter()
            .map(|d| d.to_dto())
            .collect::<Result<Vec<_>, _>>()?,
        pet: snap.pet.as_ref().map(|p| p.to_dto()).transpose()?,
        user: snap.user.as_ref().map(|u| u.to_dto()).transpose()?,
        synced_at: snap.synced_at,
    }))
}

#[derive(Debug)]
pub enum AppError {
    Game(GameError),
    /// No credentials were presented.
    Unauthorized,
    /// Credentials were presented but rejected.
    InvalidToken,
    InvalidInvite,
    Validation(String),
    NotFound,
    Internal(String),
}

impl AppError {
    fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<GameError> for AppError {
    fn from(e: GameError) -> Self {
        Self::Game(e)
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        Self::Game(GameError::Storage(e))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

fn game_status(e: &GameError) -> StatusCode {
    match e {
        GameError::Validation(_) | GameError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
        GameError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        GameError::Forbidden => StatusCode::FORBIDDEN,
        GameError::TaskNotFound | GameError::PetNotFound | GameError::UserNotFound => {
            StatusCode::NOT_FOUND
        }
        GameError::AlreadyCompleted | GameError::AlreadyOwned(_) | GameError::UserExists => {
            StatusCode::CONFLICT
        }
        GameError::Storage(_) | GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, msg) = match self {
            AppError::Game(e) => (game_status(&e), e.code(), e.to_string()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "authorization required".into(),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorCode::InvalidToken,
                "invalid or expired token".into(),
            ),
            AppError::InvalidInvite => (
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidInvite,
                "invalid or expired invite".into(),
            ),
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed, m),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                "no such route".into(),
            ),
            AppError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal, m),
        };
        let msg = if status.is_server_error() {
            // Do not leak internal error details to clients, but log them
            tracing::error!(status = %status, code = %code, detail = %msg, "request failed");
            "internal server error".to_string()
        } else {
            tracing::warn!(status = %status, code = %code, message = %msg, "request failed");
            msg
        };
        let body = axum::Json(api::ErrorBody { error: msg, code });
        (status, body).into_response()
    }
}
