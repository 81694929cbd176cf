use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Duration;
use guildquest_shared::domain::now_utc;
use guildquest_shared::jwt::{self, JwtClaims, TokenKind};
use tracing::{error, warn};
use uuid::Uuid;

use super::{AppError, AppState};
use crate::game::UserRepository;

/// Lifetime of an access token.
const ACCESS_TOKEN_TTL_HOURS: i64 = 1;
/// Lifetime of a refresh token.
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;
/// Lifetime of an invite token.
const INVITE_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone, Debug)]
pub struct AuthCtx {
    pub user_id: Uuid,
    pub claims: JwtClaims,
}

pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(header_val) = req.headers().get(header::AUTHORIZATION) else {
        return Err(AppError::Unauthorized);
    };
    let token = header_val
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::InvalidToken)?;

    let claims = jwt::decode_and_verify(token, state.config.jwt_secret.as_bytes()).map_err(|e| {
        warn!(error = %e, "auth: jwt decode failed");
        AppError::InvalidToken
    })?;
    if claims.kind != TokenKind::Access {
        warn!(kind = ?claims.kind, sub = %claims.sub, "auth: wrong token kind");
        return Err(AppError::InvalidToken);
    }
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        warn!(sub = %claims.sub, "auth: subject is not a user id");
        AppError::InvalidToken
    })?;

    match state.store.find_user(user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!(user_id = %user_id, "auth: token for unknown user");
            return Err(AppError::InvalidToken);
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "auth: user lookup failed");
            return Err(AppError::internal(e));
        }
    }

    req.extensions_mut().insert(AuthCtx { user_id, claims });
    Ok(next.run(req).await)
}

fn sign(
    state: &AppState,
    sub: String,
    kind: TokenKind,
    ttl: Duration,
    email: Option<String>,
) -> Result<String, AppError> {
    let now = now_utc();
    let claims = JwtClaims {
        sub,
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        kind,
        email,
    };
    jwt::encode(&claims, state.config.jwt_secret.as_bytes()).map_err(|e| {
        error!(kind = ?claims.kind, error = %e, "jwt encode failed");
        AppError::internal(e)
    })
}

pub fn issue_token_pair(state: &AppState, user_id: &str) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: sign(
            state,
            user_id.to_string(),
            TokenKind::Access,
            Duration::hours(ACCESS_TOKEN_TTL_HOURS),
            None,
        )?,
        refresh_token: sign(
            state,
            user_id.to_string(),
            TokenKind::Refresh,
            Duration::days(REFRESH_TOKEN_TTL_DAYS),
            None,
        )?,
    })
}

/// Signs an invite on behalf of `inviter` for `email`.
pub fn issue_invite(state: &AppState, inviter: Uuid, email: &str) -> Result<String, AppError> {
    sign(
        state,
        inviter.to_string(),
        TokenKind::Invite,
        Duration::days(INVITE_TOKEN_TTL_DAYS),
        Some(email.to_string()),
    )
}

/// Returns the invited email when `token` is a valid, unexpired invite.
pub fn validate_invite(state: &AppState, token: &str) -> Result<String, AppError> {
    let claims = jwt::decode_and_verify(token, state.config.jwt_secret.as_bytes()).map_err(|e| {
        warn!(error = %e, "invite: decode failed");
        AppError::InvalidInvite
    })?;
    if claims.kind != TokenKind::Invite {
        warn!(kind = ?claims.kind, "invite: wrong token kind");
        return Err(AppError::InvalidInvite);
    }
    claims.email.ok_or_else(|| {
        warn!(sub = %claims.sub, "invite: token without email");
        AppError::InvalidInvite
    })
}
