use std::io::Cursor;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use guildquest_shared::api::{self, endpoints};
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use tracing::info;

use super::auth::{self, AuthCtx};
use super::{ApiJson, AppError, AppState};
use crate::game::accounts::normalize_email;

/// Smallest edge of the rendered QR image, in pixels.
const QR_MIN_DIMENSION: u32 = 256;

pub(super) async fn create_invite(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    ApiJson(body): ApiJson<api::InviteReq>,
) -> Result<Json<api::InviteResp>, AppError> {
    let email = normalize_email(&body.email)?;
    let token = auth::issue_invite(&state, auth.user_id, &email)?;
    info!(user_id = %auth.user_id, invited = %email, "invite created");
    Ok(Json(api::InviteResp {
        invite_url: endpoints::invite_landing(&state.config.app_url, &token),
        qr_code_url: endpoints::invite_qr(&state.config.app_url, &token),
        token,
    }))
}

pub(super) async fn get_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<api::InviteDto>, AppError> {
    let email = auth::validate_invite(&state, &token)?;
    Ok(Json(api::InviteDto { email }))
}

pub(super) async fn get_invite_qr(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    auth::validate_invite(&state, &token)?;
    let url = endpoints::invite_landing(&state.config.app_url, &token);
    let png = render_qr_png(&url)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Encodes `data` as a QR code and returns the PNG bytes.
pub fn render_qr_png(data: &str) -> Result<Vec<u8>, AppError> {
    let code = QrCode::new(data.as_bytes()).map_err(AppError::internal)?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
        .build();
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(AppError::internal)?;
    Ok(buf.into_inner())
}
