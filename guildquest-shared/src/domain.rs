use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Stable, machine-readable error codes carried in every error response.
///
/// Clients branch on these rather than on HTTP status or message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    Unauthorized,
    InvalidToken,
    InvalidCredentials,
    Forbidden,
    TaskNotFound,
    PetNotFound,
    UserNotFound,
    AlreadyCompleted,
    AlreadyOwned,
    UserExists,
    InsufficientGold,
    InvalidInvite,
    /// No route matches the request path.
    NotFound,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::TaskNotFound => "TASK_NOT_FOUND",
            ErrorCode::PetNotFound => "PET_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::AlreadyCompleted => "ALREADY_COMPLETED",
            ErrorCode::AlreadyOwned => "ALREADY_OWNED",
            ErrorCode::UserExists => "USER_EXISTS",
            ErrorCode::InsufficientGold => "INSUFFICIENT_GOLD",
            ErrorCode::InvalidInvite => "INVALID_INVITE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current UTC time truncated to microseconds, the precision the store keeps.
///
/// Every persisted timestamp and every sync watermark goes through this so
/// that a value read back from the database compares equal to the one written.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
