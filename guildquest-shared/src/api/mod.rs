use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ErrorCode;

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

pub const API_V1_PREFIX: &str = "/api/v1";

/// Reward granted when a task is created without an explicit one.
pub const DEFAULT_TASK_REWARD: i32 = 10;

fn default_reward() -> i32 {
    DEFAULT_TASK_REWARD
}

// Errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: ErrorCode,
}

// Auth
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResp {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub gold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub reward: i32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskReq {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_reward")]
    pub reward: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkTaskReq {
    pub tasks: Vec<CreateTaskReq>,
}

/// Result of completing a task: the task itself plus the economy side effects.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteTaskResp {
    pub task: TaskDto,
    pub gold: i32,
    /// Absent when the user has no pet yet or the pet could not be updated.
    pub pet: Option<PetDto>,
}

// Pet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetDto {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub species: String,
    pub level: i32,
    pub exp: i32,
    pub hunger: i32,
    pub happiness: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PetActionResp {
    pub pet: PetDto,
    pub gold: i32,
}

// Decorations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationDto {
    pub user_id: Uuid,
    pub decoration: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuyDecorationReq {
    pub decoration: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuyDecorationResp {
    pub decoration: DecorationDto,
    pub gold: i32,
}

// Sync
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReq {
    /// Watermark from the previous sync; absent for the first sync.
    #[serde(default)]
    pub last_sync_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResp {
    pub tasks: Vec<TaskDto>,
    pub decorations: Vec<DecorationDto>,
    pub pet: Option<PetDto>,
    pub user: Option<UserDto>,
    /// Store this as `lastSyncAt` for the next call.
    pub synced_at: DateTime<Utc>,
}

// Invites
#[derive(Debug, Serialize, Deserialize)]
pub struct InviteReq {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResp {
    pub token: String,
    pub invite_url: String,
    pub qr_code_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InviteDto {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}
