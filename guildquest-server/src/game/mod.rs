//! The reward economy: accounts, tasks, the pet, decorations and sync.
//!
//! Services are generic over the repository traits in [`repository`] and
//! return [`GameError`], which the HTTP layer maps to a status and a stable
//! [`ErrorCode`].

pub mod accounts;
pub mod decorations;
pub mod economy;
pub mod pets;
pub mod repository;
pub mod sync;
pub mod tasks;

#[cfg(test)]
pub(crate) mod memory;

use std::sync::Arc;

use guildquest_shared::domain::ErrorCode;

use crate::storage::StorageError;

pub use accounts::Accounts;
pub use decorations::DecorationShop;
pub use pets::PetKeeper;
pub use repository::{
    DecorationRepository, PetRepository, SyncRepository, TaskRepository, UserRepository,
};
pub use sync::SyncReconciler;
pub use tasks::RewardEngine;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("task belongs to another user")]
    Forbidden,

    #[error("task not found")]
    TaskNotFound,

    #[error("pet not found")]
    PetNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("task already completed")]
    AlreadyCompleted,

    #[error("decoration already owned: {0}")]
    AlreadyOwned(String),

    #[error("user already exists")]
    UserExists,

    #[error("insufficient gold: need {required}, have {available}")]
    InsufficientFunds { required: i32, available: i32 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Internal(String),
}

impl GameError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::Validation(_) => ErrorCode::ValidationFailed,
            GameError::InvalidCredentials => ErrorCode::InvalidCredentials,
            GameError::Forbidden => ErrorCode::Forbidden,
            GameError::TaskNotFound => ErrorCode::TaskNotFound,
            GameError::PetNotFound => ErrorCode::PetNotFound,
            GameError::UserNotFound => ErrorCode::UserNotFound,
            GameError::AlreadyCompleted => ErrorCode::AlreadyCompleted,
            GameError::AlreadyOwned(_) => ErrorCode::AlreadyOwned,
            GameError::UserExists => ErrorCode::UserExists,
            GameError::InsufficientFunds { .. } => ErrorCode::InsufficientGold,
            GameError::Storage(_) | GameError::Internal(_) => ErrorCode::Internal,
        }
    }
}

/// Knobs for the services that are not fixed by the economy rules.
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub bcrypt_cost: u32,
    /// Allowed decoration names; empty means any name is accepted.
    pub decoration_catalog: Vec<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            decoration_catalog: Vec::new(),
        }
    }
}

/// All services wired to one repository.
#[derive(Clone)]
pub struct Game<R> {
    pub accounts: Accounts<R>,
    pub tasks: RewardEngine<R>,
    pub pets: PetKeeper<R>,
    pub decorations: DecorationShop<R>,
    pub sync: SyncReconciler<R>,
}

impl<R> Game<R>
where
    R: Clone + UserRepository + TaskRepository + PetRepository + DecorationRepository + SyncRepository,
{
    pub fn new(repo: R, settings: GameSettings) -> Self {
        Self {
            accounts: Accounts::new(repo.clone(), settings.bcrypt_cost),
            tasks: RewardEngine::new(repo.clone()),
            pets: PetKeeper::new(repo.clone()),
            decorations: DecorationShop::new(repo.clone(), Arc::from(settings.decoration_catalog)),
            sync: SyncReconciler::new(repo),
        }
    }
}
