//! Persistence contracts the game services are written against.
//!
//! [`crate::storage::Store`] implements every trait on SQLite. Operations
//! that combine a check with a write (completion, charging gold, purchases)
//! and the sync read are single methods so an implementation can run them in
//! one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::storage::StorageError;
use crate::storage::models::{Decoration, NewTask, NewUser, Pet, Task, User};

/// In-place pet change applied inside a storage transaction.
pub type PetMutation = fn(&mut Pet);

/// Outcome of [`PetRepository::charge_and_update_pet`].
#[derive(Debug, Clone, PartialEq)]
pub enum PetCharge {
    Applied { pet: Pet, gold: i32 },
    InsufficientFunds { gold: i32 },
    NoPet,
    NoUser,
}

/// Outcome of [`DecorationRepository::purchase_decoration`].
#[derive(Debug, Clone, PartialEq)]
pub enum Purchase {
    Bought { decoration: Decoration, gold: i32 },
    AlreadyOwned,
    InsufficientFunds { gold: i32 },
    NoUser,
}

/// A user's records as of one point in time.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub tasks: Vec<Task>,
    pub decorations: Vec<Decoration>,
    pub pet: Option<Pet>,
    pub user: Option<User>,
    /// Watermark to send back as `lastSyncAt` next time.
    pub synced_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with [`StorageError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StorageError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts every task or none of them. `created_at` and `updated_at`
    /// are stamped at write time, overriding the values passed in.
    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>, StorageError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StorageError>;

    /// Newest first.
    async fn list_tasks(&self, owner: Uuid) -> Result<Vec<Task>, StorageError>;

    /// Tasks with `updated_at` strictly after `since`; all tasks when `None`.
    async fn tasks_updated_since(
        &self,
        owner: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>, StorageError>;

    /// Marks an open task of `owner` completed and credits its reward.
    ///
    /// Returns the updated task and the owner's new gold balance, or `None`
    /// when no open task matched, in which case nothing was written.
    async fn complete_and_credit(
        &self,
        owner: Uuid,
        task: Uuid,
    ) -> Result<Option<(Task, i32)>, StorageError>;

    /// Returns whether a task of `owner` was deleted.
    async fn delete_task(&self, owner: Uuid, task: Uuid) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn find_pet(&self, owner: Uuid) -> Result<Option<Pet>, StorageError>;

    /// Returns the pet, inserting `default` first when there is none.
    async fn find_or_create_pet(&self, owner: Uuid, default: Pet) -> Result<Pet, StorageError>;

    /// Applies `mutate` to an existing pet and saves it. `None` when absent.
    async fn update_pet(
        &self,
        owner: Uuid,
        mutate: PetMutation,
    ) -> Result<Option<Pet>, StorageError>;

    /// Debits `cost` gold and applies `mutate`, all or nothing.
    ///
    /// Funds are checked before the pet is looked up.
    async fn charge_and_update_pet(
        &self,
        owner: Uuid,
        cost: i32,
        mutate: PetMutation,
    ) -> Result<PetCharge, StorageError>;
}

#[async_trait]
pub trait DecorationRepository: Send + Sync {
    /// Oldest first.
    async fn list_decorations(&self, owner: Uuid) -> Result<Vec<Decoration>, StorageError>;

    /// Records created strictly after `since`; all records when `None`.
    async fn decorations_since(
        &self,
        owner: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Decoration>, StorageError>;

    /// Ownership is checked before funds.
    async fn purchase_decoration(
        &self,
        owner: Uuid,
        name: &str,
        cost: i32,
    ) -> Result<Purchase, StorageError>;
}

#[async_trait]
pub trait SyncRepository: Send + Sync {
    /// Tasks updated and decorations created strictly after `since` (all of
    /// them when `None`), plus the current pet and user.
    ///
    /// `synced_at` must be taken so that no write stamped at or before it
    /// can still commit after the read.
    async fn sync_snapshot(
        &self,
        owner: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<SyncSnapshot, StorageError>;
}
