use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::GameError;
use super::repository::SyncRepository;

pub use super::repository::SyncSnapshot;

/// Incremental pull of a user's records.
///
/// Tasks and decorations are filtered by the watermark; the pet and the user
/// record are returned whole. Deletions are not reported: a task deleted
/// after the watermark simply stops appearing.
#[derive(Clone)]
pub struct SyncReconciler<R> {
    repo: R,
}

impl<R: SyncRepository> SyncReconciler<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn sync(
        &self,
        owner: Uuid,
        last_sync_at: Option<DateTime<Utc>>,
    ) -> Result<SyncSnapshot, GameError> {
        let snap = self.repo.sync_snapshot(owner, last_sync_at).await?;
        debug!(
            user_id = %owner,
            since = ?last_sync_at,
            tasks = snap.tasks.len(),
            decorations = snap.decorations.len(),
            pet = snap.pet.is_some(),
            synced_at = %snap.synced_at,
            "sync"
        );
        Ok(snap)
    }
}
