use guildquest_shared::api::CreateTaskReq;
use guildquest_shared::domain::now_utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::GameError;
use super::economy;
use super::repository::{PetRepository, TaskRepository};
use crate::storage::StorageError;
use crate::storage::models::{NewTask, Pet, Task};

/// Upper bound on tasks accepted by one bulk request.
pub const MAX_BULK_TASKS: usize = 100;

/// What a client asks for when creating a task.
#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub title: String,
    pub description: Option<String>,
    pub reward: i32,
}

impl From<CreateTaskReq> for TaskSpec {
    fn from(req: CreateTaskReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            reward: req.reward,
        }
    }
}

/// Result of a task completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub task: Task,
    /// Owner's balance after the reward was credited.
    pub gold: i32,
    /// Pet after the completion bonus; `None` without a pet or when the
    /// pet update failed.
    pub pet: Option<Pet>,
}

/// Task CRUD and the completion transition.
#[derive(Clone)]
pub struct RewardEngine<R> {
    repo: R,
}

impl<R: TaskRepository + PetRepository> RewardEngine<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn list(&self, owner: Uuid) -> Result<Vec<Task>, GameError> {
        Ok(self.repo.list_tasks(owner).await?)
    }

    pub async fn create(&self, owner: Uuid, spec: TaskSpec) -> Result<Task, GameError> {
        let mut created = self.create_bulk(owner, vec![spec]).await?;
        created
            .pop()
            .ok_or_else(|| GameError::Internal("insert returned no task".into()))
    }

    /// All specs are validated before anything is written, and the insert is
    /// all-or-nothing.
    pub async fn create_bulk(
        &self,
        owner: Uuid,
        specs: Vec<TaskSpec>,
    ) -> Result<Vec<Task>, GameError> {
        if specs.is_empty() {
            return Err(GameError::validation("at least one task is required"));
        }
        if specs.len() > MAX_BULK_TASKS {
            return Err(GameError::validation(format!(
                "at most {MAX_BULK_TASKS} tasks per request"
            )));
        }
        let now = now_utc().naive_utc();
        let owner_id = owner.to_string();
        let rows = specs
            .into_iter()
            .enumerate()
            .map(|(idx, spec)| {
                let title = spec.title.trim();
                if title.is_empty() {
                    return Err(GameError::validation(format!(
                        "task {idx}: title must not be empty"
                    )));
                }
                if !(1..=economy::MAX_TASK_REWARD).contains(&spec.reward) {
                    return Err(GameError::validation(format!(
                        "task {idx}: reward must be between 1 and {}",
                        economy::MAX_TASK_REWARD
                    )));
                }
                let description = spec
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty());
                Ok(NewTask {
                    id: Uuid::new_v4().to_string(),
                    user_id: owner_id.clone(),
                    title: title.to_string(),
                    description,
                    reward: spec.reward,
                    completed: false,
                    created_at: now,
                    updated_at: now,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = rows.len();
        let tasks = self.repo.insert_tasks(rows).await?;
        info!(user_id = %owner, count, "tasks created");
        Ok(tasks)
    }

    /// Completes an open task owned by `caller`.
    ///
    /// The completion flag and the gold credit are written together. The pet
    /// bonus that follows is best-effort: a failure there is logged and the
    /// completion still succeeds.
    pub async fn complete(&self, caller: Uuid, task_id: Uuid) -> Result<Completion, GameError> {
        let task = self
            .repo
            .find_task(task_id)
            .await?
            .ok_or(GameError::TaskNotFound)?;
        if task.user_id != caller.to_string() {
            warn!(user_id = %caller, task_id = %task_id, owner = %task.user_id, "complete: not the owner");
            return Err(GameError::Forbidden);
        }
        if task.completed {
            return Err(GameError::AlreadyCompleted);
        }

        // `None` here means a concurrent request completed (or deleted) the task
        // between the checks above and the guarded write.
        let credited = match self.repo.complete_and_credit(caller, task_id).await {
            Ok(credited) => credited,
            Err(StorageError::BalanceLimit) => {
                warn!(user_id = %caller, task_id = %task_id, "complete: gold balance limit reached");
                return Err(GameError::validation("gold balance limit reached"));
            }
            Err(e) => return Err(e.into()),
        };
        let (task, gold) = credited.ok_or(GameError::AlreadyCompleted)?;

        let pet = match self
            .repo
            .update_pet(caller, economy::reward_pet_for_task)
            .await
        {
            Ok(pet) => pet,
            Err(e) => {
                warn!(user_id = %caller, task_id = %task_id, error = %e, "complete: pet update failed; completion kept");
                None
            }
        };

        info!(
            user_id = %caller,
            task_id = %task_id,
            reward = task.reward,
            gold,
            pet_level = pet.as_ref().map(|p| p.level),
            "task completed"
        );
        Ok(Completion { task, gold, pet })
    }

    pub async fn delete(&self, caller: Uuid, task_id: Uuid) -> Result<(), GameError> {
        let task = self
            .repo
            .find_task(task_id)
            .await?
            .ok_or(GameError::TaskNotFound)?;
        if task.user_id != caller.to_string() {
            warn!(user_id = %caller, task_id = %task_id, "delete: not the owner");
            return Err(GameError::Forbidden);
        }
        if !self.repo.delete_task(caller, task_id).await? {
            return Err(GameError::TaskNotFound);
        }
        info!(user_id = %caller, task_id = %task_id, "task deleted");
        Ok(())
    }
}
