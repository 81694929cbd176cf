//! In-memory repository for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use guildquest_shared::domain::now_utc;
use uuid::Uuid;

use super::economy;
use super::repository::{
    DecorationRepository, PetCharge, PetMutation, PetRepository, Purchase, SyncRepository,
    SyncSnapshot, TaskRepository, UserRepository,
};
use crate::storage::StorageError;
use crate::storage::models::{Decoration, NewTask, NewUser, Pet, Task, User};

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    tasks: Vec<Task>,
    pets: HashMap<String, Pet>,
    decorations: Vec<Decoration>,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryRepo {
    state: Arc<Mutex<State>>,
    fail_pet_writes: Arc<AtomicBool>,
}

impl MemoryRepo {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_user(&self, email: &str, gold: i32) -> Uuid {
        let id = Uuid::new_v4();
        let now = now_utc().naive_utc();
        self.lock().users.insert(
            id.to_string(),
            User {
                id: id.to_string(),
                email: email.to_string(),
                password_hash: String::new(),
                gold,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn gold(&self, user: Uuid) -> i32 {
        self.lock().users[&user.to_string()].gold
    }

    pub fn set_gold(&self, user: Uuid, gold: i32) {
        if let Some(u) = self.lock().users.get_mut(&user.to_string()) {
            u.gold = gold;
        }
    }

    /// Inserts a default pet for `user` and lets the caller tweak it.
    pub fn put_pet(&self, user: Uuid, tweak: impl FnOnce(&mut Pet)) {
        let mut pet = economy::new_pet(&user.to_string(), now_utc().naive_utc());
        tweak(&mut pet);
        self.lock().pets.insert(user.to_string(), pet);
    }

    /// Makes every pet write fail until switched off again.
    pub fn fail_pet_writes(&self, fail: bool) {
        self.fail_pet_writes.store(fail, Ordering::SeqCst);
    }

    fn check_pet_writes(&self) -> Result<(), StorageError> {
        if self.fail_pet_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Database(diesel::result::Error::RollbackTransaction));
        }
        Ok(())
    }
}

fn after(ts: chrono::NaiveDateTime, since: Option<DateTime<Utc>>) -> bool {
    since.is_none_or(|s| ts > s.naive_utc())
}

#[async_trait]
impl UserRepository for MemoryRepo {
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::Duplicate(user.email));
        }
        let row = User {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            gold: user.gold,
            created_at: user.created_at,
            updated_at: user.updated_at,
        };
        state.users.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        Ok(self.lock().users.get(&id.to_string()).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[async_trait]
impl TaskRepository for MemoryRepo {
    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>, StorageError> {
        let mut state = self.lock();
        let now = now_utc().naive_utc();
        let rows: Vec<Task> = tasks
            .into_iter()
            .map(|t| Task {
                id: t.id,
                user_id: t.user_id,
                title: t.title,
                description: t.description,
                reward: t.reward,
                completed: t.completed,
                created_at: now,
                updated_at: now,
            })
            .collect();
        state.tasks.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StorageError> {
        let id = id.to_string();
        Ok(self.lock().tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, owner: Uuid) -> Result<Vec<Task>, StorageError> {
        let owner = owner.to_string();
        let mut out: Vec<Task> = self
            .lock()
            .tasks
            .iter()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    async fn tasks_updated_since(
        &self,
        owner: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>, StorageError> {
        let owner = owner.to_string();
        Ok(self
            .lock()
            .tasks
            .iter()
            .filter(|t| t.user_id == owner && after(t.updated_at, since))
            .cloned()
            .collect())
    }

    async fn complete_and_credit(
        &self,
        owner: Uuid,
        task: Uuid,
    ) -> Result<Option<(Task, i32)>, StorageError> {
        let (owner, task) = (owner.to_string(), task.to_string());
        let now = now_utc().naive_utc();
        let mut state = self.lock();
        let Some(idx) = state
            .tasks
            .iter()
            .position(|t| t.id == task && t.user_id == owner && !t.completed)
        else {
            return Ok(None);
        };
        let reward = state.tasks[idx].reward;
        let Some(user) = state.users.get_mut(&owner) else {
            return Err(StorageError::Corrupt(format!("task {task} has no owner")));
        };
        if user.gold > economy::MAX_GOLD - reward {
            return Err(StorageError::BalanceLimit);
        }
        user.gold += reward;
        user.updated_at = now;
        let gold = user.gold;
        let row = &mut state.tasks[idx];
        row.completed = true;
        row.updated_at = now;
        Ok(Some((row.clone(), gold)))
    }

    async fn delete_task(&self, owner: Uuid, task: Uuid) -> Result<bool, StorageError> {
        let (owner, task) = (owner.to_string(), task.to_string());
        let mut state = self.lock();
        let before = state.tasks.len();
        state.tasks.retain(|t| !(t.id == task && t.user_id == owner));
        Ok(state.tasks.len() < before)
    }
}

#[async_trait]
impl PetRepository for MemoryRepo {
    async fn find_pet(&self, owner: Uuid) -> Result<Option<Pet>, StorageError> {
        Ok(self.lock().pets.get(&owner.to_string()).cloned())
    }

    async fn find_or_create_pet(&self, owner: Uuid, default: Pet) -> Result<Pet, StorageError> {
        let mut state = self.lock();
        if let Some(pet) = state.pets.get(&owner.to_string()) {
            return Ok(pet.clone());
        }
        self.check_pet_writes()?;
        state.pets.insert(owner.to_string(), default.clone());
        Ok(default)
    }

    async fn update_pet(
        &self,
        owner: Uuid,
        mutate: PetMutation,
    ) -> Result<Option<Pet>, StorageError> {
        self.check_pet_writes()?;
        let mut state = self.lock();
        let Some(pet) = state.pets.get_mut(&owner.to_string()) else {
            return Ok(None);
        };
        mutate(pet);
        pet.updated_at = now_utc().naive_utc();
        Ok(Some(pet.clone()))
    }

    async fn charge_and_update_pet(
        &self,
        owner: Uuid,
        cost: i32,
        mutate: PetMutation,
    ) -> Result<PetCharge, StorageError> {
        let key = owner.to_string();
        let now = now_utc().naive_utc();
        let mut state = self.lock();
        let Some(gold) = state.users.get(&key).map(|u| u.gold) else {
            return Ok(PetCharge::NoUser);
        };
        if gold < cost {
            return Ok(PetCharge::InsufficientFunds { gold });
        }
        let Some(mut pet) = state.pets.get(&key).cloned() else {
            return Ok(PetCharge::NoPet);
        };
        self.check_pet_writes()?;
        mutate(&mut pet);
        pet.updated_at = now;
        state.pets.insert(key.clone(), pet.clone());
        let gold = gold - cost;
        if cost > 0
            && let Some(user) = state.users.get_mut(&key)
        {
            user.gold = gold;
            user.updated_at = now;
        }
        Ok(PetCharge::Applied { pet, gold })
    }
}

#[async_trait]
impl DecorationRepository for MemoryRepo {
    async fn list_decorations(&self, owner: Uuid) -> Result<Vec<Decoration>, StorageError> {
        let owner = owner.to_string();
        let mut out: Vec<Decoration> = self
            .lock()
            .decorations
            .iter()
            .filter(|d| d.user_id == owner)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }

    async fn decorations_since(
        &self,
        owner: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Decoration>, StorageError> {
        let owner = owner.to_string();
        Ok(self
            .lock()
            .decorations
            .iter()
            .filter(|d| d.user_id == owner && after(d.created_at, since))
            .cloned()
            .collect())
    }

    async fn purchase_decoration(
        &self,
        owner: Uuid,
        name: &str,
        cost: i32,
    ) -> Result<Purchase, StorageError> {
        let key = owner.to_string();
        let now = now_utc().naive_utc();
        let mut state = self.lock();
        let Some(gold) = state.users.get(&key).map(|u| u.gold) else {
            return Ok(Purchase::NoUser);
        };
        if state
            .decorations
            .iter()
            .any(|d| d.user_id == key && d.decoration == name)
        {
            return Ok(Purchase::AlreadyOwned);
        }
        if gold < cost {
            return Ok(Purchase::InsufficientFunds { gold });
        }
        let decoration = Decoration {
            user_id: key.clone(),
            decoration: name.to_string(),
            created_at: now,
        };
        state.decorations.push(decoration.clone());
        let gold = gold - cost;
        if let Some(user) = state.users.get_mut(&key) {
            user.gold = gold;
            user.updated_at = now;
        }
        Ok(Purchase::Bought { decoration, gold })
    }
}

#[async_trait]
impl SyncRepository for MemoryRepo {
    async fn sync_snapshot(
        &self,
        owner: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<SyncSnapshot, StorageError> {
        let key = owner.to_string();
        let state = self.lock();
        let synced_at = now_utc();
        Ok(SyncSnapshot {
            tasks: state
                .tasks
                .iter()
                .filter(|t| t.user_id == key && after(t.updated_at, since))
                .cloned()
                .collect(),
            decorations: state
                .decorations
                .iter()
                .filter(|d| d.user_id == key && after(d.created_at, since))
                .cloned()
                .collect(),
            pet: state.pets.get(&key).cloned(),
            user: state.users.get(&key).cloned(),
            synced_at,
        })
    }
}
