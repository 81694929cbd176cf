pub mod models;
pub mod schema;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use guildquest_shared::domain::now_utc;
use models::{Decoration, NewTask, NewUser, Pet, Task, User};
use schema::{decorations, pets, tasks, users};
use tracing::{info, trace};
use uuid::Uuid;

use crate::game::economy;
use crate::game::repository::{
    DecorationRepository, PetCharge, PetMutation, PetRepository, Purchase, SyncRepository,
    SyncSnapshot, TaskRepository, UserRepository,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// A unique constraint rejected the write.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// A credit would push the balance past [`economy::MAX_GOLD`].
    #[error("gold balance limit reached")]
    BalanceLimit,

    /// A stored value could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    /// Opens (or creates) the database file and applies pending migrations.
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let manager = ConnectionManager::<SqliteConnection>::new(path);
        let pool = Pool::builder().max_size(8).build(manager)?;
        let store = Store { pool };

        let applied = store
            .with_conn(|conn| {
                conn.run_pending_migrations(MIGRATIONS)
                    .map(|versions| versions.len())
                    .map_err(|e| StorageError::Migration(e.to_string()))
            })
            .await?;
        if applied > 0 {
            info!(applied, path, "storage: migrations applied");
        }
        Ok(store)
    }

    /// Runs `f` on a pooled connection inside `spawn_blocking`.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            f(&mut conn)
        })
        .await?
    }
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // WAL for read/write concurrency; busy timeout so writers queue instead of failing.
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    diesel::sql_query("PRAGMA foreign_keys=ON;").execute(conn)?;
    Ok(())
}

fn load_pet(conn: &mut SqliteConnection, owner: &str) -> Result<Option<Pet>, StorageError> {
    Ok(pets::table
        .find(owner)
        .select(Pet::as_select())
        .first(conn)
        .optional()?)
}

fn load_user(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, StorageError> {
    Ok(users::table
        .find(id)
        .select(User::as_select())
        .first(conn)
        .optional()?)
}

fn load_tasks_since(
    conn: &mut SqliteConnection,
    owner: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<Task>, StorageError> {
    let base = tasks::table
        .filter(tasks::user_id.eq(owner))
        .order(tasks::updated_at.asc())
        .select(Task::as_select());
    Ok(match since {
        Some(since) => base
            .filter(tasks::updated_at.gt(since.naive_utc()))
            .load(conn)?,
        None => base.load(conn)?,
    })
}

fn load_decorations_since(
    conn: &mut SqliteConnection,
    owner: &str,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<Decoration>, StorageError> {
    let base = decorations::table
        .filter(decorations::user_id.eq(owner))
        .order(decorations::created_at.asc())
        .select(Decoration::as_select());
    Ok(match since {
        Some(since) => base
            .filter(decorations::created_at.gt(since.naive_utc()))
            .load(conn)?,
        None => base.load(conn)?,
    })
}

fn load_gold(conn: &mut SqliteConnection, owner: &str) -> Result<Option<i32>, StorageError> {
    Ok(users::table
        .find(owner)
        .select(users::gold)
        .first::<i32>(conn)
        .optional()?)
}

fn save_pet(conn: &mut SqliteConnection, pet: &Pet) -> Result<(), StorageError> {
    diesel::update(pets::table.find(&pet.user_id))
        .set(pet)
        .execute(conn)?;
    Ok(())
}

/// Guarded debit: never takes the balance below zero.
fn debit_gold(
    conn: &mut SqliteConnection,
    owner: &str,
    cost: i32,
    now: chrono::NaiveDateTime,
) -> Result<i32, StorageError> {
    Ok(
        diesel::update(users::table.find(owner).filter(users::gold.ge(cost)))
            .set((
                users::gold.eq(users::gold - cost),
                users::updated_at.eq(now),
            ))
            .returning(users::gold)
            .get_result::<i32>(conn)?,
    )
}

#[async_trait]
impl UserRepository for Store {
    async fn insert_user(&self, user: NewUser) -> Result<User, StorageError> {
        self.with_conn(move |conn| {
            diesel::insert_into(users::table)
                .values(&user)
                .returning(User::as_returning())
                .get_result(conn)
                .map_err(|e| match e {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        StorageError::Duplicate(user.email.clone())
                    }
                    other => other.into(),
                })
        })
        .await
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StorageError> {
        self.with_conn(move |conn| load_user(conn, &id.to_string()))
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            Ok(users::table
                .filter(users::email.eq(&email))
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }
}

#[async_trait]
impl TaskRepository for Store {
    async fn insert_tasks(&self, mut rows: Vec<NewTask>) -> Result<Vec<Task>, StorageError> {
        trace!(count = rows.len(), "insert_tasks starting");
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Vec<Task>, StorageError> {
                // Stamped under the write lock so a concurrent sync cannot
                // hand out a watermark past a row that is not committed yet.
                let now = now_utc().naive_utc();
                let mut out = Vec::with_capacity(rows.len());
                for row in &mut rows {
                    row.created_at = now;
                    row.updated_at = now;
                    out.push(
                        diesel::insert_into(tasks::table)
                            .values(&*row)
                            .returning(Task::as_returning())
                            .get_result(conn)?,
                    );
                }
                Ok(out)
            })
        })
        .await
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StorageError> {
        self.with_conn(move |conn| {
            Ok(tasks::table
                .find(id.to_string())
                .select(Task::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn list_tasks(&self, owner: Uuid) -> Result<Vec<Task>, StorageError> {
        self.with_conn(move |conn| {
            Ok(tasks::table
                .filter(tasks::user_id.eq(owner.to_string()))
                .order((tasks::created_at.desc(), tasks::id.asc()))
                .select(Task::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn tasks_updated_since(
        &self,
        owner: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Task>, StorageError> {
        self.with_conn(move |conn| load_tasks_since(conn, &owner.to_string(), since))
            .await
    }

    async fn complete_and_credit(
        &self,
        owner: Uuid,
        task: Uuid,
    ) -> Result<Option<(Task, i32)>, StorageError> {
        let owner_id = owner.to_string();
        let task_id = task.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Option<(Task, i32)>, StorageError> {
                let now = now_utc().naive_utc();
                let done = diesel::update(
                    tasks::table
                        .filter(tasks::id.eq(&task_id))
                        .filter(tasks::user_id.eq(&owner_id))
                        .filter(tasks::completed.eq(false)),
                )
                .set((tasks::completed.eq(true), tasks::updated_at.eq(now)))
                .returning(Task::as_returning())
                .get_result(conn)
                .optional()?;
                let Some(done) = done else {
                    return Ok(None);
                };
                let gold = diesel::update(
                    users::table
                        .find(&owner_id)
                        .filter(users::gold.le(economy::MAX_GOLD - done.reward)),
                )
                .set((
                    users::gold.eq(users::gold + done.reward),
                    users::updated_at.eq(now),
                ))
                .returning(users::gold)
                .get_result::<i32>(conn)
                .optional()?;
                // Erroring out rolls the completion flag back too.
                let Some(gold) = gold else {
                    return Err(StorageError::BalanceLimit);
                };
                Ok(Some((done, gold)))
            })
        })
        .await
    }

    async fn delete_task(&self, owner: Uuid, task: Uuid) -> Result<bool, StorageError> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                tasks::table
                    .filter(tasks::id.eq(task.to_string()))
                    .filter(tasks::user_id.eq(owner.to_string())),
            )
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl PetRepository for Store {
    async fn find_pet(&self, owner: Uuid) -> Result<Option<Pet>, StorageError> {
        self.with_conn(move |conn| load_pet(conn, &owner.to_string()))
            .await
    }

    async fn find_or_create_pet(&self, owner: Uuid, default: Pet) -> Result<Pet, StorageError> {
        let owner_id = owner.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Pet, StorageError> {
                let inserted = diesel::insert_into(pets::table)
                    .values(&default)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
                if inserted > 0 {
                    info!(user_id = %owner_id, species = %default.species, "pet adopted");
                }
                load_pet(conn, &owner_id)?
                    .ok_or_else(|| StorageError::Corrupt(format!("pet {owner_id} vanished")))
            })
        })
        .await
    }

    async fn update_pet(
        &self,
        owner: Uuid,
        mutate: PetMutation,
    ) -> Result<Option<Pet>, StorageError> {
        let owner_id = owner.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Option<Pet>, StorageError> {
                let Some(mut pet) = load_pet(conn, &owner_id)? else {
                    return Ok(None);
                };
                mutate(&mut pet);
                pet.updated_at = now_utc().naive_utc();
                save_pet(conn, &pet)?;
                Ok(Some(pet))
            })
        })
        .await
    }

    async fn charge_and_update_pet(
        &self,
        owner: Uuid,
        cost: i32,
        mutate: PetMutation,
    ) -> Result<PetCharge, StorageError> {
        let owner_id = owner.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| -> Result<PetCharge, StorageError> {
                let Some(gold) = load_gold(conn, &owner_id)? else {
                    return Ok(PetCharge::NoUser);
                };
                if gold < cost {
                    return Ok(PetCharge::InsufficientFunds { gold });
                }
                let Some(mut pet) = load_pet(conn, &owner_id)? else {
                    return Ok(PetCharge::NoPet);
                };
                let now = now_utc().naive_utc();
                mutate(&mut pet);
                pet.updated_at = now;
                save_pet(conn, &pet)?;
                let gold = if cost > 0 {
                    debit_gold(conn, &owner_id, cost, now)?
                } else {
                    gold
                };
                Ok(PetCharge::Applied { pet, gold })
            })
        })
        .await
    }
}

#[async_trait]
impl DecorationRepository for Store {
    async fn list_decorations(&self, owner: Uuid) -> Result<Vec<Decoration>, StorageError> {
        self.with_conn(move |conn| {
            Ok(decorations::table
                .filter(decorations::user_id.eq(owner.to_string()))
                .order((decorations::created_at.asc(), decorations::decoration.asc()))
                .select(Decoration::as_select())
                .load(conn)?)
        })
        .await
    }

    async fn decorations_since(
        &self,
        owner: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Decoration>, StorageError> {
        self.with_conn(move |conn| load_decorations_since(conn, &owner.to_string(), since))
            .await
    }

    async fn purchase_decoration(
        &self,
        owner: Uuid,
        name: &str,
        cost: i32,
    ) -> Result<Purchase, StorageError> {
        let owner_id = owner.to_string();
        let name = name.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| -> Result<Purchase, StorageError> {
                let Some(gold) = load_gold(conn, &owner_id)? else {
                    return Ok(Purchase::NoUser);
                };
                let owned: i64 = decorations::table
                    .filter(decorations::user_id.eq(&owner_id))
                    .filter(decorations::decoration.eq(&name))
                    .count()
                    .get_result(conn)?;
                if owned > 0 {
                    return Ok(Purchase::AlreadyOwned);
                }
                if gold < cost {
                    return Ok(Purchase::InsufficientFunds { gold });
                }
                let now = now_utc().naive_utc();
                let decoration = Decoration {
                    user_id: owner_id.clone(),
                    decoration: name.clone(),
                    created_at: now,
                };
                diesel::insert_into(decorations::table)
                    .values(&decoration)
                    .execute(conn)?;
                let gold = debit_gold(conn, &owner_id, cost, now)?;
                Ok(Purchase::Bought { decoration, gold })
            })
        })
        .await
    }
}

#[async_trait]
impl SyncRepository for Store {
    async fn sync_snapshot(
        &self,
        owner: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<SyncSnapshot, StorageError> {
        let owner_id = owner.to_string();
        self.with_conn(move |conn| {
            // BEGIN IMMEDIATE waits for any writer holding the lock, and every
            // writer stamps its rows after taking it. Rows stamped before the
            // watermark are therefore committed and visible here.
            conn.immediate_transaction(|conn| -> Result<SyncSnapshot, StorageError> {
                let synced_at = now_utc();
                Ok(SyncSnapshot {
                    tasks: load_tasks_since(conn, &owner_id, since)?,
                    decorations: load_decorations_since(conn, &owner_id, since)?,
                    pet: load_pet(conn, &owner_id)?,
                    user: load_user(conn, &owner_id)?,
                    synced_at,
                })
            })
        })
        .await
    }
}
