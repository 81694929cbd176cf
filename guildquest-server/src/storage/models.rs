use crate::storage::StorageError;
use crate::storage::schema::{decorations, pets, tasks, users};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use guildquest_shared::api::{DecorationDto, PetDto, TaskDto, UserDto};
use uuid::Uuid;

fn parse_id(column: &'static str, raw: &str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|e| StorageError::Corrupt(format!("{column} {raw:?}: {e}")))
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub gold: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub gold: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn to_dto(&self) -> Result<UserDto, StorageError> {
        Ok(UserDto {
            id: parse_id("users.id", &self.id)?,
            email: self.email.clone(),
            gold: self.gold,
            created_at: self.created_at.and_utc(),
            updated_at: self.updated_at.and_utc(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(belongs_to(User, foreign_key = user_id))]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub reward: i32,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTask {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub reward: i32,
    pub completed: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Task {
    pub fn to_dto(&self) -> Result<TaskDto, StorageError> {
        Ok(TaskDto {
            id: parse_id("tasks.id", &self.id)?,
            user_id: parse_id("tasks.user_id", &self.user_id)?,
            title: self.title.clone(),
            description: self.description.clone(),
            reward: self.reward,
            completed: self.completed,
            created_at: self.created_at.and_utc(),
            updated_at: self.updated_at.and_utc(),
        })
    }
}

/// Full pet row; also used as the insert and changeset for saves.
#[derive(
    Debug, Clone, PartialEq, Queryable, Identifiable, Selectable, Insertable, AsChangeset,
)]
#[diesel(table_name = pets)]
#[diesel(primary_key(user_id))]
pub struct Pet {
    pub user_id: String,
    pub species: String,
    pub level: i32,
    pub exp: i32,
    pub hunger: i32,
    pub happiness: i32,
    pub updated_at: NaiveDateTime,
}

impl Pet {
    pub fn to_dto(&self) -> Result<PetDto, StorageError> {
        Ok(PetDto {
            user_id: parse_id("pets.user_id", &self.user_id)?,
            species: self.species.clone(),
            level: self.level,
            exp: self.exp,
            hunger: self.hunger,
            happiness: self.happiness,
            updated_at: self.updated_at.and_utc(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = decorations)]
pub struct Decoration {
    pub user_id: String,
    pub decoration: String,
    pub created_at: NaiveDateTime,
}

impl Decoration {
    pub fn to_dto(&self) -> Result<DecorationDto, StorageError> {
        Ok(DecorationDto {
            user_id: parse_id("decorations.user_id", &self.user_id)?,
            decoration: self.decoration.clone(),
            created_at: self.created_at.and_utc(),
        })
    }
}
