use guildquest_shared::domain::now_utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::GameError;
use super::repository::UserRepository;
use crate::storage::StorageError;
use crate::storage::models::{NewUser, User};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Registration and credential checks.
#[derive(Clone)]
pub struct Accounts<R> {
    repo: R,
    bcrypt_cost: u32,
}

/// Lower-cases and trims, then checks the `local@domain` shape.
pub fn normalize_email(raw: &str) -> Result<String, GameError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(GameError::validation("email must look like name@domain")),
    }
}

impl<R: UserRepository> Accounts<R> {
    pub fn new(repo: R, bcrypt_cost: u32) -> Self {
        Self { repo, bcrypt_cost }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<User, GameError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(GameError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.repo.find_user_by_email(&email).await?.is_some() {
            warn!(email = %email, "register: email already taken");
            return Err(GameError::UserExists);
        }

        let cost = self.bcrypt_cost;
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| GameError::Internal(e.to_string()))?
            .map_err(|e| GameError::Internal(format!("bcrypt hash failed: {e}")))?;

        let now = now_utc().naive_utc();
        let new_user = NewUser {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            gold: 0,
            created_at: now,
            updated_at: now,
        };
        match self.repo.insert_user(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, "register: user created");
                Ok(user)
            }
            // Lost a race with a concurrent registration for the same email.
            Err(StorageError::Duplicate(_)) => Err(GameError::UserExists),
            Err(e) => Err(e.into()),
        }
    }

    /// Unknown email and wrong password are reported identically.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, GameError> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.repo.find_user_by_email(&email).await? else {
            warn!(email = %email, "login: unknown email");
            return Err(GameError::InvalidCredentials);
        };
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| GameError::Internal(e.to_string()))?
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "login: bcrypt verify failed");
                GameError::Internal(format!("bcrypt verify failed: {e}"))
            })?;
        if !ok {
            warn!(user_id = %user.id, "login: invalid password");
            return Err(GameError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn find(&self, id: Uuid) -> Result<User, GameError> {
        self.repo
            .find_user(id)
            .await?
            .ok_or(GameError::UserNotFound)
    }
}
