use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::GameError;
use super::economy::DECORATION_COST;
use super::repository::{DecorationRepository, Purchase};
use crate::storage::models::Decoration;

pub const MAX_DECORATION_NAME_LEN: usize = 64;

/// Buying and listing cosmetic items.
#[derive(Clone)]
pub struct DecorationShop<R> {
    repo: R,
    catalog: Arc<[String]>,
}

/// A purchase that went through.
#[derive(Debug, Clone)]
pub struct Bought {
    pub decoration: Decoration,
    pub gold: i32,
}

impl<R: DecorationRepository> DecorationShop<R> {
    /// An empty `catalog` accepts any well-formed name.
    pub fn new(repo: R, catalog: Arc<[String]>) -> Self {
        Self { repo, catalog }
    }

    pub async fn list(&self, owner: Uuid) -> Result<Vec<Decoration>, GameError> {
        Ok(self.repo.list_decorations(owner).await?)
    }

    pub async fn buy(&self, owner: Uuid, name: &str) -> Result<Bought, GameError> {
        let name = self.validate_name(name)?;
        match self
            .repo
            .purchase_decoration(owner, name, DECORATION_COST)
            .await?
        {
            Purchase::Bought { decoration, gold } => {
                info!(user_id = %owner, decoration = name, gold, "decoration bought");
                Ok(Bought { decoration, gold })
            }
            Purchase::AlreadyOwned => Err(GameError::AlreadyOwned(name.to_string())),
            Purchase::InsufficientFunds { gold } => Err(GameError::InsufficientFunds {
                required: DECORATION_COST,
                available: gold,
            }),
            Purchase::NoUser => Err(GameError::UserNotFound),
        }
    }

    fn validate_name<'a>(&self, raw: &'a str) -> Result<&'a str, GameError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(GameError::validation("decoration name must not be empty"));
        }
        if name.chars().count() > MAX_DECORATION_NAME_LEN {
            return Err(GameError::validation(format!(
                "decoration name must be at most {MAX_DECORATION_NAME_LEN} characters"
            )));
        }
        if !self.catalog.is_empty() && !self.catalog.iter().any(|c| c == name) {
            return Err(GameError::validation(format!(
                "unknown decoration: {name}"
            )));
        }
        Ok(name)
    }
}
