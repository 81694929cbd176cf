use guildquest_shared::domain::now_utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::GameError;
use super::economy::{self, FEED_COST};
use super::repository::{PetCharge, PetMutation, PetRepository};
use crate::storage::models::Pet;

/// The caller's pet and the paid interactions with it.
#[derive(Clone)]
pub struct PetKeeper<R> {
    repo: R,
}

/// A pet after an interaction, plus the owner's remaining gold.
#[derive(Debug, Clone)]
pub struct PetAction {
    pub pet: Pet,
    pub gold: i32,
}

impl<R: PetRepository> PetKeeper<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the caller's pet, adopting a default one on first access.
    pub async fn get(&self, owner: Uuid) -> Result<Pet, GameError> {
        let default = economy::new_pet(&owner.to_string(), now_utc().naive_utc());
        let pet = self.repo.find_or_create_pet(owner, default).await?;
        debug!(user_id = %owner, level = pet.level, "pet loaded");
        Ok(pet)
    }

    pub async fn feed(&self, owner: Uuid) -> Result<PetAction, GameError> {
        self.interact(owner, "feed", FEED_COST, economy::feed).await
    }

    pub async fn play(&self, owner: Uuid) -> Result<PetAction, GameError> {
        self.interact(owner, "play", 0, economy::play).await
    }

    async fn interact(
        &self,
        owner: Uuid,
        action: &'static str,
        cost: i32,
        mutate: PetMutation,
    ) -> Result<PetAction, GameError> {
        match self.repo.charge_and_update_pet(owner, cost, mutate).await? {
            PetCharge::Applied { pet, gold } => {
                info!(
                    user_id = %owner,
                    action,
                    cost,
                    gold,
                    hunger = pet.hunger,
                    happiness = pet.happiness,
                    "pet interaction"
                );
                Ok(PetAction { pet, gold })
            }
            PetCharge::InsufficientFunds { gold } => Err(GameError::InsufficientFunds {
                required: cost,
                available: gold,
            }),
            PetCharge::NoPet => Err(GameError::PetNotFound),
            PetCharge::NoUser => Err(GameError::UserNotFound),
        }
    }
}
