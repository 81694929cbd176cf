//! Prices, stat deltas and the pet progression rules.
//!
//! Everything here is pure: callers load a [`Pet`], apply one of these
//! functions and persist the result. Stats are always clamped to
//! [`STAT_MIN`]..=[`STAT_MAX`] and arithmetic saturates, so no input can push
//! a pet out of range.

use chrono::NaiveDateTime;

use crate::storage::models::Pet;

pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;

pub const DEFAULT_SPECIES: &str = "dragon";
pub const STARTING_LEVEL: i32 = 1;

/// Experience needed per level; the threshold for level `n` is `n * EXP_PER_LEVEL`.
pub const EXP_PER_LEVEL: i32 = 100;

pub const TASK_EXP_REWARD: i32 = 10;
pub const TASK_HAPPINESS_REWARD: i32 = 5;

pub const FEED_COST: i32 = 20;
pub const FEED_HUNGER: i32 = 30;
pub const FEED_HAPPINESS: i32 = 10;

pub const PLAY_HAPPINESS: i32 = 20;
pub const PLAY_HUNGER: i32 = 5;

pub const DECORATION_COST: i32 = 50;

/// Largest reward one task may carry. Mirrored by the `tasks.reward` CHECK.
pub const MAX_TASK_REWARD: i32 = 1_000;
/// Ceiling on a balance; a credit that would pass it is refused.
pub const MAX_GOLD: i32 = i32::MAX;

pub fn clamp(value: i32, lo: i32, hi: i32) -> i32 {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

fn adjust_stat(stat: i32, delta: i32) -> i32 {
    clamp(stat.saturating_add(delta), STAT_MIN, STAT_MAX)
}

pub fn level_threshold(level: i32) -> i32 {
    level.saturating_mul(EXP_PER_LEVEL)
}

pub fn new_pet(user_id: &str, now: NaiveDateTime) -> Pet {
    Pet {
        user_id: user_id.to_string(),
        species: DEFAULT_SPECIES.to_string(),
        level: STARTING_LEVEL,
        exp: 0,
        hunger: STAT_MAX,
        happiness: STAT_MAX,
        updated_at: now,
    }
}

/// Pet side of a task completion.
///
/// The level check runs once: even when experience overshoots several
/// thresholds only one level is granted and the surplus is dropped.
pub fn reward_pet_for_task(pet: &mut Pet) {
    pet.exp = pet.exp.saturating_add(TASK_EXP_REWARD);
    pet.happiness = adjust_stat(pet.happiness, TASK_HAPPINESS_REWARD);
    if pet.exp >= level_threshold(pet.level) {
        pet.level = pet.level.saturating_add(1);
        pet.exp = 0;
    }
}

/// Stat changes for feeding. The gold cost is charged separately.
pub fn feed(pet: &mut Pet) {
    pet.hunger = adjust_stat(pet.hunger, FEED_HUNGER);
    pet.happiness = adjust_stat(pet.happiness, FEED_HAPPINESS);
}

pub fn play(pet: &mut Pet) {
    pet.happiness = adjust_stat(pet.happiness, PLAY_HAPPINESS);
    pet.hunger = adjust_stat(pet.hunger, -PLAY_HUNGER);
}
