//! Types shared between the GuildQuest server and its clients: wire DTOs,
//! the error-code taxonomy, JWT claims, and URL builders.

pub mod api;
pub mod domain;
pub mod jwt;
