//! GuildQuest server: HTTP API, reward economy and SQLite persistence.

pub mod game;
pub mod server;
pub mod storage;
