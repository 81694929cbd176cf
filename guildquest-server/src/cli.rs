use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH (default: ./config.yaml; a missing file means built-in defaults)
  DB_PATH     (default: data/guildquest.db)
  PORT        (default: 5151 or config.listen_port)
  JWT_SECRET  (overrides config.jwt_secret; required in production)
  APP_URL     (overrides config.app_url; used for invite links)
  RUST_LOG    (log filter, default: info)
"#;

#[derive(Debug, Parser)]
#[command(
    name = "guildquest-server",
    version,
    about = "GuildQuest server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Path to the SQLite database file
    #[arg(long, env = "DB_PATH", default_value = "data/guildquest.db")]
    pub db_path: PathBuf,

    /// Listen port; overrides config.listen_port
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Optional subcommand. Without one, runs the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply pending database migrations and exit
    Migrate,
}
