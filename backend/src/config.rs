use anyhow::{Context, Result};
use rand::RngExt;
use rand::rng;
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://checklist.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: Vec<u8>,
    pub db_max_connections: u32,
    /// Drop and recreate the tables on start.
    pub reset_database: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:3000")?;

        let db_max_connections = parse_max_connections(env::var("DB_MAX_CONNECTIONS").ok())?;

        let reset_database = parse_flag("RESET_DATABASE", env::var("RESET_DATABASE").ok())?;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ => {
                // Tokens issued with this secret die with the process.
                tracing::warn!("JWT_SECRET not set, using an ephemeral secret");
                let bytes: [u8; 32] = rng().random();
                bytes.to_vec()
            }
        };

        Ok(Config {
            database_url,
            bind_addr,
            jwt_secret,
            db_max_connections,
            reset_database,
        })
    }
}

/// Zero is refused: such a pool never hands out a connection.
fn parse_max_connections(raw: Option<String>) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_DB_MAX_CONNECTIONS);
    };
    let n: u32 = raw
        .trim()
        .parse()
        .context("DB_MAX_CONNECTIONS must be a positive integer")?;
    anyhow::ensure!(n > 0, "DB_MAX_CONNECTIONS must be a positive integer, got 0");
    Ok(n)
}

fn parse_flag(name: &str, raw: Option<String>) -> Result<bool> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") => Ok(true),
        Some("0") | Some("false") => Ok(false),
        Some(other) => anyhow::bail!("{name} must be true or false, got {other:?}"),
    }
}

// Hand-written so the secret never reaches the logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("db_max_connections", &self.db_max_connections)
            .field("reset_database", &self.reset_database)
            .finish()
    }
}
