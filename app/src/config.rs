use config::{Config as ConfigBuilder, File};
use serde::Deserialize;
use std::time::Duration;

use crate::tmdb::TMDB_BASE_URL;

const DEFAULT_DATABASE_URL: &str = "sqlite://./cinescope.db?mode=rwc";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_timeout_secs: Option<u64>,
    pub port: u16,
}

impl Config {
    pub fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = ConfigBuilder::builder()
            .add_source(File::with_name("config").required(false))
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("tmdb_base_url", TMDB_BASE_URL)?
            .set_default("port", 3000u16)?
            .build()?;

        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            config
                .get_string("database_url")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
        });

        let tmdb_base_url = std::env::var("TMDB_BASE_URL").unwrap_or_else(|_| {
            config
                .get_string("tmdb_base_url")
                .unwrap_or_else(|_| TMDB_BASE_URL.to_string())
        });

        let tmdb_timeout_secs = timeout_secs(
            std::env::var("TMDB_TIMEOUT_SECS").ok().as_deref(),
            config.get_int("tmdb_timeout_secs").ok(),
        );

        Ok(Config {
            database_url,
            tmdb_api_key: std::env::var("TMDB_API_KEY")
                .map_err(|_| anyhow::anyhow!("TMDB_API_KEY environment variable not set"))?,
            tmdb_base_url,
            tmdb_timeout_secs,
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| config.get_int("port").unwrap_or(3000) as u16),
        })
    }

    /// `None` leaves catalog requests without a deadline.
    pub fn tmdb_timeout(&self) -> Option<Duration> {
        self.tmdb_timeout_secs.map(Duration::from_secs)
    }
}

/// Env value wins over the file value. Zero, negative or unparsable values
/// mean no timeout.
fn timeout_secs(env: Option<&str>, file: Option<i64>) -> Option<u64> {
    env.and_then(|s| s.trim().parse().ok())
        .or_else(|| file.and_then(|s| u64::try_from(s).ok()))
        .filter(|&secs| secs > 0)
}
