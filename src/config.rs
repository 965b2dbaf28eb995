use anyhow::Result;
use serde::Deserialize;
use std::env;

pub const DEFAULT_DB_PATH: &str = "data/baloto.db";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
}

pub fn load() -> Result<Config> {
    let database_url = env::var("BALOTO_DB_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    Ok(Config { database_url })
}
