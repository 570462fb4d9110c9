use std::path::PathBuf;

use anyhow::Context;
use config::{Config, Environment, File, Source};
use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/gateway.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: String,
    pub backend_url: String,
    pub database_url: String,
    pub pdf_dir: PathBuf,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            backend_url: "http://localhost:8000/api".into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            pdf_dir: PathBuf::from("./data/pdfs"),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Defaults, then `gateway.toml` when present, then `APP__*` variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    build_settings(
        File::with_name("gateway").required(false),
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    )
}

fn build_settings<F, E>(file: F, env: E) -> anyhow::Result<Settings>
where
    F: Source + Send + Sync + 'static,
    E: Source + Send + Sync + 'static,
{
    let defaults = Settings::default();
    Config::builder()
        .set_default("bind_addr", defaults.bind_addr)?
        .set_default("backend_url", defaults.backend_url)?
        .set_default("database_url", defaults.database_url)?
        .set_default("pdf_dir", defaults.pdf_dir.to_string_lossy().into_owned())?
        .set_default("max_body_bytes", defaults.max_body_bytes as u64)?
        .add_source(file)
        .add_source(env)
        .build()
        .context("failed to read gateway settings")?
        .try_deserialize()
        .context("gateway settings are invalid")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
