use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, Source};
use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/inspector.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub backend_url: String,
    pub database_url: String,
    pub pdf_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000/api".into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            pdf_dir: PathBuf::from("./data/pdfs"),
        }
    }
}

/// Defaults, then the given file (or `inspector.toml` when present), then `APP__*` variables.
pub fn load_settings(file: Option<&Path>) -> anyhow::Result<Settings> {
    let env = Environment::with_prefix("APP").separator("__");
    match file {
        Some(path) => build_settings(File::from(path).required(true), env),
        None => build_settings(File::with_name("inspector").required(false), env),
    }
}

fn build_settings<F, E>(file: F, env: E) -> anyhow::Result<Settings>
where
    F: Source + Send + Sync + 'static,
    E: Source + Send + Sync + 'static,
{
    let defaults = Settings::default();
    Config::builder()
        .set_default("backend_url", defaults.backend_url)?
        .set_default("database_url", defaults.database_url)?
        .set_default("pdf_dir", defaults.pdf_dir.to_string_lossy().into_owned())?
        .add_source(file)
        .add_source(env)
        .build()
        .context("failed to read inspector settings")?
        .try_deserialize()
        .context("inspector settings are invalid")
}
