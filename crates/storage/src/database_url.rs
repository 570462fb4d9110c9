use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// Normalizes a configured database location and creates its parent directory.
pub fn prepare_database_url(raw_database_url: &str, default_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url, default_url);
    ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

/// Plain paths become `sqlite:` urls. Windows drive paths keep a single colon.
pub fn normalize_database_url(raw_database_url: &str, default_url: &str) -> String {
    let raw = raw_database_url.trim();
    if raw.is_empty() {
        return default_url.to_string();
    }
    if raw.starts_with("sqlite::memory:") {
        return raw.to_string();
    }

    let path = if let Some(path) = raw.strip_prefix("sqlite://") {
        path
    } else if let Some(path) = raw.strip_prefix("sqlite:") {
        path
    } else if raw.contains("://") {
        return raw.to_string();
    } else {
        raw
    };

    let path = path.replace('\\', "/");
    if has_drive_letter(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn has_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

pub(crate) fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    const DEFAULT: &str = "sqlite://./data/inspector.db";

    #[test]
    fn plain_paths_become_sqlite_urls() {
        assert_eq!(
            normalize_database_url("./data/test.db", DEFAULT),
            "sqlite://./data/test.db"
        );
        assert_eq!(normalize_database_url("  ", DEFAULT), DEFAULT);
        assert_eq!(
            normalize_database_url("sqlite::memory:", DEFAULT),
            "sqlite::memory:"
        );
    }

    #[test]
    fn windows_paths_keep_a_single_colon() {
        assert_eq!(
            normalize_database_url("C:\\Users\\tech\\inspector.db", DEFAULT),
            "sqlite:C:/Users/tech/inspector.db"
        );
        assert_eq!(
            normalize_database_url("sqlite://C:/Users/tech/inspector.db", DEFAULT),
            "sqlite:C:/Users/tech/inspector.db"
        );
    }

    #[test]
    fn prepare_creates_the_parent_directory() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let temp_root = env::temp_dir().join(format!("inspection_storage_url_{suffix}"));
        let db_path = temp_root.join("data").join("test.db");

        prepare_database_url(db_path.to_string_lossy().as_ref(), DEFAULT).expect("prepare");
        assert!(temp_root.join("data").exists());

        fs::remove_dir_all(temp_root).expect("cleanup");
    }
}
