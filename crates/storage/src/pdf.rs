use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use shared::domain::ReportId;
use tracing::{info, warn};

use crate::{Storage, StoredPdf};

/// A rendered report ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Report PDFs on disk, named `<report_id>_<filename>`, indexed in sqlite.
/// The id part never contains `_`, so the first `_` always ends it.
#[derive(Clone)]
pub struct PdfArchive {
    dir: PathBuf,
    storage: Storage,
}

impl PdfArchive {
    pub fn new(dir: impl Into<PathBuf>, storage: Storage) -> Self {
        Self {
            dir: dir.into(),
            storage,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn store(&self, report_id: &ReportId, document: &PdfDocument) -> Result<StoredPdf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create pdf directory '{}'", self.dir.display()))?;

        let filename = format!(
            "{}_{}",
            id_segment(report_id),
            pdf_filename(&document.filename)
        );
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, &document.bytes)
            .await
            .with_context(|| format!("failed to write '{}'", path.display()))?;

        let stored = StoredPdf {
            report_id: report_id.clone(),
            filename,
            path,
            size_bytes: document.bytes.len() as u64,
            stored_at: Utc::now(),
        };
        self.storage.record_pdf(&stored).await?;
        info!(report_id = %report_id, path = %stored.path.display(), size_bytes = stored.size_bytes, "report pdf archived");
        Ok(stored)
    }

    /// Looks the report up in the index, then falls back to scanning the
    /// directory for a `<report_id>_*.pdf` file written before indexing.
    pub async fn find(&self, report_id: &ReportId) -> Result<Option<StoredPdf>> {
        if let Some(stored) = self.storage.pdf_for_report(report_id).await? {
            if tokio::fs::try_exists(&stored.path).await.unwrap_or(false) {
                return Ok(Some(stored));
            }
            warn!(report_id = %report_id, path = %stored.path.display(), "indexed pdf is missing on disk");
            self.storage.forget_pdf(report_id).await?;
        }
        self.scan_directory(report_id).await
    }

    pub async fn read(&self, report_id: &ReportId) -> Result<Option<(StoredPdf, Vec<u8>)>> {
        let Some(stored) = self.find(report_id).await? else {
            return Ok(None);
        };
        let bytes = tokio::fs::read(&stored.path)
            .await
            .with_context(|| format!("failed to read '{}'", stored.path.display()))?;
        Ok(Some((stored, bytes)))
    }

    async fn scan_directory(&self, report_id: &ReportId) -> Result<Option<StoredPdf>> {
        let wanted = id_segment(report_id);
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).context("failed to list pdf directory"),
        };

        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            let owned_by_report = filename
                .split_once('_')
                .is_some_and(|(segment, _)| segment == wanted);
            if !(owned_by_report && filename.ends_with(".pdf")) {
                continue;
            }
            let metadata = entry.metadata().await?;
            let stored = StoredPdf {
                report_id: report_id.clone(),
                filename,
                path: entry.path(),
                size_bytes: metadata.len(),
                stored_at: Utc::now(),
            };
            self.storage.record_pdf(&stored).await?;
            return Ok(Some(stored));
        }
        Ok(None)
    }
}

/// Keeps letters, digits, `-`, `_` and `.`; anything else becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_start_matches('.') {
        "" => "report".to_string(),
        rest => rest.to_string(),
    }
}

/// The report id as it appears in archived file names.
fn id_segment(report_id: &ReportId) -> String {
    sanitize_filename(report_id.as_str()).replace('_', "-")
}

fn pdf_filename(name: &str) -> String {
    let mut name = sanitize_filename(name);
    if !name.to_ascii_lowercase().ends_with(".pdf") {
        name.push_str(".pdf");
    }
    name
}

#[cfg(test)]
#[path = "tests/pdf_tests.rs"]
mod tests;
