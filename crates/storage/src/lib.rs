use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use checklist::{DraftStore, InspectionDraft};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{path::PathBuf, str::FromStr};

use shared::domain::{ReportId, UserId};

mod database_url;
mod pdf;

pub use database_url::{normalize_database_url, prepare_database_url};
pub use pdf::{sanitize_filename, PdfArchive, PdfDocument};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRecord {
    pub slot: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPdf {
    pub report_id: ReportId,
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub access_token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        database_url::ensure_sqlite_parent_dir_exists(database_url)?;

        // Every connection to an in-memory database opens a fresh one.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open sqlite database '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn load_draft(&self, slot: &str) -> Result<Option<InspectionDraft>> {
        let row = sqlx::query("SELECT payload FROM drafts WHERE slot = ?")
            .bind(slot)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload")?;
        let draft = serde_json::from_str(&payload)
            .with_context(|| format!("draft in slot '{slot}' is not readable"))?;
        Ok(Some(draft))
    }

    pub async fn save_draft(&self, slot: &str, draft: &InspectionDraft) -> Result<()> {
        let now = Utc::now();
        let mut draft = draft.clone();
        draft.updated_at = Some(now);
        let payload = serde_json::to_string(&draft)?;
        sqlx::query(
            "INSERT INTO drafts (slot, payload, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(slot) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
        )
        .bind(slot)
        .bind(payload)
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to save draft slot '{slot}'"))?;
        Ok(())
    }

    /// Returns whether a draft was present.
    pub async fn clear_draft(&self, slot: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM drafts WHERE slot = ?")
            .bind(slot)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_drafts(&self) -> Result<Vec<DraftRecord>> {
        let rows = sqlx::query("SELECT slot, updated_at FROM drafts ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(DraftRecord {
                    slot: row.try_get("slot")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    pub async fn record_pdf(&self, pdf: &StoredPdf) -> Result<()> {
        let size_bytes = i64::try_from(pdf.size_bytes).context("pdf size overflows i64")?;
        sqlx::query(
            "INSERT INTO report_pdfs (report_id, filename, path, size_bytes, stored_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(report_id) DO UPDATE SET filename = excluded.filename, path = excluded.path,
                 size_bytes = excluded.size_bytes, stored_at = excluded.stored_at",
        )
        .bind(pdf.report_id.as_str())
        .bind(&pdf.filename)
        .bind(pdf.path.to_string_lossy().into_owned())
        .bind(size_bytes)
        .bind(pdf.stored_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to index pdf for report {}", pdf.report_id))?;
        Ok(())
    }

    pub async fn pdf_for_report(&self, report_id: &ReportId) -> Result<Option<StoredPdf>> {
        let row = sqlx::query(
            "SELECT report_id, filename, path, size_bytes, stored_at FROM report_pdfs WHERE report_id = ?",
        )
        .bind(report_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(stored_pdf_from_row).transpose()
    }

    pub async fn list_pdfs(&self) -> Result<Vec<StoredPdf>> {
        let rows = sqlx::query(
            "SELECT report_id, filename, path, size_bytes, stored_at FROM report_pdfs ORDER BY stored_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(stored_pdf_from_row).collect()
    }

    pub async fn forget_pdf(&self, report_id: &ReportId) -> Result<()> {
        sqlx::query("DELETE FROM report_pdfs WHERE report_id = ?")
            .bind(report_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Keeps a single signed-in session; a new login replaces the previous one.
    pub async fn save_session(&self, access_token: &str, user_id: &UserId) -> Result<()> {
        sqlx::query(
            "INSERT INTO auth_sessions (id, access_token, user_id, created_at) VALUES (1, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET access_token = excluded.access_token,
                 user_id = excluded.user_id, created_at = excluded.created_at",
        )
        .bind(access_token)
        .bind(user_id.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("failed to save session")?;
        Ok(())
    }

    pub async fn load_session(&self) -> Result<Option<StoredSession>> {
        let row = sqlx::query("SELECT access_token, user_id, created_at FROM auth_sessions WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| {
            Ok(StoredSession {
                access_token: row.try_get("access_token")?,
                user_id: UserId(row.try_get("user_id")?),
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    pub async fn clear_session(&self) -> Result<()> {
        sqlx::query("DELETE FROM auth_sessions")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn stored_pdf_from_row(row: sqlx::sqlite::SqliteRow) -> Result<StoredPdf> {
    let size_bytes: i64 = row.try_get("size_bytes")?;
    let path: String = row.try_get("path")?;
    Ok(StoredPdf {
        report_id: ReportId(row.try_get("report_id")?),
        filename: row.try_get("filename")?,
        path: PathBuf::from(path),
        size_bytes: u64::try_from(size_bytes).unwrap_or_default(),
        stored_at: row.try_get("stored_at")?,
    })
}

#[async_trait]
impl DraftStore for Storage {
    async fn load_draft(&self, slot: &str) -> Result<Option<InspectionDraft>> {
        Storage::load_draft(self, slot).await
    }

    async fn save_draft(&self, slot: &str, draft: &InspectionDraft) -> Result<()> {
        Storage::save_draft(self, slot, draft).await
    }

    async fn clear_draft(&self, slot: &str) -> Result<()> {
        Storage::clear_draft(self, slot).await.map(|_| ())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
