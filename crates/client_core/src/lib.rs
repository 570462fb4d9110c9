//! Client side of the inspection workflow: the authenticated backend
//! client, checklist loading, report submission and the session controller
//! that walks the wizard and checkpoints drafts.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{
        Checklist, ChecklistGroup, ChecklistId, ChecklistItem, GroupId, Machine, MachineId,
        MachineType, MachineTypeId, PossibleState, ReportId,
    },
    protocol::{BatchOutcome, CreateReportRequest, CreatedReport, ReportDetailsBatch},
};
use storage::{PdfArchive, PdfDocument, StoredPdf};

pub mod auth;
pub mod backend;
pub mod catalog;
pub mod error;
pub mod session;
pub mod submit;

pub use auth::{token_hint, token_subject};
pub use backend::{BackendClient, Session};
pub use catalog::{active_checklist, load_checklist};
pub use error::ClientError;
pub use session::{InspectionSession, DEFAULT_DRAFT_SLOT};
pub use submit::{PdfStatus, ReportSubmitter, SubmitOutcome};

/// Calls the inspection workflow makes against the backend.
#[async_trait]
pub trait InspectionBackend: Send + Sync {
    async fn machine_types(&self) -> Result<Vec<MachineType>, ClientError>;
    async fn machines_by_type(&self, id: &MachineTypeId) -> Result<Vec<Machine>, ClientError>;
    async fn machine(&self, id: &MachineId) -> Result<Machine, ClientError>;
    async fn checklists_by_type(&self, id: &MachineTypeId) -> Result<Vec<Checklist>, ClientError>;
    async fn groups(&self, checklist_id: &ChecklistId) -> Result<Vec<ChecklistGroup>, ClientError>;
    async fn items(&self, group_id: &GroupId) -> Result<Vec<ChecklistItem>, ClientError>;
    async fn states_by_type(&self, id: &MachineTypeId) -> Result<Vec<PossibleState>, ClientError>;
    async fn create_report(&self, request: &CreateReportRequest) -> Result<CreatedReport, ClientError>;
    async fn create_details_batch(&self, batch: &ReportDetailsBatch) -> Result<BatchOutcome, ClientError>;
    async fn report_pdf(&self, id: &ReportId) -> Result<PdfDocument, ClientError>;
}

/// Where rendered report PDFs are kept.
#[async_trait]
pub trait PdfSink: Send + Sync {
    async fn store_pdf(&self, report_id: &ReportId, document: &PdfDocument) -> Result<StoredPdf>;
}

pub struct MissingPdfSink;

#[async_trait]
impl PdfSink for MissingPdfSink {
    async fn store_pdf(&self, _report_id: &ReportId, _document: &PdfDocument) -> Result<StoredPdf> {
        Err(anyhow!("pdf archive is not configured"))
    }
}

#[async_trait]
impl PdfSink for PdfArchive {
    async fn store_pdf(&self, report_id: &ReportId, document: &PdfDocument) -> Result<StoredPdf> {
        self.store(report_id, document).await
    }
}

#[cfg(test)]
#[path = "tests/fake_backend.rs"]
pub(crate) mod fake_backend;
