use std::sync::Arc;

use checklist::PreparedReport;
use shared::{
    domain::{ReportId, UserId},
    protocol::{BatchOutcome, CreateReportRequest, DetailsProcessed, ReportDetailsBatch, SubmittedReport},
};
use storage::StoredPdf;
use tracing::{info, warn};

use crate::{error::ClientError, InspectionBackend, PdfSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfStatus {
    Archived(StoredPdf),
    /// The report is saved regardless; this only carries the reason.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub report_id: ReportId,
    pub submitted: usize,
    pub batch: BatchOutcome,
    pub pdf: PdfStatus,
}

impl SubmitOutcome {
    pub fn as_submitted_report(&self) -> SubmittedReport {
        SubmittedReport {
            id: self.report_id.clone(),
            detalles: DetailsProcessed {
                total: self.submitted,
                procesados: self.batch.processed,
            },
        }
    }
}

/// Files a finished inspection: the report, then its details, then the PDF.
#[derive(Clone)]
pub struct ReportSubmitter {
    backend: Arc<dyn InspectionBackend>,
    pdfs: Arc<dyn PdfSink>,
}

impl ReportSubmitter {
    pub fn new(backend: Arc<dyn InspectionBackend>, pdfs: Arc<dyn PdfSink>) -> Self {
        Self { backend, pdfs }
    }

    /// Fails only if the report or its details could not be stored. PDF
    /// problems are reported in the outcome.
    pub async fn submit(
        &self,
        user_id: &UserId,
        report: &PreparedReport,
    ) -> Result<SubmitOutcome, ClientError> {
        let request = CreateReportRequest {
            maquina_id: report.machine_id.clone(),
            usuario_id: user_id.clone(),
            checklist_id: report.checklist_id.clone(),
            comentarios: report.comments.clone(),
            aviso_llamada: Some(report.call_notice.clone()).filter(|notice| !notice.is_empty()),
        };
        let created = self.backend.create_report(&request).await?;
        info!(report_id = %created.id, machine_id = %report.machine_id, "report created");

        let batch = if report.details.is_empty() {
            BatchOutcome::default()
        } else {
            self.backend
                .create_details_batch(&ReportDetailsBatch {
                    informe_id: created.id.clone(),
                    detalles: report.details.clone(),
                })
                .await?
        };
        if batch.processed < report.details.len() {
            warn!(
                report_id = %created.id,
                submitted = report.details.len(),
                processed = batch.processed,
                "backend stored fewer details than submitted"
            );
        }

        let pdf = match self.archive_pdf(&created.id).await {
            Ok(stored) => PdfStatus::Archived(stored),
            Err(err) => {
                warn!(report_id = %created.id, error = %err, "report saved without pdf");
                PdfStatus::Failed(err.to_string())
            }
        };

        Ok(SubmitOutcome {
            report_id: created.id,
            submitted: report.details.len(),
            batch,
            pdf,
        })
    }

    /// Renders the report PDF on the backend and keeps a local copy.
    pub async fn archive_pdf(&self, report_id: &ReportId) -> Result<StoredPdf, ClientError> {
        let document = self.backend.report_pdf(report_id).await?;
        let stored = self.pdfs.store_pdf(report_id, &document).await?;
        Ok(stored)
    }
}

#[cfg(test)]
#[path = "tests/submit_tests.rs"]
mod tests;
