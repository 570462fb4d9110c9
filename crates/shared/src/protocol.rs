use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ChecklistId, ItemId, MachineId, MachineTypeId, ReportId, StateId, UserId,
};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Body of a successful credentials exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
}

fn bearer() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateReportRequest {
    pub maquina_id: MachineId,
    pub usuario_id: UserId,
    pub checklist_id: ChecklistId,
    pub comentarios: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aviso_llamada: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedReport {
    pub id: ReportId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDetailInput {
    pub item_checklist_id: ItemId,
    pub estado_id: StateId,
    #[serde(default)]
    pub observaciones_internas: String,
    #[serde(default)]
    pub observaciones_cliente: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDetailsBatch {
    pub informe_id: ReportId,
    pub detalles: Vec<ReportDetailInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    #[serde(default, alias = "procesados", alias = "count")]
    pub processed: usize,
    #[serde(default)]
    pub total: usize,
}

/// One answered item as sent by a front-end to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAnswer {
    pub item_id: ItemId,
    pub estado_id: StateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones_internas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observaciones_cliente: Option<String>,
}

/// Assembled inspection form accepted by the gateway's `POST /api/reports`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportForm {
    pub tipo_maquina_id: MachineTypeId,
    pub maquina_id: MachineId,
    #[serde(default)]
    pub aviso_llamada: String,
    pub items: Vec<ItemAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comentarios: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsProcessed {
    pub total: usize,
    pub procesados: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedReport {
    pub id: ReportId,
    pub detalles: DetailsProcessed,
}

/// PDF as rendered by the backend: base64 content plus a suggested file name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfEnvelope {
    pub filename: String,
    pub content: String,
    #[serde(default = "pdf_content_type")]
    pub content_type: String,
}

fn pdf_content_type() -> String {
    "application/pdf".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfArchived {
    pub success: bool,
    pub filename: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: ReportId,
    pub fecha_creacion: DateTime<Utc>,
    #[serde(default)]
    pub fecha_finalizacion: Option<DateTime<Utc>>,
    pub maquina_id: MachineId,
    #[serde(default)]
    pub tipo_maquina: String,
    #[serde(default)]
    pub numero_bastidor: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub aviso_llamada: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPage {
    pub data: Vec<ReportSummary>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Filters for the report listing, named the way front-ends send them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_maquina_id: Option<MachineTypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_bastidor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_desde: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_hasta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl ReportFilters {
    /// Query pairs understood by the backend listing endpoint. Paging is always present.
    pub fn backend_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(v) = non_empty(self.tipo_maquina_id.as_ref().map(|id| id.as_str())) {
            query.push(("machine_type_id", v));
        }
        if let Some(v) = non_empty(self.numero_bastidor.as_deref()) {
            query.push(("numero_bastidor", v));
        }
        if let Some(v) = non_empty(self.fecha_desde.as_deref()) {
            query.push(("from_date", v));
        }
        if let Some(v) = non_empty(self.fecha_hasta.as_deref()) {
            query.push(("to_date", v));
        }
        query.push(("page", self.page.unwrap_or(DEFAULT_PAGE).to_string()));
        query.push((
            "page_size",
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).to_string(),
        ));
        query
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailLine {
    pub id: String,
    pub informe_id: ReportId,
    pub item_id: ItemId,
    pub item_nombre: String,
    pub estado_id: StateId,
    pub estado_nombre: String,
    #[serde(default)]
    pub observaciones_internas: Option<String>,
    #[serde(default)]
    pub observaciones_cliente: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailGroup {
    pub grupo_nombre: String,
    #[serde(default)]
    pub items: Vec<DetailLine>,
}

/// Report details as the backend groups them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedDetails {
    pub informe_id: ReportId,
    #[serde(default)]
    pub grupos: Vec<DetailGroup>,
}
