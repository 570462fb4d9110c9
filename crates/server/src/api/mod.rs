use std::sync::Arc;

use checklist::PreparedReport;
use client_core::{
    active_checklist, token_subject, BackendClient, ClientError, InspectionBackend, PdfStatus,
    ReportSubmitter,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    domain::{
        Checklist, ChecklistGroup, ChecklistId, ChecklistItem, GroupId, ItemId, Machine,
        MachineId, MachineType, MachineTypeId, PossibleState, ReportId,
    },
    error::{ApiError, ErrorCode},
    protocol::{
        GroupedDetails, PdfArchived, ReportDetailInput, ReportFilters,
        ReportForm, ReportPage, SubmittedReport,
    },
};
use storage::{PdfArchive, PdfDocument, Storage, StoredPdf};
use tracing::{info, warn};

/// Everything a route needs: the backend client (without a token, one is
/// attached per request), the local database and the PDF archive.
#[derive(Clone)]
pub struct ApiContext {
    pub backend: BackendClient,
    pub storage: Storage,
    pub archive: PdfArchive,
}

impl ApiContext {
    fn backend_for(&self, token: &str) -> BackendClient {
        self.backend.with_token(token)
    }

    fn submitter_for(&self, token: &str) -> ReportSubmitter {
        ReportSubmitter::new(
            Arc::new(self.backend_for(token)),
            Arc::new(self.archive.clone()),
        )
    }
}

/// Group synthesized from the backend's grouped report details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportGroup {
    pub id: String,
    pub nombre: String,
    pub orden: usize,
    pub checklist_id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
    pub id: ItemId,
    pub nombre: String,
    pub descripcion: String,
    pub grupo_id: String,
    pub checklist_id: Value,
}

pub async fn machine_types(ctx: &ApiContext, token: &str) -> Result<Vec<MachineType>, ApiError> {
    ctx.backend_for(token).machine_types().await.map_err(upstream)
}

pub async fn machines_by_type(
    ctx: &ApiContext,
    token: &str,
    id: &MachineTypeId,
) -> Result<Vec<Machine>, ApiError> {
    ctx.backend_for(token).machines_by_type(id).await.map_err(upstream)
}

pub async fn machine(ctx: &ApiContext, token: &str, id: &MachineId) -> Result<Machine, ApiError> {
    ctx.backend_for(token).machine(id).await.map_err(upstream)
}

pub async fn checklists_by_type(
    ctx: &ApiContext,
    token: &str,
    id: &MachineTypeId,
) -> Result<Vec<Checklist>, ApiError> {
    ctx.backend_for(token).checklists_by_type(id).await.map_err(upstream)
}

pub async fn checklist_groups(
    ctx: &ApiContext,
    token: &str,
    id: &ChecklistId,
) -> Result<Vec<ChecklistGroup>, ApiError> {
    ctx.backend_for(token).groups(id).await.map_err(upstream)
}

pub async fn group_items(
    ctx: &ApiContext,
    token: &str,
    id: &GroupId,
) -> Result<Vec<ChecklistItem>, ApiError> {
    ctx.backend_for(token).items(id).await.map_err(upstream)
}

pub async fn states_by_type(
    ctx: &ApiContext,
    token: &str,
    id: &MachineTypeId,
) -> Result<Vec<PossibleState>, ApiError> {
    ctx.backend_for(token).states_by_type(id).await.map_err(upstream)
}

pub async fn list_reports(
    ctx: &ApiContext,
    token: &str,
    filters: &ReportFilters,
) -> Result<ReportPage, ApiError> {
    ctx.backend_for(token).list_reports(filters).await.map_err(upstream)
}

/// Files an assembled form: resolves the active checklist, creates the
/// report, sends its details in one batch and archives the PDF. Only the
/// first three steps can fail the request.
pub async fn submit_report(
    ctx: &ApiContext,
    token: &str,
    form: &ReportForm,
) -> Result<SubmittedReport, ApiError> {
    validate_form(form)?;
    let user_id = token_subject(token)
        .ok_or_else(|| ApiError::unauthorized("the access token does not identify a user"))?;

    let backend = ctx.backend_for(token);
    let checklist = active_checklist(&backend, &form.tipo_maquina_id)
        .await
        .map_err(upstream)?;
    let report = prepare_form(form, checklist.id);

    let outcome = ctx
        .submitter_for(token)
        .submit(&user_id, &report)
        .await
        .map_err(upstream)?;
    if let PdfStatus::Failed(reason) = &outcome.pdf {
        warn!(report_id = %outcome.report_id, %reason, "report stored without an archived pdf");
    }
    info!(report_id = %outcome.report_id, user_id = %user_id, details = outcome.submitted, "report submitted");

    let mut submitted = outcome.as_submitted_report();
    if submitted.detalles.procesados == 0 {
        // Older backends answer the batch without a count.
        submitted.detalles.procesados = submitted.detalles.total;
    }
    Ok(submitted)
}

fn validate_form(form: &ReportForm) -> Result<(), ApiError> {
    if form.maquina_id.as_str().trim().is_empty()
        || form.tipo_maquina_id.as_str().trim().is_empty()
        || form.items.is_empty()
    {
        return Err(ApiError::validation(
            "incomplete report: machine, machine type and at least one item are required",
        ));
    }
    Ok(())
}

fn prepare_form(form: &ReportForm, checklist_id: ChecklistId) -> PreparedReport {
    PreparedReport {
        machine_type_id: form.tipo_maquina_id.clone(),
        machine_id: form.maquina_id.clone(),
        checklist_id,
        call_notice: form.aviso_llamada.trim().to_string(),
        comments: form
            .comentarios
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        details: form
            .items
            .iter()
            .map(|answer| ReportDetailInput {
                item_checklist_id: answer.item_id.clone(),
                estado_id: answer.estado_id.clone(),
                observaciones_internas: answer.observaciones_internas.clone().unwrap_or_default(),
                observaciones_cliente: answer.observaciones_cliente.clone().unwrap_or_default(),
            })
            .collect(),
    }
}

/// The report merged with its details, reshaped for front-ends.
pub async fn report_detail(ctx: &ApiContext, token: &str, id: &ReportId) -> Result<Value, ApiError> {
    let backend = ctx.backend_for(token);
    let report = backend.report(id).await.map_err(upstream)?;
    let details = backend.report_details(id).await.map_err(upstream)?;
    reshape_report(report, details)
}

/// Flattens grouped details into `detalles` and synthesizes `grupos` and
/// `items` from them. Details in any other shape are passed through as
/// `detalles` untouched.
pub fn reshape_report(report: Value, details: Value) -> Result<Value, ApiError> {
    let Value::Object(mut body) = report else {
        return Err(ApiError::upstream("the report is not a json object"));
    };

    let grouped = details
        .get("grupos")
        .and_then(|_| serde_json::from_value::<GroupedDetails>(details.clone()).ok());
    let Some(grouped) = grouped else {
        body.insert("detalles".into(), details);
        return Ok(Value::Object(body));
    };

    let checklist_id = body
        .get("checklist")
        .and_then(|c| c.get("id"))
        .or_else(|| body.get("checklist_id"))
        .cloned()
        .unwrap_or(Value::Null);

    let mut detalles = Vec::new();
    let mut grupos = Vec::with_capacity(grouped.grupos.len());
    let mut items = Vec::new();
    for (index, group) in grouped.grupos.into_iter().enumerate() {
        let group_id = format!("grupo-{index}-{}", slug(&group.grupo_nombre));
        for line in group.items {
            items.push(ReportItem {
                id: line.item_id.clone(),
                nombre: line.item_nombre.clone(),
                descripcion: String::new(),
                grupo_id: group_id.clone(),
                checklist_id: checklist_id.clone(),
            });
            let item_checklist_id = Value::String(line.item_id.0.clone());
            if let Ok(Value::Object(mut flat)) = serde_json::to_value(&line) {
                flat.insert("item_checklist_id".into(), item_checklist_id);
                detalles.push(Value::Object(flat));
            }
        }
        grupos.push(ReportGroup {
            id: group_id,
            nombre: group.grupo_nombre,
            orden: index,
            checklist_id: checklist_id.clone(),
        });
    }

    body.insert("detalles".into(), Value::Array(detalles));
    body.insert("grupos".into(), to_value(&grupos)?);
    body.insert("items".into(), to_value(&items)?);
    Ok(Value::Object(body))
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|err| ApiError::new(ErrorCode::Internal, err.to_string()))
}

/// Renders the report PDF on the backend and keeps a copy in the archive.
pub async fn generate_pdf(ctx: &ApiContext, token: &str, id: &ReportId) -> Result<PdfArchived, ApiError> {
    let stored = ctx.submitter_for(token).archive_pdf(id).await.map_err(upstream)?;
    Ok(PdfArchived {
        success: true,
        filename: stored.filename,
        size_bytes: stored.size_bytes,
    })
}

pub async fn fetch_pdf(ctx: &ApiContext, token: &str, id: &ReportId) -> Result<PdfDocument, ApiError> {
    ctx.backend_for(token).report_pdf(id).await.map_err(upstream)
}

pub async fn archived_pdf(ctx: &ApiContext, id: &ReportId) -> Result<(StoredPdf, Vec<u8>), ApiError> {
    ctx.archive
        .read(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "no archived pdf for this report"))
}

fn upstream(err: ClientError) -> ApiError {
    if !matches!(err, ClientError::Validation(_)) {
        warn!(error = %err, "backend call failed");
    }
    err.to_api_error()
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
