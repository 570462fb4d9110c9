use shared::domain::{ChecklistId, ItemResult, MachineId, MachineTypeId};
use shared::protocol::ReportDetailInput;

use crate::wizard::{ValidationError, Wizard};

/// A finished inspection, ready to be sent to the report backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedReport {
    pub machine_type_id: MachineTypeId,
    pub machine_id: MachineId,
    pub checklist_id: ChecklistId,
    pub call_notice: String,
    pub comments: String,
    pub details: Vec<ReportDetailInput>,
}

impl Wizard {
    /// Assembles every answered item, in checklist order, into report details.
    pub fn prepare_report(&self) -> Result<PreparedReport, ValidationError> {
        self.ensure_ready_to_submit()?;
        let checklist = self.checklist().ok_or(ValidationError::ChecklistNotLoaded)?;
        let draft = self.draft();

        let machine_type_id = draft
            .machine_type
            .as_ref()
            .map(|t| t.id.clone())
            .ok_or(ValidationError::MissingMachineType)?;
        let machine_id = draft.machine_id.clone().ok_or(ValidationError::MissingMachine)?;

        let mut details = Vec::new();
        for item in checklist.items() {
            let Some(response) = draft.responses.response(&item.id) else {
                continue;
            };
            if response.result == ItemResult::Unset {
                continue;
            }
            let state = checklist
                .states
                .state_for(response.result)
                .ok_or(ValidationError::NoStateForResult(response.result))?;
            details.push(ReportDetailInput {
                item_checklist_id: item.id.clone(),
                estado_id: state.id.clone(),
                observaciones_internas: response.notes_internal.clone().unwrap_or_default(),
                observaciones_cliente: response.notes_external.clone().unwrap_or_default(),
            });
        }

        Ok(PreparedReport {
            machine_type_id,
            machine_id,
            checklist_id: checklist.checklist.id.clone(),
            call_notice: draft.call_notice.clone(),
            comments: draft.comments.trim().to_string(),
            details,
        })
    }
}
