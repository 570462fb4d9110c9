use std::{sync::Arc, time::Instant};

use checklist::{
    DraftStore, InspectionDraft, NavigationLatch, NotesField, Step, ValidationError, Wizard,
};
use shared::domain::{ItemId, ItemResult, Machine, MachineType, UserId};
use tracing::{debug, info, warn};

use crate::{
    catalog::load_checklist,
    error::ClientError,
    submit::{ReportSubmitter, SubmitOutcome},
    InspectionBackend, PdfSink,
};

pub const DEFAULT_DRAFT_SLOT: &str = "current";

/// Drives one user's inspection. Wizard state lives here and is written to
/// the draft store only at checkpoints: after choosing a machine type or a
/// machine, after each group is completed, and on explicit `save`.
pub struct InspectionSession {
    backend: Arc<dyn InspectionBackend>,
    drafts: Arc<dyn DraftStore>,
    submitter: ReportSubmitter,
    user_id: UserId,
    slot: String,
    wizard: Wizard,
    latch: NavigationLatch,
}

impl InspectionSession {
    pub fn new(
        backend: Arc<dyn InspectionBackend>,
        drafts: Arc<dyn DraftStore>,
        pdfs: Arc<dyn PdfSink>,
        user_id: UserId,
    ) -> Self {
        Self {
            submitter: ReportSubmitter::new(backend.clone(), pdfs),
            backend,
            drafts,
            user_id,
            slot: DEFAULT_DRAFT_SLOT.to_string(),
            wizard: Wizard::new(),
            latch: NavigationLatch::default(),
        }
    }

    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = slot.into();
        self
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// An unfinished inspection left in the draft store, if any.
    pub async fn pending_draft(&self) -> Result<Option<InspectionDraft>, ClientError> {
        let draft = self.drafts.load_draft(&self.slot).await?;
        Ok(draft.filter(InspectionDraft::is_in_progress))
    }

    /// Continues a saved inspection at its resume step.
    pub async fn resume(&mut self, draft: InspectionDraft) -> Result<Step, ClientError> {
        let mut wizard = Wizard::from_draft(draft);
        if matches!(wizard.step(), Step::ChecklistStep(_) | Step::Summary) {
            let machine_type_id = wizard
                .machine_type_id()
                .cloned()
                .ok_or(ValidationError::MissingMachineType)?;
            let checklist = load_checklist(self.backend.as_ref(), &machine_type_id).await?;
            wizard.load_checklist(checklist);
        }
        self.wizard = wizard;
        info!(step = %self.wizard.step(), "resumed inspection draft");
        Ok(self.wizard.step())
    }

    /// Drops any saved draft and starts from the first step.
    pub async fn start_over(&mut self) -> Result<(), ClientError> {
        self.wizard.reset();
        self.drafts.clear_draft(&self.slot).await?;
        Ok(())
    }

    pub async fn machine_types(&self) -> Result<Vec<MachineType>, ClientError> {
        self.backend.machine_types().await
    }

    /// Machines of the selected type.
    pub async fn machines(&self) -> Result<Vec<Machine>, ClientError> {
        let machine_type_id = self
            .wizard
            .machine_type_id()
            .ok_or(ValidationError::MissingMachineType)?;
        self.backend.machines_by_type(machine_type_id).await
    }

    pub async fn choose_machine_type(&mut self, machine_type: &MachineType) -> Result<Step, ClientError> {
        self.begin_navigation()?;
        let outcome = self
            .wizard
            .select_machine_type(machine_type.id.clone(), machine_type.name.clone())
            .and_then(|()| self.wizard.next());
        self.latch.release();
        let step = outcome?;
        self.checkpoint().await?;
        Ok(step)
    }

    /// Records the machine and call notice, loads its checklist and opens
    /// the first group.
    pub async fn choose_machine(&mut self, machine: &Machine, call_notice: &str) -> Result<Step, ClientError> {
        self.begin_navigation()?;
        let outcome = self.enter_checklist(machine, call_notice).await;
        self.latch.release();
        let step = outcome?;
        self.checkpoint().await?;
        Ok(step)
    }

    async fn enter_checklist(&mut self, machine: &Machine, call_notice: &str) -> Result<Step, ClientError> {
        self.wizard.select_machine(machine.id.clone(), call_notice)?;
        if self.wizard.draft().call_notice.is_empty() {
            return Err(ValidationError::MissingCallNotice.into());
        }
        let machine_type_id = self
            .wizard
            .machine_type_id()
            .cloned()
            .ok_or(ValidationError::MissingMachineType)?;
        let checklist = load_checklist(self.backend.as_ref(), &machine_type_id).await?;
        self.wizard.load_checklist(checklist);
        Ok(self.wizard.next()?)
    }

    pub fn set_result(&mut self, item_id: &ItemId, result: ItemResult) -> Result<ItemResult, ClientError> {
        Ok(self.wizard.set_result(item_id, result)?)
    }

    pub fn set_notes(
        &mut self,
        item_id: &ItemId,
        field: NotesField,
        text: impl Into<String>,
    ) -> Result<bool, ClientError> {
        Ok(self.wizard.set_notes(item_id, field, text)?)
    }

    pub fn set_comments(&mut self, comments: impl Into<String>) {
        self.wizard.set_comments(comments);
    }

    /// Leaves the current step. Guard failures keep the step and skip the checkpoint.
    pub async fn advance(&mut self) -> Result<Step, ClientError> {
        self.begin_navigation()?;
        let outcome = self.wizard.next();
        self.latch.release();
        let step = outcome?;
        self.checkpoint().await?;
        Ok(step)
    }

    pub fn back(&mut self) -> Step {
        self.wizard.back()
    }

    pub async fn save(&self) -> Result<(), ClientError> {
        self.checkpoint().await
    }

    /// Files the inspection. On success the wizard and the saved draft are
    /// cleared; on failure nothing changes and the user may submit again.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ClientError> {
        let prepared = self.wizard.prepare_report()?;
        let outcome = self.submitter.submit(&self.user_id, &prepared).await?;

        self.wizard.reset();
        if let Err(err) = self.drafts.clear_draft(&self.slot).await {
            warn!(error = %err, slot = %self.slot, "report filed but the draft could not be cleared");
            // An empty draft is never offered for resuming.
            if let Err(err) = self.drafts.save_draft(&self.slot, self.wizard.draft()).await {
                warn!(error = %err, slot = %self.slot, "filed inspection is still stored as a draft");
            }
        }
        info!(report_id = %outcome.report_id, "inspection submitted");
        Ok(outcome)
    }

    fn begin_navigation(&mut self) -> Result<(), ClientError> {
        if self.latch.try_begin(Instant::now()) {
            Ok(())
        } else {
            Err(ValidationError::NavigationInProgress.into())
        }
    }

    async fn checkpoint(&self) -> Result<(), ClientError> {
        self.drafts.save_draft(&self.slot, self.wizard.draft()).await?;
        debug!(slot = %self.slot, step = %self.wizard.step(), "draft checkpoint");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
