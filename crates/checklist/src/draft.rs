use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::domain::{ChecklistId, MachineId, MachineTypeId};
use tokio::sync::Mutex;

use crate::responses::ResponseStore;
use crate::wizard::Step;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineTypeSelection {
    pub id: MachineTypeId,
    pub name: String,
}

/// Everything an interrupted inspection needs to pick up where it stopped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionDraft {
    #[serde(default)]
    pub machine_type: Option<MachineTypeSelection>,
    #[serde(default)]
    pub machine_id: Option<MachineId>,
    #[serde(default)]
    pub call_notice: String,
    #[serde(default)]
    pub checklist_id: Option<ChecklistId>,
    #[serde(default)]
    pub responses: ResponseStore,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub checklist_complete: bool,
    /// Step the wizard was on at the last checkpoint.
    #[serde(default)]
    pub step: Step,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl InspectionDraft {
    pub fn is_in_progress(&self) -> bool {
        self.machine_type.is_some()
    }

    /// Furthest step the draft can resume at without repeating finished work.
    pub fn resume_step(&self) -> Step {
        match (&self.machine_type, &self.machine_id) {
            (_, Some(_)) if self.checklist_complete => Step::Summary,
            (_, Some(_)) => Step::ChecklistStep(0),
            (Some(_), None) => Step::MachineSelection,
            (None, None) => Step::TypeSelection,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Persistence for drafts, addressed by a named slot.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn load_draft(&self, slot: &str) -> Result<Option<InspectionDraft>>;
    async fn save_draft(&self, slot: &str, draft: &InspectionDraft) -> Result<()>;
    async fn clear_draft(&self, slot: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    drafts: Mutex<HashMap<String, InspectionDraft>>,
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn load_draft(&self, slot: &str) -> Result<Option<InspectionDraft>> {
        Ok(self.drafts.lock().await.get(slot).cloned())
    }

    async fn save_draft(&self, slot: &str, draft: &InspectionDraft) -> Result<()> {
        self.drafts
            .lock()
            .await
            .insert(slot.to_string(), draft.clone());
        Ok(())
    }

    async fn clear_draft(&self, slot: &str) -> Result<()> {
        self.drafts.lock().await.remove(slot);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/draft_tests.rs"]
mod tests;
