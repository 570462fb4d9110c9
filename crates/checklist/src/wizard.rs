use std::fmt;

use serde::{Deserialize, Serialize};
use shared::domain::{ChecklistId, GroupStatus, ItemId, ItemResult, MachineId, MachineTypeId};
use thiserror::Error;
use tracing::debug;

use crate::catalog::{GroupWithItems, LoadedChecklist};
use crate::draft::{InspectionDraft, MachineTypeSelection};
use crate::responses::{NotesField, ResponseStore};
use crate::status::group_status;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", content = "group", rename_all = "snake_case")]
pub enum Step {
    #[default]
    TypeSelection,
    MachineSelection,
    ChecklistStep(usize),
    Summary,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::TypeSelection => f.write_str("machine type selection"),
            Step::MachineSelection => f.write_str("machine selection"),
            Step::ChecklistStep(index) => write!(f, "checklist group {}", index + 1),
            Step::Summary => f.write_str("summary"),
        }
    }
}

/// Guard failures. The message is meant for the person filling the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("select a machine type to continue")]
    MissingMachineType,
    #[error("select a machine to continue")]
    MissingMachine,
    #[error("the call notice is required")]
    MissingCallNotice,
    #[error("the checklist for this machine has not been loaded")]
    ChecklistNotLoaded,
    #[error("no checklist groups are configured for this machine type")]
    EmptyChecklist,
    #[error(
        "review \"{group}\": {} item(s) have no result and {} failed item(s) have no internal observations",
        .unanswered.len(),
        .missing_notes.len()
    )]
    IncompleteGroup {
        group: String,
        unanswered: Vec<ItemId>,
        missing_notes: Vec<ItemId>,
    },
    #[error("{} required item(s) have not been answered", .0.len())]
    RequiredItemsMissing(Vec<ItemId>),
    #[error("item {0} is not part of the loaded checklist")]
    UnknownItem(ItemId),
    #[error("no backend state is configured for result {0}")]
    NoStateForResult(ItemResult),
    #[error("this action is not available during {0}")]
    WrongStep(Step),
    #[error("another step change is still in progress")]
    NavigationInProgress,
}

/// Drives one inspection through its steps. All mutation goes through here so
/// the guards cannot be bypassed.
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    draft: InspectionDraft,
    checklist: Option<LoadedChecklist>,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a persisted draft at its resume step. The checklist must be
    /// loaded again before checklist steps can be used.
    pub fn from_draft(mut draft: InspectionDraft) -> Self {
        draft.step = draft.resume_step();
        Self {
            draft,
            checklist: None,
        }
    }

    pub fn step(&self) -> Step {
        self.draft.step
    }

    pub fn draft(&self) -> &InspectionDraft {
        &self.draft
    }

    pub fn responses(&self) -> &ResponseStore {
        &self.draft.responses
    }

    pub fn checklist(&self) -> Option<&LoadedChecklist> {
        self.checklist.as_ref()
    }

    pub fn machine_type_id(&self) -> Option<&MachineTypeId> {
        self.draft.machine_type.as_ref().map(|t| &t.id)
    }

    pub fn current_group(&self) -> Option<&GroupWithItems> {
        match self.draft.step {
            Step::ChecklistStep(index) => self.checklist.as_ref()?.group(index),
            _ => None,
        }
    }

    /// Status of every group of the loaded checklist, in order.
    pub fn group_statuses(&self) -> Vec<GroupStatus> {
        self.checklist
            .as_ref()
            .map(|checklist| {
                checklist
                    .groups
                    .iter()
                    .map(|group| group_status(&group.items, &self.draft.responses))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_last_group(&self) -> bool {
        match (self.draft.step, &self.checklist) {
            (Step::ChecklistStep(index), Some(checklist)) => index + 1 == checklist.group_count(),
            _ => false,
        }
    }

    /// Choosing a different type discards everything chosen after it.
    pub fn select_machine_type(
        &mut self,
        id: MachineTypeId,
        name: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.expect_step(Step::TypeSelection)?;
        if self.machine_type_id() != Some(&id) {
            let step = self.draft.step;
            self.draft.reset();
            self.draft.step = step;
            self.checklist = None;
        }
        self.draft.machine_type = Some(MachineTypeSelection {
            id,
            name: name.into(),
        });
        Ok(())
    }

    pub fn select_machine(
        &mut self,
        machine_id: MachineId,
        call_notice: impl Into<String>,
    ) -> Result<(), ValidationError> {
        self.expect_step(Step::MachineSelection)?;
        self.draft.machine_id = Some(machine_id);
        self.draft.call_notice = call_notice.into().trim().to_string();
        Ok(())
    }

    /// Installs the checklist for the selected machine type. Answers recorded
    /// against a different checklist are dropped.
    pub fn load_checklist(&mut self, checklist: LoadedChecklist) {
        let id: ChecklistId = checklist.checklist.id.clone();
        if self.draft.checklist_id.as_ref().is_some_and(|current| current != &id) {
            debug!(checklist_id = %id, "checklist changed, discarding answers");
            self.draft.responses.reset();
            self.draft.checklist_complete = false;
        }
        self.draft.checklist_id = Some(id);
        if let Step::ChecklistStep(index) = self.draft.step {
            let last = checklist.group_count().saturating_sub(1);
            self.draft.step = Step::ChecklistStep(index.min(last));
        }
        self.checklist = Some(checklist);
    }

    pub fn set_result(
        &mut self,
        item_id: &ItemId,
        result: ItemResult,
    ) -> Result<ItemResult, ValidationError> {
        self.ensure_known_item(item_id)?;
        Ok(self.draft.responses.set_result(item_id, result))
    }

    pub fn set_notes(
        &mut self,
        item_id: &ItemId,
        field: NotesField,
        text: impl Into<String>,
    ) -> Result<bool, ValidationError> {
        self.ensure_known_item(item_id)?;
        Ok(self.draft.responses.set_notes(item_id, field, text))
    }

    pub fn set_comments(&mut self, comments: impl Into<String>) {
        self.draft.comments = comments.into();
    }

    /// Checks that every item of group `index` is answered and every failure
    /// carries internal observations.
    pub fn validate_group(&self, index: usize) -> Result<(), ValidationError> {
        let checklist = self.checklist.as_ref().ok_or(ValidationError::ChecklistNotLoaded)?;
        let Some(group) = checklist.group(index) else {
            return Err(ValidationError::EmptyChecklist);
        };

        let mut unanswered = Vec::new();
        let mut missing_notes = Vec::new();
        for item in &group.items {
            match self.draft.responses.response(&item.id) {
                Some(response) if response.is_complete() => {}
                Some(response) if response.result.is_set() => missing_notes.push(item.id.clone()),
                _ => unanswered.push(item.id.clone()),
            }
        }

        if unanswered.is_empty() && missing_notes.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::IncompleteGroup {
                group: group.group.name.clone(),
                unanswered,
                missing_notes,
            })
        }
    }

    /// Required items that still have no result, in checklist order.
    pub fn missing_required(&self) -> Vec<ItemId> {
        let Some(checklist) = &self.checklist else {
            return Vec::new();
        };
        checklist
            .items()
            .filter(|item| item.required && !self.draft.responses.result(&item.id).is_set())
            .map(|item| item.id.clone())
            .collect()
    }

    /// Moves one step forward. A failed guard leaves the wizard untouched.
    pub fn next(&mut self) -> Result<Step, ValidationError> {
        let next = match self.draft.step {
            Step::TypeSelection => {
                if self.draft.machine_type.is_none() {
                    return Err(ValidationError::MissingMachineType);
                }
                Step::MachineSelection
            }
            Step::MachineSelection => {
                if self.draft.machine_id.is_none() {
                    return Err(ValidationError::MissingMachine);
                }
                if self.draft.call_notice.trim().is_empty() {
                    return Err(ValidationError::MissingCallNotice);
                }
                let checklist = self.checklist.as_ref().ok_or(ValidationError::ChecklistNotLoaded)?;
                if checklist.group_count() == 0 {
                    return Err(ValidationError::EmptyChecklist);
                }
                Step::ChecklistStep(0)
            }
            Step::ChecklistStep(index) => {
                self.validate_group(index)?;
                let count = self.checklist.as_ref().map_or(0, LoadedChecklist::group_count);
                if index + 1 < count {
                    Step::ChecklistStep(index + 1)
                } else {
                    self.draft.checklist_complete = true;
                    Step::Summary
                }
            }
            Step::Summary => Step::Summary,
        };
        debug!(from = %self.draft.step, to = %next, "wizard advanced");
        self.draft.step = next;
        Ok(next)
    }

    /// Moves one step back. Never fails.
    pub fn back(&mut self) -> Step {
        let previous = match self.draft.step {
            Step::TypeSelection | Step::MachineSelection => Step::TypeSelection,
            Step::ChecklistStep(0) => Step::MachineSelection,
            Step::ChecklistStep(index) => Step::ChecklistStep(index - 1),
            Step::Summary => {
                self.draft.checklist_complete = false;
                match self.checklist.as_ref().map_or(0, LoadedChecklist::group_count) {
                    0 => Step::MachineSelection,
                    count => Step::ChecklistStep(count - 1),
                }
            }
        };
        self.draft.step = previous;
        previous
    }

    /// Final checks before the form leaves the summary.
    pub fn ensure_ready_to_submit(&self) -> Result<(), ValidationError> {
        self.expect_step(Step::Summary)?;
        let checklist = self.checklist.as_ref().ok_or(ValidationError::ChecklistNotLoaded)?;
        for index in 0..checklist.group_count() {
            self.validate_group(index)?;
        }
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(ValidationError::RequiredItemsMissing(missing));
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.draft.reset();
        self.checklist = None;
    }

    fn expect_step(&self, expected: Step) -> Result<(), ValidationError> {
        if self.draft.step == expected {
            Ok(())
        } else {
            Err(ValidationError::WrongStep(self.draft.step))
        }
    }

    fn ensure_known_item(&self, item_id: &ItemId) -> Result<(), ValidationError> {
        let checklist = self.checklist.as_ref().ok_or(ValidationError::ChecklistNotLoaded)?;
        if checklist.contains_item(item_id) {
            Ok(())
        } else {
            Err(ValidationError::UnknownItem(item_id.clone()))
        }
    }
}

#[cfg(test)]
#[path = "tests/wizard_tests.rs"]
mod tests;
