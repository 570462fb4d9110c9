use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::domain::{ItemId, ItemResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResponse {
    pub item_id: ItemId,
    pub result: ItemResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_internal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_external: Option<String>,
}

impl ItemResponse {
    fn unset(item_id: ItemId) -> Self {
        Self {
            item_id,
            result: ItemResult::Unset,
            notes_internal: None,
            notes_external: None,
        }
    }

    pub fn has_internal_notes(&self) -> bool {
        self.notes_internal
            .as_deref()
            .is_some_and(|notes| !notes.trim().is_empty())
    }

    /// A failed item is only complete once it explains the failure internally.
    pub fn is_complete(&self) -> bool {
        self.result.is_set() && (!self.result.keeps_notes() || self.has_internal_notes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesField {
    /// Technician-facing observations.
    Internal,
    /// Observations shown to the customer.
    External,
}

/// Answers recorded during one inspection, keyed by item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseStore {
    responses: BTreeMap<ItemId, ItemResponse>,
}

impl ResponseStore {
    /// Records `result` for an item, or clears it when the same result is
    /// selected again. Returns the result the item ends up with.
    ///
    /// Observations only survive while the item is failed.
    pub fn set_result(&mut self, item_id: &ItemId, result: ItemResult) -> ItemResult {
        let entry = self
            .responses
            .entry(item_id.clone())
            .or_insert_with(|| ItemResponse::unset(item_id.clone()));

        let next = if entry.result == result {
            ItemResult::Unset
        } else {
            result
        };
        entry.result = next;
        if !next.keeps_notes() {
            entry.notes_internal = None;
            entry.notes_external = None;
        }
        next
    }

    /// Returns false, leaving the store untouched, when the item has no result yet.
    pub fn set_notes(&mut self, item_id: &ItemId, field: NotesField, text: impl Into<String>) -> bool {
        let Some(entry) = self.responses.get_mut(item_id) else {
            return false;
        };
        if !entry.result.is_set() {
            return false;
        }
        let slot = match field {
            NotesField::Internal => &mut entry.notes_internal,
            NotesField::External => &mut entry.notes_external,
        };
        *slot = Some(text.into());
        true
    }

    pub fn result(&self, item_id: &ItemId) -> ItemResult {
        self.responses
            .get(item_id)
            .map(|response| response.result)
            .unwrap_or_default()
    }

    pub fn response(&self, item_id: &ItemId) -> Option<&ItemResponse> {
        self.responses.get(item_id)
    }

    /// Number of stored entries, including items toggled back to UNSET.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Responses that currently hold a result.
    pub fn answered(&self) -> impl Iterator<Item = &ItemResponse> {
        self.responses.values().filter(|response| response.result.is_set())
    }

    pub fn answered_count(&self) -> usize {
        self.answered().count()
    }

    pub fn is_empty(&self) -> bool {
        self.answered_count() == 0
    }

    pub fn reset(&mut self) {
        self.responses.clear();
    }
}

#[cfg(test)]
#[path = "tests/responses_tests.rs"]
mod tests;
