use shared::domain::{ChecklistItem, GroupStatus, ItemResult};

use crate::catalog::{GroupWithItems, LoadedChecklist};
use crate::responses::{ItemResponse, ResponseStore};
use crate::status::group_status;

#[derive(Debug, Clone)]
pub struct SummaryLine<'a> {
    pub item: &'a ChecklistItem,
    pub response: Option<&'a ItemResponse>,
}

impl SummaryLine<'_> {
    pub fn result(&self) -> ItemResult {
        self.response.map(|r| r.result).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct GroupSummary<'a> {
    pub group: &'a GroupWithItems,
    pub status: GroupStatus,
    /// Groups with problems are shown unfolded.
    pub expanded: bool,
    pub lines: Vec<SummaryLine<'a>>,
}

/// Per-group review of an inspection. Groups needing attention come first,
/// otherwise checklist order is kept.
pub fn summarize<'a>(checklist: &'a LoadedChecklist, responses: &'a ResponseStore) -> Vec<GroupSummary<'a>> {
    let mut groups: Vec<GroupSummary<'a>> = checklist
        .groups
        .iter()
        .map(|group| {
            let status = group_status(&group.items, responses);
            GroupSummary {
                group,
                status,
                expanded: status.has_problems(),
                lines: group
                    .items
                    .iter()
                    .map(|item| SummaryLine {
                        item,
                        response: responses.response(&item.id),
                    })
                    .collect(),
            }
        })
        .collect();
    groups.sort_by_key(|summary| !summary.expanded);
    groups
}

/// Failed items with their observations, in checklist order.
pub fn failures<'a>(checklist: &'a LoadedChecklist, responses: &'a ResponseStore) -> Vec<SummaryLine<'a>> {
    checklist
        .items()
        .filter_map(|item| {
            let response = responses.response(&item.id)?;
            (response.result == ItemResult::Nok).then_some(SummaryLine {
                item,
                response: Some(response),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/summary_tests.rs"]
mod tests;
