use shared::domain::{ChecklistItem, GroupStatus, ItemResult};

use crate::responses::ResponseStore;

/// Collapses the results of one group into its traffic-light status.
///
/// Any failure wins. Otherwise any N/A or pending result asks for attention.
/// A group is only green once every item is OK; an empty or partially
/// answered group stays gray.
pub fn aggregate<I>(results: I) -> GroupStatus
where
    I: IntoIterator<Item = ItemResult>,
{
    let mut seen_any = false;
    let mut all_ok = true;
    let mut needs_attention = false;

    for result in results {
        seen_any = true;
        match result {
            ItemResult::Nok => return GroupStatus::Red,
            ItemResult::NotApplicable | ItemResult::Pending => {
                needs_attention = true;
                all_ok = false;
            }
            ItemResult::Unset => all_ok = false,
            ItemResult::Ok => {}
        }
    }

    if needs_attention {
        GroupStatus::Orange
    } else if seen_any && all_ok {
        GroupStatus::Green
    } else {
        GroupStatus::Gray
    }
}

pub fn group_status(items: &[ChecklistItem], responses: &ResponseStore) -> GroupStatus {
    aggregate(items.iter().map(|item| responses.result(&item.id)))
}

#[cfg(test)]
#[path = "tests/status_tests.rs"]
mod tests;
