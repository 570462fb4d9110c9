use shared::domain::{GroupStatus, ItemId, ItemResult};

use super::{failures, summarize};
use crate::fixtures::loaded_checklist;
use crate::responses::{NotesField, ResponseStore};

#[test]
fn problem_groups_are_listed_first_and_expanded() {
    let checklist = loaded_checklist();
    let mut responses = ResponseStore::default();
    responses.set_result(&ItemId::new("e1"), ItemResult::Ok);
    responses.set_result(&ItemId::new("e2"), ItemResult::Ok);
    responses.set_result(&ItemId::new("b2"), ItemResult::Nok);

    let summary = summarize(&checklist, &responses);
    let order: Vec<_> = summary
        .iter()
        .map(|g| (g.group.group.name.as_str(), g.status, g.expanded))
        .collect();
    assert_eq!(
        order,
        [
            ("Brakes", GroupStatus::Red, true),
            ("Engine", GroupStatus::Green, false),
        ]
    );
    assert_eq!(summary[0].lines[0].result(), ItemResult::Unset);
}

#[test]
fn failures_carry_their_observations() {
    let checklist = loaded_checklist();
    let mut responses = ResponseStore::default();
    responses.set_result(&ItemId::new("b2"), ItemResult::Nok);
    responses.set_notes(&ItemId::new("b2"), NotesField::Internal, "pads worn");
    responses.set_result(&ItemId::new("e1"), ItemResult::Pending);

    let lines = failures(&checklist, &responses);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].item.id, ItemId::new("b2"));
    assert_eq!(
        lines[0].response.and_then(|r| r.notes_internal.as_deref()),
        Some("pads worn")
    );
}
