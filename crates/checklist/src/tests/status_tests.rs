use shared::domain::{ChecklistItem, GroupId, GroupStatus, ItemId, ItemResult};

use super::{aggregate, group_status};
use crate::responses::ResponseStore;

use ItemResult::{NotApplicable, Nok, Ok, Pending, Unset};

#[test]
fn any_failure_turns_the_group_red() {
    assert_eq!(aggregate([Ok, Pending, Nok]), GroupStatus::Red);
    assert_eq!(aggregate([Nok, Unset]), GroupStatus::Red);
    assert_eq!(aggregate([NotApplicable, Nok]), GroupStatus::Red);
}

#[test]
fn not_applicable_or_pending_without_failures_is_orange() {
    assert_eq!(aggregate([Ok, NotApplicable]), GroupStatus::Orange);
    assert_eq!(aggregate([Pending, Unset]), GroupStatus::Orange);
    assert_eq!(aggregate([Pending]), GroupStatus::Orange);
}

#[test]
fn green_requires_every_item_ok() {
    assert_eq!(aggregate([Ok, Ok, Ok]), GroupStatus::Green);
    assert_eq!(aggregate([Ok, Unset]), GroupStatus::Gray);
}

#[test]
fn empty_or_untouched_groups_are_gray() {
    assert_eq!(aggregate(Vec::<ItemResult>::new()), GroupStatus::Gray);
    assert_eq!(aggregate([Unset, Unset]), GroupStatus::Gray);
}

#[test]
fn four_item_groups_take_the_worst_result() {
    assert_eq!(aggregate([Ok, Nok, NotApplicable, Ok]), GroupStatus::Red);
    assert_eq!(aggregate([Ok, Ok, Pending, Ok]), GroupStatus::Orange);
    assert_eq!(aggregate([Ok, Ok, Ok, Ok]), GroupStatus::Green);
    assert_eq!(aggregate([Unset, Ok, Ok, Ok]), GroupStatus::Gray);
}

#[test]
fn aggregate_ignores_result_order() {
    let results = [Ok, Pending, Ok, Unset];
    let mut reversed = results;
    reversed.reverse();
    assert_eq!(aggregate(results), aggregate(reversed));
}

fn item(id: &str) -> ChecklistItem {
    ChecklistItem {
        id: ItemId::new(id),
        group_id: GroupId::new("g1"),
        name: id.to_string(),
        description: None,
        order: 0,
        required: true,
    }
}

#[test]
fn group_status_treats_missing_responses_as_unset() {
    let items = vec![item("a"), item("b")];
    let mut responses = ResponseStore::default();
    assert_eq!(group_status(&items, &responses), GroupStatus::Gray);

    responses.set_result(&ItemId::new("a"), Ok);
    assert_eq!(group_status(&items, &responses), GroupStatus::Gray);

    responses.set_result(&ItemId::new("b"), Ok);
    assert_eq!(group_status(&items, &responses), GroupStatus::Green);

    responses.set_result(&ItemId::new("b"), Nok);
    assert_eq!(group_status(&items, &responses), GroupStatus::Red);
}
