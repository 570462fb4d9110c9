use shared::domain::{ItemId, ItemResult, MachineId, MachineTypeId};

use super::*;
use crate::fixtures::loaded_checklist;

fn id(value: &str) -> ItemId {
    ItemId::new(value)
}

fn at_first_group() -> Wizard {
    let mut wizard = Wizard::new();
    wizard
        .select_machine_type(MachineTypeId::new("t-1"), "Forklift")
        .expect("type");
    wizard.next().expect("to machine");
    wizard
        .select_machine(MachineId::new("m-1"), " AV-2024-1 ")
        .expect("machine");
    wizard.load_checklist(loaded_checklist());
    assert_eq!(wizard.next().expect("to checklist"), Step::ChecklistStep(0));
    wizard
}

#[test]
fn type_selection_requires_a_type() {
    let mut wizard = Wizard::new();
    assert_eq!(wizard.next(), Err(ValidationError::MissingMachineType));
    assert_eq!(wizard.step(), Step::TypeSelection);
}

#[test]
fn machine_step_requires_machine_and_call_notice() {
    let mut wizard = Wizard::new();
    wizard
        .select_machine_type(MachineTypeId::new("t-1"), "Forklift")
        .expect("type");
    wizard.next().expect("to machine");
    assert_eq!(wizard.next(), Err(ValidationError::MissingMachine));

    wizard.select_machine(MachineId::new("m-1"), "   ").expect("machine");
    assert_eq!(wizard.next(), Err(ValidationError::MissingCallNotice));

    wizard.select_machine(MachineId::new("m-1"), "AV-1").expect("machine");
    assert_eq!(wizard.next(), Err(ValidationError::ChecklistNotLoaded));
    assert_eq!(wizard.step(), Step::MachineSelection);
}

#[test]
fn call_notice_is_trimmed() {
    let wizard = at_first_group();
    assert_eq!(wizard.draft().call_notice, "AV-2024-1");
}

#[test]
fn groups_are_walked_in_order() {
    let wizard = at_first_group();
    assert_eq!(
        wizard.current_group().map(|g| g.group.name.as_str()),
        Some("Engine")
    );
}

#[test]
fn forward_is_blocked_while_an_item_is_unset() {
    let mut wizard = at_first_group();
    wizard.set_result(&id("e1"), ItemResult::Ok).expect("result");

    let err = wizard.next().expect_err("guard");
    match err {
        ValidationError::IncompleteGroup { unanswered, .. } => assert_eq!(unanswered, vec![id("e2")]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(wizard.step(), Step::ChecklistStep(0));
}

#[test]
fn failed_items_need_internal_notes_before_moving_on() {
    let mut wizard = at_first_group();
    wizard.set_result(&id("e1"), ItemResult::Ok).expect("result");
    wizard.set_result(&id("e2"), ItemResult::Nok).expect("result");
    wizard
        .set_notes(&id("e2"), NotesField::External, "visible to the customer")
        .expect("notes");

    match wizard.next() {
        Err(ValidationError::IncompleteGroup { missing_notes, unanswered, .. }) => {
            assert_eq!(missing_notes, vec![id("e2")]);
            assert!(unanswered.is_empty());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(wizard.step(), Step::ChecklistStep(0));

    wizard
        .set_notes(&id("e2"), NotesField::Internal, "oil leak at gasket")
        .expect("notes");
    assert_eq!(wizard.next(), Ok(Step::ChecklistStep(1)));
}

#[test]
fn validation_message_names_the_group() {
    let wizard = at_first_group();
    let message = wizard.validate_group(0).expect_err("incomplete").to_string();
    assert!(message.contains("Engine"), "{message}");
    assert!(message.contains("2 item(s) have no result"), "{message}");
}

#[test]
fn leaving_the_last_group_reaches_the_summary() {
    let mut wizard = at_first_group();
    for item in ["e1", "e2"] {
        wizard.set_result(&id(item), ItemResult::Ok).expect("result");
    }
    wizard.next().expect("to brakes");
    assert!(wizard.is_last_group());
    for item in ["b1", "b2"] {
        wizard.set_result(&id(item), ItemResult::NotApplicable).expect("result");
    }
    assert_eq!(wizard.next(), Ok(Step::Summary));
    assert!(wizard.draft().checklist_complete);
}

#[test]
fn backward_steps_are_unguarded() {
    let mut wizard = at_first_group();
    assert_eq!(wizard.back(), Step::MachineSelection);
    assert_eq!(wizard.back(), Step::TypeSelection);
    assert_eq!(wizard.back(), Step::TypeSelection);
}

#[test]
fn back_from_summary_returns_to_the_last_group() {
    let mut wizard = at_first_group();
    for item in ["e1", "e2"] {
        wizard.set_result(&id(item), ItemResult::Ok).expect("result");
    }
    wizard.next().expect("to brakes");
    for item in ["b1", "b2"] {
        wizard.set_result(&id(item), ItemResult::Ok).expect("result");
    }
    wizard.next().expect("to summary");

    assert_eq!(wizard.back(), Step::ChecklistStep(1));
    assert!(!wizard.draft().checklist_complete);
    assert_eq!(wizard.back(), Step::ChecklistStep(0));
}

#[test]
fn results_for_unknown_items_are_rejected() {
    let mut wizard = at_first_group();
    assert_eq!(
        wizard.set_result(&id("zz"), ItemResult::Ok),
        Err(ValidationError::UnknownItem(id("zz")))
    );
}

#[test]
fn changing_the_machine_type_discards_later_choices() {
    let mut wizard = at_first_group();
    wizard.set_result(&id("e1"), ItemResult::Ok).expect("result");
    wizard.back();
    wizard.back();

    wizard
        .select_machine_type(MachineTypeId::new("t-1"), "Forklift")
        .expect("same type");
    assert_eq!(wizard.draft().machine_id, Some(MachineId::new("m-1")));

    wizard
        .select_machine_type(MachineTypeId::new("t-2"), "Crane")
        .expect("other type");
    assert!(wizard.draft().machine_id.is_none());
    assert!(wizard.responses().is_empty());
    assert!(wizard.checklist().is_none());
}

#[test]
fn selections_outside_their_step_are_rejected() {
    let mut wizard = at_first_group();
    assert_eq!(
        wizard.select_machine(MachineId::new("m-2"), "AV"),
        Err(ValidationError::WrongStep(Step::ChecklistStep(0)))
    );
}

#[test]
fn group_statuses_follow_the_answers() {
    let mut wizard = at_first_group();
    wizard.set_result(&id("e1"), ItemResult::Ok).expect("result");
    wizard.set_result(&id("e2"), ItemResult::Pending).expect("result");
    assert_eq!(
        wizard.group_statuses(),
        vec![GroupStatus::Orange, GroupStatus::Gray]
    );
}

#[test]
fn resumed_draft_starts_at_its_resume_step() {
    let mut wizard = at_first_group();
    wizard.set_result(&id("e1"), ItemResult::Ok).expect("result");

    let mut resumed = Wizard::from_draft(wizard.draft().clone());
    assert_eq!(resumed.step(), Step::ChecklistStep(0));
    assert!(resumed.checklist().is_none());

    resumed.load_checklist(loaded_checklist());
    assert_eq!(resumed.responses().result(&id("e1")), ItemResult::Ok);
}

#[test]
fn submission_requires_required_items_and_prepares_details() {
    let mut wizard = at_first_group();
    wizard.set_result(&id("e1"), ItemResult::Ok).expect("result");
    wizard.set_result(&id("e2"), ItemResult::Nok).expect("result");
    wizard
        .set_notes(&id("e2"), NotesField::Internal, "worn")
        .expect("notes");
    wizard.next().expect("to brakes");
    wizard.set_result(&id("b1"), ItemResult::Pending).expect("result");
    wizard.set_result(&id("b2"), ItemResult::Ok).expect("result");
    wizard.set_comments("  all done  ");

    assert_eq!(
        wizard.prepare_report().map(|_| ()),
        Err(ValidationError::WrongStep(Step::ChecklistStep(1)))
    );
    wizard.next().expect("to summary");

    let report = wizard.prepare_report().expect("report");
    assert_eq!(report.comments, "all done");
    assert_eq!(report.call_notice, "AV-2024-1");
    let items: Vec<_> = report
        .details
        .iter()
        .map(|d| (d.item_checklist_id.as_str(), d.estado_id.as_str()))
        .collect();
    assert_eq!(
        items,
        [("e1", "s-ok"), ("e2", "s-nok"), ("b1", "s-pending"), ("b2", "s-ok")]
    );
    assert_eq!(report.details[1].observaciones_internas, "worn");
}

#[test]
fn reset_returns_to_the_first_step() {
    let mut wizard = at_first_group();
    wizard.set_result(&id("e1"), ItemResult::Ok).expect("result");
    wizard.reset();
    assert_eq!(wizard.step(), Step::TypeSelection);
    assert!(wizard.responses().is_empty());
    assert!(wizard.draft().machine_type.is_none());
}
