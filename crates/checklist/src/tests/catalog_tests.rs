use shared::domain::{
    Checklist, ChecklistGroup, ChecklistId, ChecklistItem, GroupId, ItemId, ItemResult,
    MachineTypeId, PossibleState, StateId,
};

use super::*;

fn state(id: &str, name: &str) -> PossibleState {
    PossibleState {
        id: StateId::new(id),
        machine_type_id: MachineTypeId::new("t1"),
        name: name.to_string(),
    }
}

fn checklist(id: &str, active: bool) -> Checklist {
    Checklist {
        id: ChecklistId::new(id),
        machine_type_id: MachineTypeId::new("t1"),
        name: format!("checklist {id}"),
        description: None,
        version: "1".to_string(),
        active,
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn state_names_classify_case_insensitively() {
    assert_eq!(classify_state_name("OK"), ItemResult::Ok);
    assert_eq!(classify_state_name(" Bien "), ItemResult::Ok);
    assert_eq!(classify_state_name("correcto"), ItemResult::Ok);
    assert_eq!(classify_state_name("NOK"), ItemResult::Nok);
    assert_eq!(classify_state_name("Incorrecto"), ItemResult::Nok);
    assert_eq!(classify_state_name("N/A"), ItemResult::NotApplicable);
    assert_eq!(classify_state_name("No aplica"), ItemResult::NotApplicable);
    assert_eq!(classify_state_name("Pendiente de revisar"), ItemResult::Pending);
}

#[test]
fn unknown_state_names_count_as_failures() {
    assert_eq!(classify_state_name("Desgastado"), ItemResult::Nok);
    assert_eq!(classify_state_name(""), ItemResult::Nok);
}

#[test]
fn abnormal_is_not_read_as_normal() {
    assert_eq!(classify_state_name("Normal"), ItemResult::Ok);
    assert_eq!(classify_state_name("Anormal"), ItemResult::Nok);
    assert_eq!(classify_state_name("Funcionamiento anormal"), ItemResult::Nok);
}

#[test]
fn catalog_resolves_results_to_state_ids() {
    let catalog = StateCatalog::new(vec![
        state("s-ok", "Bien"),
        state("s-nok", "Mal"),
        state("s-na", "N/A"),
    ]);
    assert_eq!(
        catalog.state_for(ItemResult::Nok).map(|s| s.id.clone()),
        Some(StateId::new("s-nok"))
    );
    assert!(catalog.state_for(ItemResult::Pending).is_none());
    assert!(catalog.state_for(ItemResult::Unset).is_none());
    assert_eq!(
        catalog.result_of(&StateId::new("s-na")),
        Some(ItemResult::NotApplicable)
    );
    assert_eq!(catalog.result_of(&StateId::new("other")), None);
}

#[test]
fn active_checklist_is_preferred() {
    let picked = pick_checklist(vec![checklist("a", false), checklist("b", true), checklist("c", true)]);
    assert_eq!(picked.map(|c| c.id), Some(ChecklistId::new("b")));

    let fallback = pick_checklist(vec![checklist("a", false), checklist("b", false)]);
    assert_eq!(fallback.map(|c| c.id), Some(ChecklistId::new("a")));

    assert!(pick_checklist(Vec::new()).is_none());
}

#[test]
fn loaded_checklist_orders_groups_and_items() {
    let group = |id: &str, order: i32, items: Vec<ChecklistItem>| GroupWithItems {
        group: ChecklistGroup {
            id: GroupId::new(id),
            checklist_id: ChecklistId::new("a"),
            name: id.to_string(),
            description: None,
            order,
        },
        items,
    };
    let item = |id: &str, order: i32| ChecklistItem {
        id: ItemId::new(id),
        group_id: GroupId::new("g"),
        name: id.to_string(),
        description: None,
        order,
        required: true,
    };

    let loaded = LoadedChecklist::new(
        checklist("a", true),
        vec![
            group("second", 2, vec![item("y", 2), item("x", 1)]),
            group("first", 1, vec![item("z", 1)]),
        ],
        StateCatalog::default(),
    );

    let names: Vec<_> = loaded.groups.iter().map(|g| g.group.name.as_str()).collect();
    assert_eq!(names, ["first", "second"]);
    let items: Vec<_> = loaded.items().map(|i| i.id.as_str()).collect();
    assert_eq!(items, ["z", "x", "y"]);
    assert!(loaded.contains_item(&ItemId::new("y")));
    assert!(!loaded.contains_item(&ItemId::new("missing")));
}
