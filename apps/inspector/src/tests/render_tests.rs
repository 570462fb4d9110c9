use checklist::{
    GroupWithItems, InspectionDraft, MachineTypeSelection, NotesField, StateCatalog,
};
use chrono::{TimeZone, Utc};
use shared::{
    domain::{
        Checklist, ChecklistGroup, ChecklistId, ChecklistItem, GroupId, MachineId, MachineTypeId,
        ReportId,
    },
    protocol::ReportSummary,
};

use super::*;

fn item(group: &str, id: &str, name: &str, required: bool) -> ChecklistItem {
    ChecklistItem {
        id: ItemId::new(id),
        group_id: GroupId::new(group),
        name: name.to_string(),
        description: None,
        order: 0,
        required,
    }
}

fn group(id: &str, name: &str, order: i32, items: Vec<ChecklistItem>) -> GroupWithItems {
    GroupWithItems {
        group: ChecklistGroup {
            id: GroupId::new(id),
            checklist_id: ChecklistId::new("cl-1"),
            name: name.to_string(),
            description: None,
            order,
        },
        items,
    }
}

fn checklist() -> LoadedChecklist {
    LoadedChecklist::new(
        Checklist {
            id: ChecklistId::new("cl-1"),
            machine_type_id: MachineTypeId::new("t-1"),
            name: "Forklift daily".to_string(),
            description: None,
            version: "2".to_string(),
            active: true,
            created_at: None,
            updated_at: None,
        },
        vec![
            group(
                "g-engine",
                "Engine",
                1,
                vec![
                    item("g-engine", "e1", "Oil level", true),
                    item("g-engine", "e2", "Coolant", true),
                ],
            ),
            group("g-brakes", "Brakes", 2, vec![item("g-brakes", "b1", "Pads", false)]),
        ],
        StateCatalog::new(Vec::new()),
    )
}

fn wizard_on_first_group() -> Wizard {
    let draft = InspectionDraft {
        machine_type: Some(MachineTypeSelection {
            id: MachineTypeId::new("t-1"),
            name: "Forklift".to_string(),
        }),
        machine_id: Some(MachineId::new("m-1")),
        call_notice: "AV-1".to_string(),
        ..Default::default()
    };
    let mut wizard = Wizard::from_draft(draft);
    wizard.load_checklist(checklist());
    wizard
}

#[test]
fn group_screen_shows_results_notes_and_required_marks() {
    let mut wizard = wizard_on_first_group();
    let oil = ItemId::new("e1");
    wizard.set_result(&oil, ItemResult::Nok).expect("result");
    wizard
        .set_notes(&oil, NotesField::Internal, "leak at the sump")
        .expect("notes");

    let screen = group_screen(&wizard).expect("checklist step");
    let lines: Vec<&str> = screen.lines().collect();
    assert_eq!(lines[0], "[FAIL] Group 1/2: Engine");
    assert!(lines[1].contains("1.* NOK"));
    assert!(lines[1].ends_with("Oil level"));
    assert!(lines[2].ends_with("internal: leak at the sump"));
    assert!(lines[3].contains("2.* -"));
}

#[test]
fn group_screen_is_empty_outside_checklist_steps() {
    assert!(group_screen(&Wizard::new()).is_none());
}

#[test]
fn summary_lists_problem_groups_first_with_failures() {
    let checklist = checklist();
    let mut responses = ResponseStore::default();
    responses.set_result(&ItemId::new("b1"), ItemResult::Ok);
    responses.set_result(&ItemId::new("e1"), ItemResult::Nok);
    responses.set_notes(&ItemId::new("e1"), NotesField::Internal, "leak");
    responses.set_result(&ItemId::new("e2"), ItemResult::Ok);

    let screen = summary_screen(&checklist, &responses, "  yard 3 ");
    let lines: Vec<&str> = screen.lines().collect();
    assert_eq!(lines[0], "Summary of Forklift daily");
    assert_eq!(lines[1], "[FAIL] Engine");
    assert!(lines[2].trim_start().starts_with("NOK"));
    assert!(screen.contains("[ OK ] Brakes (1 items)"));
    assert!(screen.contains("Failed items (1):\n  - Oil level\n              internal: leak"));
    assert!(screen.ends_with("Comments: yard 3"));
}

#[test]
fn report_page_lists_one_line_per_report() {
    let page = ReportPage {
        data: vec![ReportSummary {
            id: ReportId::new("r-1"),
            fecha_creacion: Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
            fecha_finalizacion: None,
            maquina_id: MachineId::new("m-1"),
            tipo_maquina: "Forklift".to_string(),
            numero_bastidor: Some("BST-77".to_string()),
            nombre: None,
            aviso_llamada: None,
        }],
        total: 1,
        page: 1,
        page_size: 20,
        total_pages: 1,
    };
    let screen = report_page(&page);
    let lines: Vec<&str> = screen.lines().collect();
    assert_eq!(lines[0], "page 1/1 (1 reports)");
    assert!(lines[1].starts_with("r-1 "));
    assert!(lines[1].contains("2024-05-01 10:30"));
    assert!(lines[1].contains("BST-77"));
    assert!(lines[1].ends_with('-'));
}

#[test]
fn machine_types_are_numbered_from_one() {
    let types = vec![
        MachineType {
            id: MachineTypeId::new("t-1"),
            name: "Forklift".to_string(),
            description: Some("electric".to_string()),
        },
        MachineType {
            id: MachineTypeId::new("t-2"),
            name: "Crane".to_string(),
            description: None,
        },
    ];
    assert_eq!(machine_types(&types), "  1. Forklift (electric)\n  2. Crane");
}
