use checklist::{InspectionDraft, MachineTypeSelection, Step};
use shared::domain::{ItemId, ItemResult, MachineId, MachineTypeId};

use super::*;

fn draft() -> InspectionDraft {
    let mut draft = InspectionDraft {
        machine_type: Some(MachineTypeSelection {
            id: MachineTypeId::new("t-1"),
            name: "Forklift".to_string(),
        }),
        machine_id: Some(MachineId::new("m-1")),
        call_notice: "AV-1".to_string(),
        step: Step::ChecklistStep(1),
        ..Default::default()
    };
    draft.responses.set_result(&ItemId::new("i-1"), ItemResult::Nok);
    draft
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn drafts_are_saved_replaced_and_cleared() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.load_draft("current").await.expect("load").is_none());

    let mut saved = draft();
    storage.save_draft("current", &saved).await.expect("save");
    let loaded = storage.load_draft("current").await.expect("load").expect("draft");
    assert!(loaded.updated_at.is_some());
    assert_eq!(loaded.machine_id, saved.machine_id);
    assert_eq!(loaded.step, Step::ChecklistStep(1));
    assert_eq!(loaded.responses.result(&ItemId::new("i-1")), ItemResult::Nok);

    saved.call_notice = "AV-2".to_string();
    storage.save_draft("current", &saved).await.expect("save again");
    let loaded = storage.load_draft("current").await.expect("load").expect("draft");
    assert_eq!(loaded.call_notice, "AV-2");
    assert_eq!(storage.list_drafts().await.expect("list").len(), 1);

    assert!(storage.clear_draft("current").await.expect("clear"));
    assert!(!storage.clear_draft("current").await.expect("clear twice"));
    assert!(storage.load_draft("current").await.expect("load").is_none());
}

#[tokio::test]
async fn storage_serves_as_a_draft_store() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let store: &dyn DraftStore = &storage;
    store.save_draft("slot", &draft()).await.expect("save");
    assert!(store.load_draft("slot").await.expect("load").is_some());
    store.clear_draft("slot").await.expect("clear");
    assert!(store.load_draft("slot").await.expect("load").is_none());
}

#[tokio::test]
async fn unreadable_draft_payload_is_an_error() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    sqlx::query("INSERT INTO drafts (slot, payload, updated_at) VALUES ('bad', 'not json', '2024-01-01T00:00:00Z')")
        .execute(storage.pool())
        .await
        .expect("insert");
    assert!(storage.load_draft("bad").await.is_err());
}

#[tokio::test]
async fn session_is_replaced_on_login() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.load_session().await.expect("load").is_none());

    storage
        .save_session("token-a", &UserId::new("u-1"))
        .await
        .expect("save");
    storage
        .save_session("token-b", &UserId::new("u-2"))
        .await
        .expect("save");
    let session = storage.load_session().await.expect("load").expect("session");
    assert_eq!(session.access_token, "token-b");
    assert_eq!(session.user_id, UserId::new("u-2"));

    storage.clear_session().await.expect("clear");
    assert!(storage.load_session().await.expect("load").is_none());
}

#[tokio::test]
async fn pdf_index_lists_newest_first() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for (id, offset) in [("r-1", 10), ("r-2", 0)] {
        storage
            .record_pdf(&StoredPdf {
                report_id: ReportId::new(id),
                filename: format!("{id}_informe.pdf"),
                path: PathBuf::from(format!("/tmp/{id}_informe.pdf")),
                size_bytes: 100,
                stored_at: Utc::now() - chrono::Duration::seconds(offset),
            })
            .await
            .expect("record");
    }
    let listed: Vec<_> = storage
        .list_pdfs()
        .await
        .expect("list")
        .into_iter()
        .map(|pdf| pdf.report_id)
        .collect();
    assert_eq!(listed, vec![ReportId::new("r-2"), ReportId::new("r-1")]);
    assert!(storage
        .pdf_for_report(&ReportId::new("r-1"))
        .await
        .expect("lookup")
        .is_some());
}
