//! Inspection checklist logic: result aggregation, the per-item response
//! store, and the wizard that walks a machine through its checklist.

pub mod catalog;
pub mod draft;
pub mod latch;
pub mod responses;
pub mod status;
pub mod submission;
pub mod summary;
pub mod wizard;

pub use catalog::{classify_state_name, pick_checklist, GroupWithItems, LoadedChecklist, StateCatalog};
pub use draft::{DraftStore, InspectionDraft, MachineTypeSelection, MemoryDraftStore};
pub use latch::{NavigationLatch, NAVIGATION_TIMEOUT};
pub use responses::{ItemResponse, NotesField, ResponseStore};
pub use status::{aggregate, group_status};
pub use submission::PreparedReport;
pub use summary::{failures, summarize, GroupSummary, SummaryLine};
pub use wizard::{Step, ValidationError, Wizard};

#[cfg(test)]
#[path = "tests/fixtures.rs"]
pub(crate) mod fixtures;
