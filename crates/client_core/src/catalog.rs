use checklist::{pick_checklist, GroupWithItems, LoadedChecklist, StateCatalog};
use shared::domain::{Checklist, MachineTypeId};
use tracing::info;

use crate::{error::ClientError, InspectionBackend};

/// The checklist in use for a machine type.
pub async fn active_checklist(
    backend: &dyn InspectionBackend,
    machine_type_id: &MachineTypeId,
) -> Result<Checklist, ClientError> {
    let checklists = backend.checklists_by_type(machine_type_id).await?;
    pick_checklist(checklists).ok_or_else(|| ClientError::NoChecklist(machine_type_id.clone()))
}

/// Fetches the active checklist for a machine type with all its groups,
/// items and result states.
pub async fn load_checklist(
    backend: &dyn InspectionBackend,
    machine_type_id: &MachineTypeId,
) -> Result<LoadedChecklist, ClientError> {
    let checklist = active_checklist(backend, machine_type_id).await?;

    let groups = backend.groups(&checklist.id).await?;
    let mut loaded = Vec::with_capacity(groups.len());
    for group in groups {
        let items = backend.items(&group.id).await?;
        loaded.push(GroupWithItems { group, items });
    }
    let states = backend.states_by_type(machine_type_id).await?;

    info!(
        checklist_id = %checklist.id,
        groups = loaded.len(),
        states = states.len(),
        "checklist loaded"
    );
    Ok(LoadedChecklist::new(checklist, loaded, StateCatalog::new(states)))
}
