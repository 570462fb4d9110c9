use shared::domain::{
    Checklist, ChecklistGroup, ChecklistItem, ItemId, ItemResult, PossibleState, StateId,
};

/// Maps a backend state name onto the result it records.
///
/// Names are matched case-insensitively. Anything not recognised counts as a
/// failure so that it always asks for observations.
pub fn classify_state_name(name: &str) -> ItemResult {
    let name = name.trim().to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

    if name == "mal" || has(&["nok", "no ok", "anormal", "incorrect", "defect", "averia"]) {
        ItemResult::Nok
    } else if name == "na" || has(&["n/a", "no aplica"]) {
        ItemResult::NotApplicable
    } else if has(&["pendiente", "pending", "revisar", "atención", "atencion"]) {
        ItemResult::Pending
    } else if has(&["bien", "correcto", "ok", "normal"]) {
        ItemResult::Ok
    } else {
        ItemResult::Nok
    }
}

/// Result states configured for one machine type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateCatalog {
    states: Vec<PossibleState>,
}

impl StateCatalog {
    pub fn new(states: Vec<PossibleState>) -> Self {
        Self { states }
    }

    pub fn states(&self) -> &[PossibleState] {
        &self.states
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// First configured state recording `result`.
    pub fn state_for(&self, result: ItemResult) -> Option<&PossibleState> {
        if !result.is_set() {
            return None;
        }
        self.states
            .iter()
            .find(|state| classify_state_name(&state.name) == result)
    }

    pub fn result_of(&self, state_id: &StateId) -> Option<ItemResult> {
        self.states
            .iter()
            .find(|state| &state.id == state_id)
            .map(|state| classify_state_name(&state.name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupWithItems {
    pub group: ChecklistGroup,
    pub items: Vec<ChecklistItem>,
}

/// A checklist with its groups and items in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedChecklist {
    pub checklist: Checklist,
    pub groups: Vec<GroupWithItems>,
    pub states: StateCatalog,
}

impl LoadedChecklist {
    pub fn new(checklist: Checklist, mut groups: Vec<GroupWithItems>, states: StateCatalog) -> Self {
        groups.sort_by_key(|g| g.group.order);
        for group in &mut groups {
            group.items.sort_by_key(|item| item.order);
        }
        Self {
            checklist,
            groups,
            states,
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group(&self, index: usize) -> Option<&GroupWithItems> {
        self.groups.get(index)
    }

    pub fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    pub fn contains_item(&self, item_id: &ItemId) -> bool {
        self.items().any(|item| &item.id == item_id)
    }
}

/// The active checklist wins; otherwise the first one listed.
pub fn pick_checklist(checklists: Vec<Checklist>) -> Option<Checklist> {
    let active = checklists.iter().position(|c| c.active);
    let mut checklists = checklists;
    match active {
        Some(index) => Some(checklists.swap_remove(index)),
        None => checklists.into_iter().next(),
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
