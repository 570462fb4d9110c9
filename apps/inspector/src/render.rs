use checklist::{failures, group_status, summarize, LoadedChecklist, ResponseStore, Step, Wizard};
use shared::{
    domain::{ItemId, ItemResult, Machine, MachineType},
    protocol::ReportPage,
};

fn result_cell(result: ItemResult) -> &'static str {
    if result.is_set() {
        result.label()
    } else {
        "-"
    }
}

pub fn machine_types(types: &[MachineType]) -> String {
    types
        .iter()
        .enumerate()
        .map(|(n, t)| match t.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => format!("{:>3}. {} ({description})", n + 1, t.name),
            None => format!("{:>3}. {}", n + 1, t.name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn machines(machines: &[Machine]) -> String {
    machines
        .iter()
        .enumerate()
        .map(|(n, m)| {
            let mut line = format!("{:>3}. {}", n + 1, m.display_name());
            if let Some(fleet) = m.fleet_number.as_deref().filter(|f| !f.is_empty()) {
                line.push_str(&format!(" fleet {fleet}"));
            }
            if let Some(zone) = m.zone.as_deref().filter(|z| !z.is_empty()) {
                line.push_str(&format!(" [{zone}]"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The current checklist group with every item's result and notes.
/// Required items are marked with `*`.
pub fn group_screen(wizard: &Wizard) -> Option<String> {
    let Step::ChecklistStep(index) = wizard.step() else {
        return None;
    };
    let checklist = wizard.checklist()?;
    let group = checklist.group(index)?;
    let responses = wizard.responses();

    let status = group_status(&group.items, responses);
    let mut lines = vec![format!(
        "{} Group {}/{}: {}",
        status.badge(),
        index + 1,
        checklist.group_count(),
        group.group.name
    )];
    for (n, item) in group.items.iter().enumerate() {
        let marker = if item.required { '*' } else { ' ' };
        lines.push(format!(
            "{:>3}.{marker} {:<8}{}",
            n + 1,
            result_cell(responses.result(&item.id)),
            item.name
        ));
        lines.extend(note_lines(responses, &item.id));
    }
    if wizard.is_last_group() && !wizard.draft().comments.is_empty() {
        lines.push(format!("comments: {}", wizard.draft().comments));
    }
    Some(lines.join("\n"))
}

fn note_lines(responses: &ResponseStore, item_id: &ItemId) -> Vec<String> {
    let Some(response) = responses.response(item_id) else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    if let Some(notes) = response.notes_internal.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("              internal: {notes}"));
    }
    if let Some(notes) = response.notes_external.as_deref().filter(|n| !n.is_empty()) {
        lines.push(format!("              client: {notes}"));
    }
    lines
}

/// Review before filing: problem groups unfolded first, then a list of failures.
pub fn summary_screen(checklist: &LoadedChecklist, responses: &ResponseStore, comments: &str) -> String {
    let mut lines = vec![format!("Summary of {}", checklist.checklist.name)];
    for summary in summarize(checklist, responses) {
        if !summary.expanded {
            lines.push(format!(
                "{} {} ({} items)",
                summary.status.badge(),
                summary.group.group.name,
                summary.lines.len()
            ));
            continue;
        }
        lines.push(format!("{} {}", summary.status.badge(), summary.group.group.name));
        for line in &summary.lines {
            lines.push(format!("       {:<8}{}", result_cell(line.result()), line.item.name));
        }
    }

    let failed = failures(checklist, responses);
    if !failed.is_empty() {
        lines.push(String::new());
        lines.push(format!("Failed items ({}):", failed.len()));
        for line in failed {
            lines.push(format!("  - {}", line.item.name));
            lines.extend(note_lines(responses, &line.item.id));
        }
    }
    if !comments.trim().is_empty() {
        lines.push(String::new());
        lines.push(format!("Comments: {}", comments.trim()));
    }
    lines.join("\n")
}

pub fn report_page(page: &ReportPage) -> String {
    let mut lines = vec![format!(
        "page {}/{} ({} reports)",
        page.page,
        page.total_pages.max(1),
        page.total
    )];
    for report in &page.data {
        lines.push(format!(
            "{:<12} {}  {:<16} {:<14} {}",
            report.id.as_str(),
            report.fecha_creacion.format("%Y-%m-%d %H:%M"),
            report.tipo_maquina,
            report.numero_bastidor.as_deref().unwrap_or("-"),
            report.aviso_llamada.as_deref().unwrap_or("-"),
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
