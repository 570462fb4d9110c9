use anyhow::{bail, Result};
use checklist::Step;
use client_core::{ClientError, InspectionSession, PdfStatus, SubmitOutcome};
use shared::domain::ItemId;
use tracing::warn;

use crate::{
    prompt::{parse_command, Prompt, StepCommand, HELP},
    render,
};

enum Flow {
    Continue,
    Leave,
}

/// Runs one inspection on the terminal, from machine type to filed report.
/// Leaving early keeps the draft for the next run.
pub async fn run(session: &mut InspectionSession, prompt: &mut Prompt, restart: bool) -> Result<()> {
    if let Some(draft) = session.pending_draft().await? {
        let machine = draft
            .machine_type
            .as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_default();
        let resume = !restart
            && prompt
                .confirm(&format!("An inspection of a {machine} is in progress. Resume it?"), true)
                .await?;
        if resume {
            match session.resume(draft).await {
                Ok(step) => println!("resuming at {step}"),
                // The draft stays saved for the next run.
                Err(err) => return report(err),
            }
        } else {
            session.start_over().await?;
        }
    }

    loop {
        let flow = match session.wizard().step() {
            Step::TypeSelection => choose_machine_type(session, prompt).await,
            Step::MachineSelection => choose_machine(session, prompt).await,
            Step::ChecklistStep(_) | Step::Summary => checklist_command(session, prompt).await,
        };
        match flow {
            Ok(Flow::Continue) => {}
            Ok(Flow::Leave) => return Ok(()),
            Err(err) => report(err)?,
        }
    }
}

/// Prints errors the user can act on and keeps going. Anything else ends the run.
fn report(err: ClientError) -> Result<()> {
    match err {
        ClientError::Validation(_) | ClientError::NoChecklist(_) => println!("! {err}"),
        ClientError::Unauthorized(_) => {
            bail!("{} (run `inspector login` again)", err.user_message())
        }
        ClientError::Upstream { .. } | ClientError::Transport { .. } | ClientError::Decode { .. } => {
            warn!(error = %err, "backend request failed");
            println!("! {}", err.user_message());
        }
        ClientError::InvalidUrl(_) | ClientError::Storage(_) => return Err(err.into()),
    }
    Ok(())
}

async fn choose_machine_type(session: &mut InspectionSession, prompt: &mut Prompt) -> Result<Flow, ClientError> {
    let types = session.machine_types().await?;
    if types.is_empty() {
        println!("no machine types are configured");
        return Ok(Flow::Leave);
    }
    println!("{}", render::machine_types(&types));
    let Some(index) = ask_choice(prompt, "Machine type:", types.len()).await else {
        return Ok(Flow::Leave);
    };
    session.choose_machine_type(&types[index]).await?;
    Ok(Flow::Continue)
}

async fn choose_machine(session: &mut InspectionSession, prompt: &mut Prompt) -> Result<Flow, ClientError> {
    let machines = session.machines().await?;
    if machines.is_empty() {
        println!("no machines of this type are registered");
        return Ok(Flow::Leave);
    }
    println!("{}", render::machines(&machines));
    let Some(index) = ask_choice(prompt, "Machine:", machines.len()).await else {
        return Ok(Flow::Leave);
    };
    let Some(call_notice) = ask_line(prompt, "Call notice:").await else {
        return Ok(Flow::Leave);
    };
    session.choose_machine(&machines[index], &call_notice).await?;
    Ok(Flow::Continue)
}

async fn checklist_command(session: &mut InspectionSession, prompt: &mut Prompt) -> Result<Flow, ClientError> {
    let step = session.wizard().step();
    let screen = match step {
        Step::Summary => session.wizard().checklist().map(|checklist| {
            render::summary_screen(checklist, session.wizard().responses(), &session.wizard().draft().comments)
        }),
        _ => render::group_screen(session.wizard()),
    };
    if let Some(screen) = screen {
        println!("\n{screen}");
    }

    let Some(line) = ask_line(prompt, ">").await else {
        session.save().await?;
        return Ok(Flow::Leave);
    };
    let command = match parse_command(&line) {
        Ok(command) => command,
        Err(message) => {
            println!("! {message}");
            return Ok(Flow::Continue);
        }
    };

    match command {
        StepCommand::Set { item, result } => {
            let Some(item_id) = item_at(session, item) else {
                println!("! there is no item {item} in this group");
                return Ok(Flow::Continue);
            };
            let now = session.set_result(&item_id, result)?;
            if !now.is_set() {
                println!("cleared item {item}");
            }
        }
        StepCommand::Note { item, field, text } => {
            let Some(item_id) = item_at(session, item) else {
                println!("! there is no item {item} in this group");
                return Ok(Flow::Continue);
            };
            if !session.set_notes(&item_id, field, text)? {
                println!("! observations can only be added to an answered item");
            }
        }
        StepCommand::Comments(text) => session.set_comments(text),
        StepCommand::Next => {
            session.advance().await?;
        }
        StepCommand::Back => {
            session.back();
        }
        StepCommand::Save => {
            session.save().await?;
            println!("draft saved");
        }
        StepCommand::Submit if step == Step::Summary => {
            let outcome = session.submit().await?;
            print_outcome(&outcome);
            return Ok(Flow::Leave);
        }
        StepCommand::Submit => println!("! finish every group before submitting"),
        StepCommand::Quit => {
            session.save().await?;
            println!("draft saved, run `inspector inspect` to continue");
            return Ok(Flow::Leave);
        }
        StepCommand::Help => println!("{HELP}"),
    }
    Ok(Flow::Continue)
}

fn item_at(session: &InspectionSession, position: usize) -> Option<ItemId> {
    let group = session.wizard().current_group()?;
    group.items.get(position.checked_sub(1)?).map(|item| item.id.clone())
}

fn print_outcome(outcome: &SubmitOutcome) {
    let filed = outcome.as_submitted_report();
    println!(
        "report {} filed ({} of {} details stored)",
        filed.id, filed.detalles.procesados, filed.detalles.total
    );
    match &outcome.pdf {
        PdfStatus::Archived(stored) => println!("pdf saved to {}", stored.path.display()),
        PdfStatus::Failed(reason) => println!("the pdf could not be generated: {reason}"),
    }
}

/// Stdin read failures end the run the same way a closed stdin does.
async fn ask_line(prompt: &mut Prompt, question: &str) -> Option<String> {
    match prompt.ask(question).await {
        Ok(line) => line,
        Err(err) => {
            warn!(error = %err, "could not read the terminal");
            None
        }
    }
}

async fn ask_choice(prompt: &mut Prompt, question: &str, len: usize) -> Option<usize> {
    match prompt.choose(question, len).await {
        Ok(choice) => choice,
        Err(err) => {
            warn!(error = %err, "could not read the terminal");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/inspect_tests.rs"]
mod tests;
