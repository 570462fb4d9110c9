use std::io::Write;

use anyhow::{Context, Result};
use checklist::NotesField;
use shared::domain::ItemResult;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// What the user typed while a checklist group or the summary is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCommand {
    /// Item numbers are 1-based positions within the shown group.
    Set { item: usize, result: ItemResult },
    Note { item: usize, field: NotesField, text: String },
    Comments(String),
    Next,
    Back,
    Save,
    Submit,
    Quit,
    Help,
}

pub const HELP: &str = "\
  <n> ok|nok|na|pending       set item <n> (repeat the same result to clear it)
  note <n> internal <text>    internal observations for a failed item
  note <n> client <text>      observations shown to the customer
  comments <text>             general comments for the report
  next | back                 move between groups
  save                        keep the draft and continue
  submit                      file the report (from the summary)
  quit                        save the draft and leave";

pub fn parse_result(word: &str) -> Option<ItemResult> {
    match word.to_ascii_lowercase().as_str() {
        "ok" | "bien" => Some(ItemResult::Ok),
        "nok" | "mal" => Some(ItemResult::Nok),
        "na" | "n/a" => Some(ItemResult::NotApplicable),
        "pending" | "pendiente" => Some(ItemResult::Pending),
        _ => None,
    }
}

pub fn parse_command(line: &str) -> Result<StepCommand, String> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map(|(head, rest)| (head, rest.trim()))
        .unwrap_or((line, ""));

    match head.to_ascii_lowercase().as_str() {
        "" => Err("type a command, or `help`".to_string()),
        "next" | "n" => Ok(StepCommand::Next),
        "back" | "b" => Ok(StepCommand::Back),
        "save" => Ok(StepCommand::Save),
        "submit" => Ok(StepCommand::Submit),
        "quit" | "q" | "exit" => Ok(StepCommand::Quit),
        "help" | "?" => Ok(StepCommand::Help),
        "comments" | "comment" => Ok(StepCommand::Comments(rest.to_string())),
        "note" => parse_note(rest),
        number => {
            let item = parse_item_number(number)?;
            let result = parse_result(rest)
                .ok_or_else(|| format!("unknown result `{rest}`, use ok, nok, na or pending"))?;
            Ok(StepCommand::Set { item, result })
        }
    }
}

fn parse_note(rest: &str) -> Result<StepCommand, String> {
    let mut parts = rest.splitn(3, char::is_whitespace);
    let item = parse_item_number(parts.next().unwrap_or_default())?;
    let field = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("internal" | "internas" | "i") => NotesField::Internal,
        Some("client" | "cliente" | "c") => NotesField::External,
        _ => return Err("use `note <n> internal <text>` or `note <n> client <text>`".to_string()),
    };
    let text = parts.next().unwrap_or_default().trim().to_string();
    Ok(StepCommand::Note { item, field, text })
}

fn parse_item_number(word: &str) -> Result<usize, String> {
    match word.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("`{word}` is not an item number")),
    }
}

/// Line-oriented questions on stdin.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` once stdin is closed.
    pub async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        print!("{question} ");
        std::io::stdout().flush().context("failed to write to stdout")?;
        let line = self.lines.next_line().await.context("failed to read stdin")?;
        Ok(line.map(|l| l.trim().to_string()))
    }

    pub async fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let answer = self.ask(&format!("{question} {hint}")).await?;
        Ok(match answer.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("y" | "yes" | "s" | "si") => true,
            Some("n" | "no") => false,
            _ => default,
        })
    }

    /// A 1-based choice from a list of `len` entries.
    pub async fn choose(&mut self, question: &str, len: usize) -> Result<Option<usize>> {
        loop {
            let Some(answer) = self.ask(question).await? else {
                return Ok(None);
            };
            match answer.parse::<usize>() {
                Ok(n) if (1..=len).contains(&n) => return Ok(Some(n - 1)),
                _ => println!("enter a number between 1 and {len}"),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/prompt_tests.rs"]
mod tests;
