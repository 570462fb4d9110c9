use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::ReportId;
use storage::{PdfArchive, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/inspector.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ListDrafts,
    ShowDraft {
        #[arg(default_value = "current")]
        slot: String,
    },
    ClearDraft {
        #[arg(default_value = "current")]
        slot: String,
    },
    ListPdfs,
    /// Looks a report's PDF up in the index, falling back to the directory.
    FindPdf {
        report_id: String,
        #[arg(long, default_value = "./data/pdfs")]
        pdf_dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::ListDrafts => {
            for draft in storage.list_drafts().await? {
                println!("{}\t{}", draft.slot, draft.updated_at.to_rfc3339());
            }
        }
        Command::ShowDraft { slot } => match storage.load_draft(&slot).await? {
            Some(draft) => println!("{}", serde_json::to_string_pretty(&draft)?),
            None => println!("no draft in slot {slot}"),
        },
        Command::ClearDraft { slot } => {
            if storage.clear_draft(&slot).await? {
                println!("cleared draft {slot}");
            } else {
                println!("no draft in slot {slot}");
            }
        }
        Command::ListPdfs => {
            for pdf in storage.list_pdfs().await? {
                println!(
                    "{}\t{}\t{} bytes\t{}",
                    pdf.report_id,
                    pdf.stored_at.to_rfc3339(),
                    pdf.size_bytes,
                    pdf.path.display()
                );
            }
        }
        Command::FindPdf { report_id, pdf_dir } => {
            let archive = PdfArchive::new(pdf_dir, storage);
            match archive.find(&ReportId::new(report_id.as_str())).await? {
                Some(pdf) => println!("{}", pdf.path.display()),
                None => println!("no pdf archived for report {report_id}"),
            }
        }
    }

    Ok(())
}
