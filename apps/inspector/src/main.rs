use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{token_hint, BackendClient, InspectionBackend, InspectionSession, ReportSubmitter};
use shared::{
    domain::{MachineTypeId, ReportId, UserId},
    protocol::ReportFilters,
};
use storage::{prepare_database_url, PdfArchive, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod inspect;
mod prompt;
mod render;
mod settings;

use prompt::Prompt;
use settings::{load_settings, Settings, DEFAULT_DATABASE_URL};

#[derive(Parser, Debug)]
#[command(about = "Machine inspection checklists from the terminal")]
struct Cli {
    /// Settings file, instead of ./inspector.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Signs in and keeps the session for later commands.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Lists machine types.
    Types,
    /// Lists machines of one type.
    Machines {
        #[arg(long = "type")]
        machine_type: String,
    },
    /// Walks through a checklist and files the report. Resumes a saved draft unless `--restart`.
    Inspect {
        #[arg(long)]
        restart: bool,
    },
    /// Lists filed reports.
    Reports {
        #[arg(long = "type")]
        machine_type: Option<String>,
        #[arg(long)]
        chassis: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Downloads a report's PDF into the local archive.
    Pdf { report_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url {
        settings.backend_url = url;
    }
    if let Some(url) = cli.database_url {
        settings.database_url = url;
    }
    let database_url = prepare_database_url(&settings.database_url, DEFAULT_DATABASE_URL)?;
    let storage = Storage::new(&database_url)
        .await
        .with_context(|| format!("failed to open {database_url}"))?;

    match cli.command {
        Command::Login { email, password } => {
            let client = BackendClient::new(&settings.backend_url)?;
            let session = client.login(&email, &password).await?;
            storage
                .save_session(&session.access_token, &session.user_id)
                .await?;
            info!(user_id = %session.user_id, token = %token_hint(&session.access_token), "session stored");
            println!("signed in as {}", session.user_id);
        }
        Command::Logout => {
            storage.clear_session().await?;
            println!("signed out");
        }
        Command::Types => {
            let (client, _) = signed_in(&settings, &storage).await?;
            println!("{}", render::machine_types(&client.machine_types().await?));
        }
        Command::Machines { machine_type } => {
            let (client, _) = signed_in(&settings, &storage).await?;
            let machines = client
                .machines_by_type(&MachineTypeId::new(machine_type))
                .await?;
            println!("{}", render::machines(&machines));
        }
        Command::Inspect { restart } => {
            let (client, user_id) = signed_in(&settings, &storage).await?;
            let archive = PdfArchive::new(&settings.pdf_dir, storage.clone());
            let mut session = InspectionSession::new(
                Arc::new(client),
                Arc::new(storage.clone()),
                Arc::new(archive),
                user_id,
            );
            inspect::run(&mut session, &mut Prompt::stdin(), restart).await?;
        }
        Command::Reports {
            machine_type,
            chassis,
            from,
            to,
            page,
            page_size,
        } => {
            let (client, _) = signed_in(&settings, &storage).await?;
            let filters = ReportFilters {
                tipo_maquina_id: machine_type.map(MachineTypeId::new),
                numero_bastidor: chassis,
                fecha_desde: from,
                fecha_hasta: to,
                page,
                page_size,
            };
            println!("{}", render::report_page(&client.list_reports(&filters).await?));
        }
        Command::Pdf { report_id } => {
            let (client, _) = signed_in(&settings, &storage).await?;
            let archive = PdfArchive::new(&settings.pdf_dir, storage.clone());
            let stored = ReportSubmitter::new(Arc::new(client), Arc::new(archive))
                .archive_pdf(&ReportId::new(report_id))
                .await?;
            println!("{} ({} bytes)", stored.path.display(), stored.size_bytes);
        }
    }
    Ok(())
}

/// The backend client for the stored session.
async fn signed_in(settings: &Settings, storage: &Storage) -> Result<(BackendClient, UserId)> {
    let session = storage
        .load_session()
        .await?
        .context("not signed in, run `inspector login` first")?;
    let client = BackendClient::new(&settings.backend_url)?.with_token(session.access_token);
    Ok((client, session.user_id))
}
