mod draft;
mod record;
mod rules;
mod sanitize;
mod session;
mod submit;
mod tui;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use draft::DraftStore;
use record::FieldId;
use rules::validate;
use session::{FormSession, SubmitOutcome};
use submit::{boundary_for, LogBoundary, SubmissionController};

#[derive(Parser)]
#[command(name = "apply")]
#[command(about = "Job application drafting - validate, autosave, and submit applications")]
struct Cli {
    /// Draft store file (defaults to the per-user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive application form
    Form {
        /// Submission endpoint (falls back to APPLY_SUBMIT_URL, then a logging stub)
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Set one field on the saved draft
    Set {
        /// Field name (e.g. role-title, company-name, advert-link, linkedin)
        field: String,

        /// New value ("true"/"false" for linkedin)
        value: String,
    },

    /// Validate the saved draft
    Check,

    /// Show the saved draft
    Show,

    /// Discard the saved draft
    Clear,

    /// Validate, sanitize, and submit the saved draft
    Submit {
        /// Submission endpoint (falls back to APPLY_SUBMIT_URL, then a logging stub)
        #[arg(short, long)]
        endpoint: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    let cli = Cli::parse();
    let store = match &cli.db {
        Some(path) => DraftStore::open_at(path),
        None => DraftStore::open(),
    };

    match cli.command {
        Commands::Form { endpoint } => {
            let controller = SubmissionController::new(boundary_for(endpoint.as_deref())?);
            let session = FormSession::start(store, controller);
            tui::run_form(session)?;
        }

        Commands::Set { field, value } => {
            let field = FieldId::from_arg(&field)?;
            let controller = SubmissionController::new(Box::new(LogBoundary));
            let mut session = FormSession::start(store, controller);
            session.on_edit(field, &value);
            println!("{} = {}", field.name(), session.record().get(field));
        }

        Commands::Check => match store.load() {
            None => println!("No draft saved."),
            Some(record) => match validate(&record) {
                Ok(()) => println!("Draft is valid."),
                Err(issues) => {
                    println!("{} issue(s):", issues.len());
                    for issue in &issues {
                        println!("  {}: {}", issue.field.name(), issue.message);
                    }
                }
            },
        },

        Commands::Show => match store.load() {
            None => println!("No draft saved (store at {}).", store.path().display()),
            Some(record) => {
                for field in FieldId::ALL {
                    let value = record.get(field);
                    if value.is_empty() {
                        continue;
                    }
                    println!("{:<20} {}", format!("{}:", field.label()), value);
                }
            }
        },

        Commands::Clear => {
            store.clear();
            println!("Draft discarded.");
        }

        Commands::Submit { endpoint } => {
            let controller = SubmissionController::new(boundary_for(endpoint.as_deref())?);
            let mut session = FormSession::start(store, controller);
            if session.store().load().is_none() {
                println!("No draft saved. Run 'apply form' or 'apply set' first.");
                return Ok(());
            }
            match session.on_submit()? {
                SubmitOutcome::Submitted(record) => {
                    println!(
                        "Submitted application for {} at {} ({}).",
                        record.role_title, record.company_name, session.boundary_name()
                    );
                }
                SubmitOutcome::Invalid(issues) => {
                    println!("Draft is not ready to submit:");
                    for issue in &issues {
                        println!("  {}: {}", issue.field.name(), issue.message);
                    }
                    return Err(anyhow!("{} validation issue(s)", issues.len()));
                }
            }
        }
    }

    Ok(())
}
