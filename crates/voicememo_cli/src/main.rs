//! Command-line tools for `voicememo_core`.
//!
//! # Responsibility
//! - Exercise the engine and the SQLite stores from a terminal.
//! - Keep output plain and deterministic for local sanity checks.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use voicememo_core::db::open_db;
use voicememo_core::{
    classify_project, core_version, default_log_level, detect_completion_keywords, init_logging,
    load_config, ping, select_relevant_context_with, CaptureService, NoopEntityExtractor,
    NoteRepository, ProjectService, SqliteNoteRepository, SqliteProjectRepository,
    SqliteTaskRepository, SqliteWriteScope,
};

#[derive(Parser)]
#[command(name = "voicememo", about = "Voice-memo notebook core tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Engine config file (TOML); defaults apply when missing
    #[arg(long, global = true, default_value = "voicememo.toml")]
    config: PathBuf,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a health-check response
    Ping,
    /// Print the core version
    Version,
    /// List completion keywords found in text
    Keywords {
        text: String,
    },
    /// Detect a leading project reference in text
    Classify {
        text: String,

        /// Active project name (repeatable)
        #[arg(long = "project", short)]
        projects: Vec<String>,
    },
    /// Store a note in a database
    Capture {
        text: String,

        #[arg(long)]
        db: PathBuf,
    },
    /// Add a project to a database
    ProjectAdd {
        name: String,

        #[arg(long)]
        db: PathBuf,

        #[arg(long)]
        description: Option<String>,
    },
    /// Print the context that would be sent to the answer composer
    Context {
        question: String,

        #[arg(long)]
        db: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(default_log_level(), log_dir)?;
    }

    match cli.command {
        Commands::Ping => println!("voicememo_core ping={}", ping()),
        Commands::Version => println!("voicememo_core version={}", core_version()),
        Commands::Keywords { text } => {
            for keyword in detect_completion_keywords(&text) {
                println!("{keyword}");
            }
        }
        Commands::Classify { text, projects } => {
            match classify_project(&text, projects.as_slice()) {
                Some(found) => println!("project={}\ntext={}", found.project, found.stripped_text),
                None => println!("project=<none>\ntext={text}"),
            }
        }
        Commands::Capture { text, db } => {
            let config = load_config(&cli.config)?;
            let conn = open_db(db)?;
            let service = CaptureService::new(
                SqliteNoteRepository::try_new(&conn)?,
                SqliteProjectRepository::try_new(&conn)?,
                SqliteTaskRepository::try_new(&conn)?,
                NoopEntityExtractor,
                SqliteWriteScope::new(&conn),
                config.matcher,
            );
            let outcome = service.capture_note(&text)?;
            println!("note_id={}", outcome.note.id);
            println!("project={}", outcome.project.name);
            println!("auto_completed={}", outcome.auto_completed.len());
            println!("suggestions={}", outcome.suggestions.len());
        }
        Commands::ProjectAdd {
            name,
            db,
            description,
        } => {
            let conn = open_db(db)?;
            let service = ProjectService::new(SqliteProjectRepository::try_new(&conn)?);
            let project = service.create_project(&name, description.as_deref(), None)?;
            println!("project_id={}", project.id);
        }
        Commands::Context { question, db } => {
            let config = load_config(&cli.config)?;
            let conn = open_db(db)?;
            let notes = SqliteNoteRepository::try_new(&conn)?.list_notes()?;
            let now_ms = Utc::now().timestamp_millis();
            let selection =
                select_relevant_context_with(&question, &notes, &config.context, now_ms);
            println!("{}", selection.rendered_context);
            println!(
                "-- searched {} of {} notes",
                selection.used_count, selection.total_count
            );
        }
    }

    Ok(())
}
