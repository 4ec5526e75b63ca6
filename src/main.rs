//! Interview Feedback - command-line entry point
//!
//! Drives the synthesis and query layers against the configured document
//! store. Results are printed as pretty JSON on stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use interview_feedback::{
    config::AppConfig,
    error::Result,
    import::import_interviews,
    tech::TechLogoResolver,
    DocumentStore, FeedbackId, FeedbackSynthesizer, InMemoryStore, InterviewId, InterviewQueries,
    LibsqlStore, LlmService, SynthesisRequest, TranscriptEntry, UserId,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "interview-feedback")]
#[command(about = "Structured feedback for mock interviews", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./interview-feedback.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Database path (overrides store.path for the local backend)
    #[arg(long, env = "INTERVIEW_FEEDBACK_DB_PATH")]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate feedback for a finished interview transcript
    Synthesize {
        /// Interview being evaluated
        #[arg(long)]
        interview: String,

        /// Candidate who took the interview
        #[arg(long)]
        user: String,

        /// JSON file with `[{"role": ..., "content": ...}]` entries
        #[arg(long)]
        transcript: PathBuf,

        /// Overwrite an existing feedback record
        #[arg(long)]
        feedback: Option<String>,
    },

    /// Show one interview
    Interview {
        /// Interview id
        id: String,
    },

    /// Show the feedback a user received for an interview
    Feedback {
        #[arg(long)]
        interview: String,

        #[arg(long)]
        user: String,
    },

    /// Latest finalized interviews from other users
    Feed {
        #[arg(long)]
        user: String,

        /// Maximum number of interviews
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// All interviews owned by a user, newest first
    History {
        #[arg(long)]
        user: String,
    },

    /// Resolve logo URLs for an interview's tech stack
    Logos {
        /// Interview id
        id: String,
    },

    /// Seed interview documents from a JSON array
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Use the requested level for this crate, keep HTTP and database crates quiet
    let filter = EnvFilter::new(format!(
        "interview_feedback={},hyper=warn,reqwest=warn,libsql=warn",
        level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("interview-feedback v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(cli.config.as_deref())?;
    let store = open_store(&config, cli.db_path.clone()).await?;

    match cli.command {
        Commands::Synthesize {
            interview,
            user,
            transcript,
            feedback,
        } => {
            let transcript = read_transcript(&transcript)?;
            let llm = Arc::new(LlmService::new(config.llm_config())?);
            let synthesizer = FeedbackSynthesizer::new(llm, store);

            let feedback_id = synthesizer
                .synthesize(SynthesisRequest {
                    interview_id: InterviewId::new(interview),
                    user_id: UserId::new(user),
                    transcript,
                    existing_feedback_id: feedback.map(FeedbackId::new),
                })
                .await?;

            print_json(&serde_json::json!({
                "success": true,
                "feedbackId": feedback_id,
            }))
        }
        Commands::Interview { id } => {
            let queries = InterviewQueries::new(store);
            print_json(&queries.get_interview(&InterviewId::new(id)).await?)
        }
        Commands::Feedback { interview, user } => {
            let queries = InterviewQueries::new(store);
            let feedback = queries
                .get_feedback(&InterviewId::new(interview), &UserId::new(user))
                .await?;
            print_json(&feedback)
        }
        Commands::Feed { user, limit } => {
            let queries = InterviewQueries::new(store);
            let interviews = queries
                .get_other_users_finalized_interviews(&UserId::new(user), Some(limit))
                .await?;
            print_json(&interviews)
        }
        Commands::History { user } => {
            let queries = InterviewQueries::new(store);
            print_json(&queries.get_user_interviews(&UserId::new(user)).await?)
        }
        Commands::Logos { id } => {
            let queries = InterviewQueries::new(store);
            let interview = queries
                .get_interview(&InterviewId::new(id.as_str()))
                .await?
                .ok_or_else(|| anyhow::anyhow!("Interview not found: {}", id))?;
            let logos = TechLogoResolver::new().resolve(&interview.tech_stack).await;
            print_json(&logos)
        }
        Commands::Import { file } => {
            let text = std::fs::read_to_string(&file)?;
            let records: Vec<Value> = serde_json::from_str(&text)?;
            let imported = import_interviews(store.as_ref(), records).await?;
            info!("Imported {} interviews from {}", imported.len(), file.display());
            print_json(&imported)
        }
    }
}

async fn open_store(
    config: &AppConfig,
    db_path: Option<PathBuf>,
) -> Result<Arc<dyn DocumentStore>> {
    match config.connection_mode(db_path) {
        Some(mode) => Ok(Arc::new(LibsqlStore::new(mode).await?)),
        None => {
            debug!("Using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

fn read_transcript(path: &Path) -> Result<Vec<TranscriptEntry>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
