//! studyforge CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "studyforge",
    version,
    about = "LLM-generated exams with a personal mistake book"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an exam from a study document and make it current
    Generate {
        /// Path to a PDF or plain-text document
        #[arg(long)]
        document: PathBuf,

        /// Session whose current exam is replaced
        #[arg(long, default_value = "default")]
        session: String,

        /// Print the exam as JSON
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Submit an answer to one question of the current exam
    Submit {
        /// Question number (1-based)
        #[arg(long)]
        index: u32,

        /// Your answer
        #[arg(long)]
        answer: String,

        /// Session holding the current exam
        #[arg(long, default_value = "default")]
        session: String,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the mistake book
    Mistakes {
        /// Output format: text, json, table
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate an exam and answer it interactively
    Quiz {
        /// Path to a PDF or plain-text document
        #[arg(long)]
        document: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("studyforge=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            document,
            session,
            json,
            config,
        } => commands::generate::execute(document, session, json, config).await,
        Commands::Submit {
            index,
            answer,
            session,
            json,
            config,
        } => commands::submit::execute(index, answer, session, json, config).await,
        Commands::Mistakes { format, config } => commands::mistakes::execute(format, config).await,
        Commands::Quiz { document, config } => commands::quiz::execute(document, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
