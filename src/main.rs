//! Qbank CLI - manage a question bank of SQLite metadata and markdown content files

mod commands;

use clap::{Args, Parser, Subcommand};
use commands::OutputMode;
use qbank::config::{self, QbankConfig};
use qbank::question::QuestionFilter;
use qbank::ui::Icons;
use qbank::{Envelope, QuestionInput, QuestionRepository, Status};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "qbank")]
#[command(version)]
#[command(about = "Question bank - SQLite metadata paired with markdown content files")]
#[command(long_about = r#"
Qbank stores each question twice: metadata as a row in SQLite, and the full
question text as <root>/<subject>/<topic>/[<subtopic>/]<id>.md.

Example usage:
  qbank init
  qbank add --title "Q1" --subject Math --topic Algebra --question-type MCQ \
            --difficulty Easy --time 5 --bloom Apply --content "2+2=?"
  qbank list --subject Math --difficulty Easy
  qbank update 1 --subject Science
  qbank serve --listen 127.0.0.1:5000
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the JSON result envelope instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Content root directory (overrides config)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a qbank.toml with the current database and root
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Add a question
    Add(QuestionArgs),

    /// Show a question and its content
    Get {
        id: i64,
    },

    /// Change some fields of a question
    Update {
        id: i64,

        #[command(flatten)]
        fields: QuestionArgs,
    },

    /// Delete a question and its content file
    Delete {
        id: i64,
    },

    /// List questions, newest first
    List {
        #[arg(long)]
        subject: Option<String>,

        #[arg(long)]
        topic: Option<String>,

        #[arg(long)]
        difficulty: Option<String>,

        #[arg(long = "question-type")]
        question_type: Option<String>,
    },

    /// Show question bank statistics
    Stats,

    /// List subjects and topics with question counts
    Topics,

    /// Show a random question
    Random {
        /// Restrict to these topics (Subject:Topic), repeatable
        #[arg(short, long)]
        topic: Vec<String>,
    },

    /// Serve the JSON API
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        listen: Option<String>,
    },
}

#[derive(Args)]
struct QuestionArgs {
    #[arg(long)]
    title: Option<String>,

    /// Question content (markdown)
    #[arg(long, conflicts_with = "file")]
    content: Option<String>,

    /// Read question content from a file
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long = "question-type")]
    question_type: Option<String>,

    #[arg(long)]
    subject: Option<String>,

    #[arg(long)]
    topic: Option<String>,

    /// Pass an empty string to clear it on update
    #[arg(long)]
    subtopic: Option<String>,

    #[arg(long)]
    difficulty: Option<String>,

    /// Estimated time in minutes
    #[arg(long)]
    time: Option<String>,

    #[arg(long)]
    bloom: Option<String>,

    /// Mark the question as AI generated
    #[arg(long)]
    ai_generated: bool,

    #[arg(long)]
    ai_notes: Option<String>,
}

impl QuestionArgs {
    fn into_input(self) -> anyhow::Result<QuestionInput> {
        let content = match (self.content, self.file) {
            (Some(content), _) => Some(content),
            (None, Some(path)) => Some(std::fs::read_to_string(&path)?),
            (None, None) => None,
        };

        Ok(QuestionInput {
            title: self.title,
            content,
            question_type: self.question_type,
            subject: self.subject,
            topic: self.topic,
            subtopic: self.subtopic,
            difficulty_level: self.difficulty,
            estimated_time: self.time.map(serde_json::Value::String),
            bloom_level: self.bloom,
            is_ai_generated: self.ai_generated.then_some(true),
            ai_generation_notes: self.ai_notes,
        })
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    if let Err(e) = run(cli, output_mode) {
        if output_mode.is_human() {
            qbank::ui::error(&e.to_string());
        } else {
            let envelope: Envelope = match e.downcast_ref::<qbank::Error>() {
                Some(err) => Envelope::failure(err),
                None => Envelope {
                    status: Status::Error,
                    message: e.to_string(),
                    error_kind: None,
                    data: None,
                },
            };
            match serde_json::to_string_pretty(&envelope) {
                Ok(json) => println!("{}", json),
                Err(_) => eprintln!("{}", e),
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, output_mode: OutputMode) -> anyhow::Result<()> {
    let file_config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let paths = file_config.resolve(cli.database, cli.root);

    let open = || -> anyhow::Result<QuestionRepository> {
        config::ensure_db_dir(&paths.database)?;
        tracing::debug!("Opening {:?} with content root {:?}", paths.database, paths.root);
        Ok(QuestionRepository::open(&paths.database, &paths.root)?)
    };

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            let written = QbankConfig {
                database: Some(paths.database.display().to_string()),
                root: Some(paths.root.display().to_string()),
                listen: file_config.listen.clone(),
            };
            config::write_config(&path, &written, force)?;
            if output_mode.is_human() {
                qbank::ui::success(&format!("Wrote {}", path.display()));
                qbank::ui::field(&format!("{} Database", Icons::DATABASE), &paths.database.display().to_string());
                qbank::ui::field(&format!("{} Content root", Icons::FOLDER), &paths.root.display().to_string());
            } else {
                let envelope = Envelope::success(format!("Wrote {}", path.display()), &written);
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            }
            Ok(())
        }

        Commands::Add(args) => commands::run_add(&open()?, output_mode, args.into_input()?),

        Commands::Get { id } => commands::run_get(&open()?, output_mode, id),

        Commands::Update { id, fields } => {
            commands::run_update(&open()?, output_mode, id, fields.into_input()?)
        }

        Commands::Delete { id } => commands::run_delete(&open()?, output_mode, id),

        Commands::List { subject, topic, difficulty, question_type } => {
            let filter = QuestionFilter {
                subject,
                topic,
                difficulty_level: difficulty,
                question_type,
            };
            commands::run_list(&open()?, output_mode, filter)
        }

        Commands::Stats => commands::run_stats(&open()?, output_mode),

        Commands::Topics => commands::run_topics(&open()?, output_mode),

        Commands::Random { topic } => commands::run_random(&open()?, output_mode, &topic),

        Commands::Serve { listen } => {
            let repo = open()?;
            let addr = file_config.listen_addr(listen);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(qbank::server::start_server(&addr, repo))
        }
    }
}
