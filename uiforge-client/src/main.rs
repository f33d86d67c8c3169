use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uiforge_client::{
    render_document, sample_document, Config, FileStore, History, HttpGenerationService, QaReport,
    Session, SourceTag,
};
use uiforge_dsl::{ingest, UiDocument};

#[derive(Parser, Debug)]
#[command(name = "uiforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate (or convert) a JSON file and print its HTML.
    Render(RenderArgs),
    /// Print a QA report for a JSON file as Markdown.
    Qa {
        /// Input JSON.
        file: PathBuf,
    },
    /// Make a JSON file the current document and record it in history.
    Load {
        /// Input JSON.
        file: PathBuf,
        /// Record as the built-in sample instead of an upload.
        #[arg(long, default_value_t = false)]
        sample: bool,
    },
    /// Ask the generation service to edit the current document.
    Chat {
        /// Instruction in natural language.
        instruction: String,
    },
    /// Hybrid generation from the current document.
    Generate,
    /// Inspect or restore history.
    #[command(subcommand)]
    History(HistoryCommand),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input JSON.
    file: PathBuf,

    /// Emit a standalone HTML page instead of a fragment.
    #[arg(long, default_value_t = false)]
    page: bool,
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List records, most recent first.
    List,
    /// Delete one record.
    Delete { id: String },
    /// Make a record current again and print its HTML.
    Restore { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(&config, args),
        Command::Qa { file } => cmd_qa(&config, &file),
        Command::Load { file, sample } => {
            let session = open_session(&config).await?;
            let text = read_file(&file)?;
            let tag = if sample { SourceTag::Sample } else { SourceTag::Upload };
            let outcome = session.load_str(&text, tag).await?;
            eprintln!("loaded {} as {} ({:?})", file.display(), outcome.record.id, outcome.origin);
            Ok(())
        }
        Command::Chat { instruction } => {
            let session = open_session(&config).await?;
            let outcome = session.chat(&instruction).await?;
            if let Some(summary) = &outcome.summary {
                eprintln!("{}", summary);
            }
            println!("{}", outcome.document.to_json_string_pretty());
            Ok(())
        }
        Command::Generate => {
            let session = open_session(&config).await?;
            let outcome = session.generate().await?;
            if let Some(code) = &outcome.generated_code {
                println!("{}", code);
            }
            if let Some(qa) = &outcome.qa_text {
                eprintln!("{}", qa);
            }
            Ok(())
        }
        Command::History(cmd) => cmd_history(&config, cmd).await,
    }
}

fn read_file(path: &PathBuf) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read '{}'", path.display()))
}

fn ingest_file(config: &Config, path: &PathBuf) -> anyhow::Result<UiDocument> {
    let raw: serde_json::Value =
        serde_json::from_str(&read_file(path)?).with_context(|| format!("parse '{}'", path.display()))?;
    let ingested = ingest(&raw, &config.ingest_policy())?;
    Ok(ingested.document)
}

fn cmd_render(config: &Config, args: RenderArgs) -> anyhow::Result<()> {
    let document = ingest_file(config, &args.file)?;
    let presentation = render_document(&document, None);
    if args.page {
        println!("{}", presentation.to_html_page("UIForge preview"));
    } else {
        println!("{}", presentation.to_html());
    }
    Ok(())
}

fn cmd_qa(config: &Config, path: &PathBuf) -> anyhow::Result<()> {
    let document = ingest_file(config, path)?;
    print!("{}", QaReport::analyze(&document).to_markdown(chrono::Utc::now()));
    Ok(())
}

fn history_for(config: &Config) -> History {
    let store = Arc::new(FileStore::new(config.history_dir.clone()));
    History::with_limit(store, config.history_limit)
}

/// Session whose current document is the most recent history record, or the sample.
async fn open_session(config: &Config) -> anyhow::Result<Session> {
    let service = HttpGenerationService::from_config(config)?;
    let history = history_for(config);
    let latest = history.list().await?.into_iter().next();

    let initial = latest
        .and_then(|r| uiforge_dsl::validate_with(&r.document, &config.validate_options()).ok())
        .unwrap_or_else(sample_document);
    Ok(Session::new(initial, Arc::new(service), history).with_policy(config.ingest_policy()))
}

async fn cmd_history(config: &Config, cmd: HistoryCommand) -> anyhow::Result<()> {
    match cmd {
        HistoryCommand::List => {
            for record in history_for(config).list().await? {
                println!(
                    "{}  {}  {:<9}  {}",
                    record.id,
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.source_tag.to_string(),
                    record.summary.as_deref().unwrap_or("")
                );
            }
        }
        HistoryCommand::Delete { id } => {
            if !history_for(config).delete(&id).await? {
                anyhow::bail!("no history record {}", id);
            }
        }
        HistoryCommand::Restore { id } => {
            let session = open_session(config).await?;
            session.restore(&id).await?;
            println!("{}", session.render().to_html());
        }
    }
    Ok(())
}
