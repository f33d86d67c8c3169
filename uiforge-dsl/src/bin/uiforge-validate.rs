use serde_json::Value;
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;
use uiforge_dsl::{ingest, IngestError, IngestPolicy, Ingested, Origin};

enum FileError {
    Read(String),
    Json(String),
    Ingest(IngestError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let fallback = args.iter().any(|a| a == "--fallback");
    let any_version = args.iter().any(|a| a == "--any-version");
    let files: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    if files.is_empty() {
        eprintln!("Usage: uiforge-validate [--fallback] [--any-version] <file.json>...");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  --fallback      try heuristic conversion when validation fails");
        eprintln!("  --any-version   with --fallback, also convert on version mismatch");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  uiforge-validate ui.json");
        eprintln!("  uiforge-validate --fallback *.json");
        process::exit(1);
    }

    let policy = IngestPolicy {
        heuristics_enabled: fallback,
        fallback_on_version_mismatch: any_version,
        ..IngestPolicy::default()
    };

    let mut exit_code = 0;
    for file_path in files {
        match validate_file(file_path, &policy) {
            Ok(ingested) => match ingested.origin {
                Origin::Validated => println!("✓ {} is valid", file_path),
                Origin::Converted { strategy } => {
                    println!("✓ {} converted ({})", file_path, strategy)
                }
            },
            Err(e) => {
                eprintln!("✗ {} has errors:", file_path);
                print_error(&e);
                exit_code = 1;
            }
        }
    }

    process::exit(exit_code);
}

fn validate_file(path: &str, policy: &IngestPolicy) -> Result<Ingested, FileError> {
    let content =
        fs::read_to_string(path).map_err(|e| FileError::Read(format!("Failed to read file: {}", e)))?;
    let raw: Value = serde_json::from_str(&content).map_err(|e| FileError::Json(e.to_string()))?;
    ingest(&raw, policy).map_err(FileError::Ingest)
}

fn print_error(error: &FileError) {
    match error {
        FileError::Read(msg) => eprintln!("  {}", msg),
        FileError::Json(msg) => {
            eprintln!("  JSON error:");
            eprintln!("    {}", msg);
        }
        FileError::Ingest(e) => {
            if let IngestError::ConversionMiss { .. } = e {
                eprintln!("  No heuristic matched");
            }
            for issue in e.schema_errors().issues() {
                eprintln!("    {}", issue);
            }
        }
    }
}
