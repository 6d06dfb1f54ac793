//! clickguard entrypoint: scores sessions against the configured classifier
//! and runs the offline corpus tasks. Result lines go to stdout, logs to
//! stderr.

use clap::{Parser, Subcommand};
use clickguard::{
    config::{AppConfig, CONFIG_PATH_ENV},
    corpus::{self, CorpusBuilder, ExportOptions},
    features::extract,
    gate::ClassificationGate,
    logging::{ResultLine, StructuredLogger},
    model::load_predictor,
    service::ScoringService,
    storage::SessionLog,
    telemetry::parse_document,
};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "clickguard", version, about = "Human-vs-bot session classifier")]
struct Cli {
    /// Config file (JSON); falls back to $CLICKGUARD_CONFIG_PATH, then config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one session payload and append it to the session log
    Score {
        /// Payload file; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Print the feature vector and parse report for one payload
    Features { file: Option<PathBuf> },
    /// List logged classifications, newest first
    Sessions,
    /// Build the labeled feature table from the configured corpus files
    BuildCorpus {
        #[arg(long)]
        out: Option<PathBuf>,
        /// Append per-step velocity/acceleration columns
        #[arg(long)]
        kinematics: bool,
    },
    /// Rewrite legacy line-per-object corpus files as JSON arrays
    Repair { path: PathBuf },
}

fn read_input(file: Option<&Path>) -> Result<String, BoxError> {
    match file {
        Some(p) => Ok(std::fs::read_to_string(p)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), BoxError> {
    StructuredLogger::emit_json(value, &mut std::io::stdout().lock())?;
    Ok(())
}

fn score(config: &AppConfig, file: Option<&Path>) -> Result<(), BoxError> {
    let predictor = load_predictor(&config.model)?;
    let log = Arc::new(SessionLog::new(config.session_log_path()));
    let service = ScoringService::new(
        ClassificationGate::new(config.model.label_mapping),
        predictor,
        log,
    );
    let body = read_input(file)?;
    let outcome = service.score_text(&body)?;
    print_json(&ResultLine::from_outcome(&outcome))
}

fn features(file: Option<&Path>) -> Result<(), BoxError> {
    let body = read_input(file)?;
    let (session, report) = parse_document(&body);
    let features = extract(&session);
    print_json(&json!({ "features": features, "report": report }))
}

fn sessions(config: &AppConfig) -> Result<(), BoxError> {
    let log = SessionLog::new(config.session_log_path());
    for row in log.list()? {
        print_json(&row)?;
    }
    Ok(())
}

fn build_corpus(config: &AppConfig, out: Option<PathBuf>, kinematics: bool) -> Result<(), BoxError> {
    let (entries, loaded) = corpus::load_labeled_files(&config.corpus.files);
    info!(
        files_read = loaded.files_read,
        files_skipped = loaded.files_skipped,
        sessions = loaded.sessions,
        "corpus loaded"
    );
    let table = CorpusBuilder::new(config.features.clone(), config.corpus.worker_count()).build(&entries);

    let out = out.unwrap_or_else(|| config.corpus.output.clone());
    let opts = ExportOptions {
        mapping: config.model.label_mapping,
        include_kinematics: kinematics || config.corpus.include_kinematics,
    };
    corpus::write_csv_file(&table, &out, &opts)?;
    info!(path = %out.display(), rows = table.rows.len(), "feature table written");
    print_json(&json!({
        "output": out,
        "files_read": loaded.files_read,
        "files_skipped": loaded.files_skipped,
        "processed": table.summary.processed,
        "kept": table.summary.kept,
        "dropped": table.summary.dropped,
        "malformed_subfields": table.summary.malformed_subfields,
    }))
}

fn repair(path: &Path) -> Result<(), BoxError> {
    for (file, report) in corpus::repair_path(path)? {
        print_json(&json!({
            "path": file,
            "already_array": report.already_array,
            "kept": report.kept,
            "discarded": report.discarded,
        }))?;
    }
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.json"));
    let config = AppConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(config = %config_path.display(), data_dir = ?config.data_dir, "clickguard starting");

    match cli.command {
        Command::Score { file } => score(&config, file.as_deref()),
        Command::Features { file } => features(file.as_deref()),
        Command::Sessions => sessions(&config),
        Command::BuildCorpus { out, kinematics } => build_corpus(&config, out, kinematics),
        Command::Repair { path } => repair(&path),
    }
}
