//! mathtextd - evaluates student replies from the command line.
//!
//! Verdicts go to stdout as JSON, one per line. Diagnostics go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use mathtext_shared::{EvaluationRequest, Verdict};
use mathtextd::classifier::{HttpIntentClassifier, IntentClassifier, UnavailableClassifier};
use mathtextd::cli::{Cli, Commands};
use mathtextd::config::Config;
use mathtextd::evaluator::AnswerEvaluator;
use mathtextd::verdict_log::start_sqlite_logger;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mathtextd=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };

    if let Commands::CheckConfig = cli.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    info!("mathtextd v{} starting", env!("CARGO_PKG_VERSION"));

    let classifier = build_classifier(&config, cli.offline)?;
    let mut evaluator = AnswerEvaluator::from_config(&config, classifier);

    let mut flusher = None;
    if config.logging.enabled && !cli.no_log {
        match start_sqlite_logger(&config.logging) {
            Ok((logger, handle)) => {
                evaluator = evaluator.with_logger(logger);
                flusher = Some(handle);
            }
            Err(e) => warn!("Verdict log unavailable, continuing without it: {}", e),
        }
    }

    match cli.command {
        Commands::Eval { message, expected } => {
            let verdict = evaluate(&evaluator, EvaluationRequest::new(message, expected), cli.offline).await;
            println!("{}", verdict.to_json()?);
        }
        Commands::Batch { input } => {
            let text = read_input(input.as_deref())?;
            let mut count = 0usize;
            for (line_no, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let verdict = match serde_json::from_str::<EvaluationRequest>(line) {
                    Ok(request) => evaluate(&evaluator, request, cli.offline).await,
                    Err(e) => {
                        warn!(line = line_no + 1, "Malformed request: {}", e);
                        Verdict::error()
                    }
                };
                println!("{}", verdict.to_json()?);
                count += 1;
            }
            info!(count, "Batch finished");
        }
        Commands::CheckConfig => {}
    }

    // Last logger handle goes with the evaluator; the flusher then drains
    drop(evaluator);
    if let Some(handle) = flusher {
        if let Err(e) = handle.await {
            warn!("Verdict log flusher ended abnormally: {}", e);
        }
    }
    Ok(())
}

fn build_classifier(config: &Config, offline: bool) -> Result<Arc<dyn IntentClassifier>> {
    match (&config.classifier.endpoint, offline) {
        (Some(endpoint), false) => {
            let timeout = Duration::from_millis(config.classifier.request_timeout_ms);
            let http = HttpIntentClassifier::new(endpoint.clone(), timeout)
                .context("building classifier client")?;
            info!(endpoint = %endpoint, "Using HTTP intent classifier");
            Ok(Arc::new(http))
        }
        _ => Ok(Arc::new(UnavailableClassifier)),
    }
}

async fn evaluate(evaluator: &AnswerEvaluator, request: EvaluationRequest, offline: bool) -> Verdict {
    if offline {
        evaluator.evaluate_offline(request)
    } else {
        evaluator.evaluate(request).await
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}
