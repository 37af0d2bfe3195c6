//! Annotate CLI - add an uploaded file's metadata to Wikidata.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use annotate::{
    foreground, AnnotationReport, Config, EditGuardPolicy, EntityAnnotationOrchestrator,
    JsonKvStore, LocationGuard, PreferenceRead, StepOutcome,
};
use notify::{EditOutcomeNotifier, Notifier};
use wikibase::{Label, LabelSet};

/// Annotate CLI - propagate upload metadata to a Wikibase knowledge base.
#[derive(Parser)]
#[command(name = "annotate")]
#[command(about = "Add an uploaded file's image claim, depicts relation and labels to Wikidata")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Preference file (title, location check)
    #[arg(long, global = true, env = "ANNOTATE_PREFERENCES")]
    preferences: Option<PathBuf>,

    /// Send every edit to the sandbox item
    #[arg(long, global = true)]
    sandbox: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Link a file to an item and set its labels
    Run {
        /// Item the file was uploaded for (e.g. Q146)
        #[arg(long)]
        entity: String,

        /// File reference (e.g. File:Cat.jpg)
        #[arg(long)]
        file: String,

        /// Label as language=text (repeatable)
        #[arg(long = "label")]
        labels: Vec<Label>,
    },

    /// Only set labels on a file's entity
    Labels {
        /// File reference (e.g. File:Cat.jpg)
        #[arg(long)]
        file: String,

        /// Label as language=text (repeatable)
        #[arg(long = "label", required = true)]
        labels: Vec<Label>,
    },

    /// Print whether the stored location check allows edits
    Guard,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("annotate=debug,wikibase=debug,notify=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("annotate=info,warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(path) = cli.preferences {
        config.preferences_path = path;
    }
    config.sandbox |= cli.sandbox;

    let preferences: Arc<dyn PreferenceRead> = Arc::new(
        JsonKvStore::load(&config.preferences_path).context("failed to load preferences")?,
    );

    let report = match cli.command {
        Commands::Guard => {
            let allowed = LocationGuard::new(preferences).allow();
            tracing::info!(allowed, "Guard evaluated");
            println!("{}", if allowed { "allowed" } else { "denied" });
            return Ok(());
        }
        Commands::Run {
            entity,
            file,
            labels,
        } => {
            tracing::info!(entity, file, labels = labels.len(), "Starting annotation");
            run(&config, preferences, |orchestrator| async move {
                orchestrator
                    .annotate_and_wait(&entity, &file, labels.into_iter().collect())
                    .await
            })
            .await?
        }
        Commands::Labels { file, labels } => {
            tracing::info!(file, labels = labels.len(), "Attaching labels");
            run(&config, preferences, |orchestrator| async move {
                orchestrator
                    .attach_labels_and_wait(&file, labels.into_iter().collect::<LabelSet>())
                    .await
            })
            .await?
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

/// Wire the orchestrator, run `command`, then drain the foreground context
/// and pending user messages.
async fn run<F, Fut>(
    config: &Config,
    preferences: Arc<dyn PreferenceRead>,
    command: F,
) -> Result<AnnotationReport>
where
    F: FnOnce(EntityAnnotationOrchestrator) -> Fut,
    Fut: std::future::Future<Output = AnnotationReport>,
{
    config.validate().context("invalid configuration")?;

    let notifier = Arc::new(Notifier::from_env());
    let outcome: Arc<dyn EditOutcomeNotifier> = notifier.clone();

    let (fg, ui) = foreground();
    let ui = ui.spawn();

    let orchestrator = config.orchestrator(preferences, outcome, fg)?;

    let report = command(orchestrator).await;

    // The orchestrator held the last foreground handle.
    ui.await.context("foreground context failed")?;
    notifier.flush().await;

    Ok(report)
}

fn print_summary(report: &AnnotationReport) {
    if let Some(reason) = report.skipped {
        println!("skipped: {reason}");
        return;
    }

    if let Some(claim) = &report.claim {
        println!("image claim: {}", describe(claim));
    }
    if let Some(relation) = &report.relation {
        println!("depicts:     {}", describe(relation));
    }
    for label in &report.labels {
        println!("label [{}]: {}", label.language, describe(&label.outcome));
    }
}

fn describe(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Done { revision } => format!("revision {revision}"),
        StepOutcome::Failed { error, .. } => format!("failed ({error})"),
    }
}
