//! Copy Confluence spaces from one instance to another.
//!
//! Connection settings come from the environment (see `Config::from_env`);
//! flags narrow or adjust the run. Logs go to stderr so `--json` output on
//! stdout stays machine-readable.

use anyhow::{Context, Result};
use clap::Parser;
use migrator_core::config::Config;
use migrator_core::kernel::{
    BaseDestinationPlatform, BaseSourcePlatform, ConfluenceDestination, ConfluenceSource,
    DryRunDestination,
};
use migrator_core::migration::{MigrationOrchestrator, MigrationReport, PageOrdering, SpaceOutcome};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "space-migrator")]
#[command(about = "Copy Confluence spaces, pages, attachments, comments and labels between instances")]
struct Cli {
    /// Read everything but write nothing to the destination
    #[arg(long)]
    dry_run: bool,

    /// Only migrate this space key; repeat for more (overrides MIGRATION_SPACES)
    #[arg(long = "space", value_name = "KEY")]
    spaces: Vec<String>,

    /// Page creation order: depth or listing
    #[arg(long, value_name = "ORDER")]
    ordering: Option<PageOrdering>,

    /// Also save every downloaded attachment here
    #[arg(long, value_name = "DIR")]
    dump_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Exit with failure unless every space and page migrated cleanly
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,migrator_core=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .init();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if !cli.spaces.is_empty() {
        config.space_keys = cli.spaces.clone();
    }
    if let Some(ordering) = cli.ordering {
        config.page_ordering = ordering;
    }
    if cli.dump_dir.is_some() {
        config.attachment_dump_dir = cli.dump_dir.clone();
    }

    info!(
        source = %config.source.base_url,
        destination = %config.destination.base_url,
        dry_run = cli.dry_run,
        "Configuration loaded"
    );

    let source: Arc<dyn BaseSourcePlatform> = Arc::new(ConfluenceSource::new(
        config.source.client(config.http_timeout)?,
        config.retry,
        config.list_limits(),
    ));
    let destination = ConfluenceDestination::new(
        config.destination.client(config.http_timeout)?,
        config.retry,
        config.list_limits(),
    );
    let destination: Arc<dyn BaseDestinationPlatform> = if cli.dry_run {
        Arc::new(DryRunDestination::new(destination))
    } else {
        Arc::new(destination)
    };

    let orchestrator =
        MigrationOrchestrator::new(config.migration_options(cli.dry_run), source, destination);
    let report = orchestrator.run().await?;

    if cli.json {
        let out = json!({
            "success": report.is_clean(),
            "summary": report.summary(),
            "report": report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_report(&report);
    }

    if cli.strict && !report.is_clean() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &MigrationReport) {
    let summary = report.summary();

    if report.dry_run {
        println!("DRY RUN - nothing was written to the destination\n");
    }

    for space in &report.spaces {
        let status = match &space.outcome {
            SpaceOutcome::Created => "created".to_string(),
            SpaceOutcome::AlreadyPresent => "already present".to_string(),
            SpaceOutcome::Failed { reason } => format!("creation failed: {}", reason),
            SpaceOutcome::DetailUnavailable { reason } => format!("skipped: {}", reason),
        };
        println!("{} ({}): {}", space.key, space.name, status);

        for page in space.pages.iter().filter(|p| !p.is_clean()) {
            let problem = page
                .error
                .as_deref()
                .or(page.labels.step_error.as_deref())
                .or(page.attachments.step_error.as_deref())
                .or(page.comments.step_error.as_deref())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if page.is_orphaned() {
                        "parent missing, created at root".to_string()
                    } else {
                        format!(
                            "{} attachment and {} comment failures",
                            page.attachments.failures.len(),
                            page.comments.failures.len()
                        )
                    }
                });
            println!("  - {} [{:?}]: {}", page.title, page.state, problem);
        }
        if let Some(e) = &space.page_listing_error {
            println!("  ! page listing incomplete: {}", e);
        }
    }

    for key in &report.missing_spaces {
        println!("{}: not found at source", key);
    }
    if let Some(e) = &report.source_listing_error {
        println!("! source space listing incomplete: {}", e);
    }
    if let Some(e) = &report.destination_listing_error {
        println!("! destination space listing incomplete: {}", e);
    }

    println!(
        "\nSpaces: {} created, {} already present, {} failed",
        summary.spaces_created, summary.spaces_already_present, summary.spaces_failed
    );
    println!(
        "Pages: {} created ({} orphaned, {} incomplete), {} skipped, {} failed",
        summary.pages_created,
        summary.pages_orphaned,
        summary.pages_truncated,
        summary.pages_skipped,
        summary.pages_failed
    );
    println!(
        "Attachments: {} copied, {} failed | Comments: {} copied, {} failed | Labels: {}",
        summary.attachments_migrated,
        summary.attachment_failures,
        summary.comments_migrated,
        summary.comment_failures,
        summary.labels_applied
    );
}
