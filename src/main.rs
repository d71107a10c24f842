use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use publishing_pipeline::Publisher;
use publishing_pipeline::config::Config;
use publishing_pipeline::publishing::PublishRequest;
use publishing_pipeline::status::PublishingRecordId;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing_subscriber::EnvFilter;

/// Publishes documents from newline-delimited JSON requests and prints each
/// request's status history once it has finished.
#[derive(Parser, Debug)]
#[command(name = "publishing-pipeline", version)]
struct Args {
    /// Configuration file (falls back to $PUBLISHER_CONFIG, then ./publisher.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `scheduler.tick_interval_ms`.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// File of publish requests, one JSON object per line. Reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(tick_ms) = args.tick_ms {
        config.scheduler.tick_interval_ms = tick_ms;
        config.validate()?;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let publisher = Publisher::new(&config);
    publisher.scheduler.start().await;

    let submitted = submit_all(&publisher, args.input.as_deref()).await?;
    tracing::info!("Submitted {} publish requests", submitted.len());

    tokio::select! {
        _ = wait_until_finished(&publisher, &submitted) => {
            tracing::info!("All publish requests finished");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, {} jobs still queued", publisher.queue.len());
        }
    }

    publisher.scheduler.stop().await;

    let mut stdout = std::io::stdout().lock();
    for id in &submitted {
        let history = publisher.status.history(id)?;
        writeln!(stdout, "{}", serde_json::to_string(&history)?)?;
    }

    Ok(())
}

async fn submit_all(
    publisher: &Publisher,
    input: Option<&Path>,
) -> anyhow::Result<Vec<PublishingRecordId>> {
    let reader: Box<dyn AsyncRead + Unpin + Send> = match input {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };

    let mut lines = BufReader::new(reader).lines();
    let mut submitted = Vec::new();
    let mut line_number = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let request: PublishRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Skipping line {}: invalid publish request: {}", line_number, e);
                continue;
            }
        };

        match publisher.intake.submit(request).await {
            Ok(id) => submitted.push(id),
            Err(e) => tracing::warn!("Rejected request on line {}: {}", line_number, e),
        }
    }

    Ok(submitted)
}

async fn wait_until_finished(publisher: &Publisher, submitted: &[PublishingRecordId]) {
    let mut interval = tokio::time::interval(Duration::from_millis(100));

    loop {
        interval.tick().await;

        let pending = submitted
            .iter()
            .filter(|id| {
                !publisher
                    .status
                    .latest(id)
                    .is_some_and(|entry| entry.status.is_terminal())
            })
            .count();

        if pending == 0 {
            return;
        }
        tracing::debug!("{} publish requests still pending", pending);
    }
}
