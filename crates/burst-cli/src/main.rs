//! `burstcloud` – synthesise and merge range-sensor point clouds.
//!
//! This binary is the composition root for the workspace.  It:
//!
//! 1. Loads `burstcloud.toml` (or `--config`, or `$BURSTCLOUD_CONFIG`).
//! 2. Builds the frame system and one camera per configured source through
//!    the static factory, then wraps them in a merged camera.
//! 3. Captures merged clouds on a fixed interval (or once with `--once`) and
//!    prints a summary per capture.
//! 4. Intercepts **Ctrl-C** to cancel any in-flight read, then closes every
//!    source before exiting.
//!
//! Stdout carries only capture summaries; notices and logs go to stderr.

mod config;
mod report;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use burst_hal::camera::PointCloudCamera;
use burst_hal::context::ReadContext;
use burst_hal::factory;
use burst_hal::merged::MergedCamera;
use burst_perception::transform::FrameSystem;
use burst_types::CloudError;
use clap::Parser;
use colored::Colorize;
use tracing::{error, info, warn};

use report::CloudSummary;

#[derive(Debug, Parser)]
#[command(name = "burstcloud", about = "Synthesise and merge range-sensor point clouds", version)]
struct Cli {
    /// Path to the TOML capture config.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Capture a single merged cloud and exit.
    #[arg(long)]
    once: bool,

    /// Milliseconds between captures.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Override the target frame from the config.
    #[arg(long)]
    target: Option<String>,

    /// Print one JSON record per capture instead of a text line.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "burstcloud failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Structured logging
// ─────────────────────────────────────────────────────────────────────────────

/// `RUST_LOG` selects the filter (default `"info"`); set
/// `BURSTCLOUD_LOG_FORMAT=json` for newline-delimited JSON logs.  Logs go to
/// stderr so stdout carries only capture summaries.
fn init_logging() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("BURSTCLOUD_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Composition root
// ─────────────────────────────────────────────────────────────────────────────

async fn run(cli: Cli) -> Result<(), CloudError> {
    let path = cli.config.clone().unwrap_or_else(config::config_path);
    let mut cfg = config::load_from(&path)?
        .ok_or_else(|| CloudError::Config(format!("no config found at {}", path.display())))?;
    if let Some(target) = &cli.target {
        cfg.target_frame = target.clone();
    }
    info!(
        path = %path.display(),
        frames = cfg.frames.len(),
        sources = cfg.sources.len(),
        "config loaded"
    );

    let frames = Arc::new(FrameSystem::from_configs(&cfg.frames)?);
    let camera = factory::build_merged("merged", &cfg.sources, frames, &cfg.target_frame)?;

    let (ctx, cancel) = ReadContext::with_cancel();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            if let Err(e) = write_cancel_notice(std::io::stderr()) {
                warn!(error = %e, "failed to print cancel notice");
            }
            cancel.cancel();
        }
    });

    let result = capture_loop(&camera, &ctx, &cli).await;
    ctrl_c.abort();

    if let Err(e) = camera.close().await {
        warn!(error = %e, "failed to close sources");
    }

    match result {
        Err(CloudError::Cancelled) => {
            info!("capture cancelled");
            Ok(())
        }
        other => other,
    }
}

/// Notice printed on Ctrl-C.  Written to stderr by the caller so `--json`
/// output on stdout stays one record per line.
fn write_cancel_notice(mut out: impl Write) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "⚠  Ctrl-C received – cancelling capture …".yellow().bold())
}

async fn capture_loop(camera: &MergedCamera, ctx: &ReadContext, cli: &Cli) -> Result<(), CloudError> {
    let mut ticker = tokio::time::interval(Duration::from_millis(cli.interval_ms.max(1)));
    let mut capture = 0u64;

    loop {
        tokio::select! {
            biased;
            () = ctx.cancelled() => return Err(CloudError::Cancelled),
            _ = ticker.tick() => {}
        }

        let cloud = camera.next_point_cloud(ctx).await?;
        capture += 1;

        let summary = CloudSummary::of(capture, camera.target(), &cloud);
        if cli.json {
            println!("{}", summary.to_json());
        } else {
            println!("{}", summary.render());
        }

        if cli.once {
            return Ok(());
        }
    }
}
