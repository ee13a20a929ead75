// src/main.rs - Terminal front end for the printer dashboard
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use krusty_dash::config::{self, DashboardConfig};
use krusty_dash::format::{format_optional_duration, format_progress, format_timestamp};
use krusty_dash::{ControlCommand, Dashboard, JobId, Notice, RatingDraft};

const DEFAULT_CONFIG: &str = "dashboard.toml";

/// Printer dashboard CLI
#[derive(Parser, Debug)]
#[command(name = "krusty-dash", about = "Monitor and control a 3D printer through its dashboard backend.")]
struct Cli {
    /// Path to a TOML config file (defaults to ./dashboard.toml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Backend base URL, overrides the config file
    #[arg(long)]
    base_url: Option<String>,

    /// Poll interval in milliseconds, overrides the config file
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll continuously and redraw the dashboard
    Watch {
        /// Stop after this many redraws
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Poll once and print the dashboard
    Status,
    /// List known jobs, newest first
    Jobs,
    /// Pause the active print
    Pause,
    /// Resume a paused print
    Resume,
    /// Cancel the active print
    Cancel,
    /// Preheat nozzle and bed
    Preheat,
    /// Rate a finished job
    Rate {
        /// Job to rate; defaults to the most recent finished job
        #[arg(long)]
        job_id: Option<JobId>,
        /// Print quality, 1 to 5
        #[arg(long)]
        quality: f64,
        /// Print speed, 1 to 5
        #[arg(long)]
        speed: f64,
        #[arg(long, default_value = "")]
        feedback: String,
    },
    /// Show the last command the printer accepted as valid
    LastCommand,
    /// Submit the next valid command
    SendCommand { command: String },
    /// Download a job's timelapse video
    Timelapse { job_id: JobId },
    /// Download a job's photo archive
    Photos { job_id: JobId },
    /// Print the live camera stream URL
    Camera,
}

fn resolve_config(cli: &Cli) -> Result<DashboardConfig, config::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(DEFAULT_CONFIG)?,
        None => DashboardConfig::default(),
    };
    if let Some(base_url) = &cli.base_url {
        config.backend.base_url = base_url.clone();
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.polling.interval_ms = interval_ms;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(&cli).map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
    })?;
    tracing::debug!("Backend: {}", config.backend.base_url);

    let dashboard = Arc::new(Dashboard::connect(config)?);

    let notice = match cli.command {
        Commands::Watch { ticks } => {
            watch(&dashboard, ticks).await;
            return Ok(());
        }
        Commands::Status => {
            dashboard.poll_once().await;
            println!("{}", dashboard.snapshot().await.render());
            return Ok(());
        }
        Commands::Jobs => {
            dashboard.refresh_jobs().await?;
            print_jobs(&dashboard).await;
            return Ok(());
        }
        Commands::LastCommand => {
            dashboard.refresh_last_valid().await?;
            let state = dashboard.state().await;
            println!("{}", state.last_valid_command.unwrap_or_default());
            return Ok(());
        }
        Commands::Camera => {
            println!("{}", dashboard.config().camera_url());
            return Ok(());
        }
        Commands::Pause => control(&dashboard, ControlCommand::Pause).await,
        Commands::Resume => control(&dashboard, ControlCommand::Resume).await,
        Commands::Cancel => control(&dashboard, ControlCommand::Cancel).await,
        Commands::Preheat => control(&dashboard, ControlCommand::Preheat).await,
        Commands::Rate { job_id, quality, speed, feedback } => {
            let draft = RatingDraft {
                quality: Some(quality),
                speed: Some(speed),
                feedback,
                job_id,
            };
            dashboard.rate_latest(draft).await
        }
        Commands::SendCommand { command } => dashboard.submit_next_valid(&command).await,
        Commands::Timelapse { job_id } => dashboard.download_timelapse(job_id).await,
        Commands::Photos { job_id } => dashboard.download_photos(job_id).await,
    };

    println!("{}", notice);
    if !notice.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn control(dashboard: &Dashboard, command: ControlCommand) -> Notice {
    if dashboard.refresh_printer_status().await.is_ok() && !dashboard.controls().await.allows(command) {
        tracing::warn!("{} is not available in the current printer state", command);
    }
    dashboard.dispatch(command).await
}

async fn watch(dashboard: &Arc<Dashboard>, ticks: Option<u64>) {
    let poller = dashboard.start();
    let mut redraw = tokio::time::interval(Duration::from_millis(dashboard.config().polling.interval_ms));
    let mut drawn = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping poller");
                break;
            }
            _ = redraw.tick() => {
                println!("{}\n", dashboard.snapshot().await.render());
                drawn += 1;
                if ticks.is_some_and(|limit| drawn >= limit) {
                    break;
                }
            }
        }
    }
    poller.shutdown().await;
}

async fn print_jobs(dashboard: &Dashboard) {
    let state = dashboard.state().await;
    let active = state.tracker.current().map(|job| job.id);
    for job in &state.jobs {
        let marker = if Some(job.id) == active { "*" } else { " " };
        println!(
            "{} #{:<5} {:<9} {:<30} started {}  progress {}  est {}",
            marker,
            job.id,
            job.status.as_str(),
            job.file_name,
            format_timestamp(&job.start_time.with_timezone(&chrono::Local)),
            format_progress(job.progress),
            format_optional_duration(job.estimated_completion_time),
        );
    }
}
