//! Development backend: serves the dashboard REST API from a simulated printer.

use clap::Parser;
use krusty_dash::config::EndpointMap;
use krusty_dash::sim::{self, SimPrinter};

#[derive(Parser, Debug)]
#[command(name = "dash-sim", about = "Simulated printer backend for the dashboard.")]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    bind: String,

    /// Start a simulated print with this file name
    #[arg(long)]
    start_job: Option<String>,

    /// Progress added per status poll, in percent
    #[arg(long, default_value_t = 1.0)]
    progress_step: f64,

    /// Make every control endpoint fail with 500
    #[arg(long)]
    fail_commands: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let mut printer = SimPrinter::new();
    printer.progress_step = cli.progress_step;
    printer.fail_commands = cli.fail_commands;
    if let Some(file_name) = &cli.start_job {
        printer.start_job(file_name);
    }

    let app = sim::router(sim::new_state(printer), &EndpointMap::default());
    let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
    tracing::info!("Simulated backend listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
