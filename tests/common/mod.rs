use krusty_dash::DashboardConfig;
use krusty_dash::config::EndpointMap;
use krusty_dash::sim::{self, SimPrinter, SimState};
use tokio::net::TcpListener;

/// Serve a simulated backend on an ephemeral port and return a config pointing at it.
pub async fn spawn_backend(printer: SimPrinter) -> (DashboardConfig, SimState) {
    let state = sim::new_state(printer);
    let app = sim::router(state.clone(), &EndpointMap::default());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (DashboardConfig::with_base_url(format!("http://{}", addr)), state)
}

pub fn quiet_printer() -> SimPrinter {
    let mut printer = SimPrinter::new();
    printer.jitter = false;
    printer
}
