// krusty_dash: printer dashboard client, poll loop, and simulated backend

pub mod api;
pub mod config;
pub mod controls;
pub mod dashboard;
pub mod error;
pub mod format;
pub mod models;
pub mod notice;
pub mod periodic;
pub mod reconciler;
pub mod sim;
pub mod telemetry;
pub mod view;

pub use api::{DashboardApi, HttpBackend};
pub use config::{DashboardConfig, load_config};
pub use controls::{ControlAvailability, ControlCommand};
pub use dashboard::{Dashboard, DashboardState, PollReport};
pub use error::ApiError;
pub use models::{Job, JobId, JobStatus, PrinterState, PrinterStatus, RatingDraft};
pub use notice::{Notice, NoticeKind};
