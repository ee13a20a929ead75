//! The printer dashboard: owns the polled state, runs the poll loop and
//! dispatches user actions to the backend.

use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::{DashboardApi, HttpBackend};
use crate::config::DashboardConfig;
use crate::controls::{ControlAvailability, ControlCommand};
use crate::error::ApiError;
use crate::models::{
    Job, JobId, JobStatus, NextValidCommandRequest, PrinterStatus, RatingDraft, RatingRequest,
};
use crate::notice::Notice;
use crate::periodic::{PeriodicHandle, spawn_periodic};
use crate::reconciler::JobTracker;
use crate::telemetry::{TelemetryBuffer, TemperatureSample};
use crate::view::DashboardView;

const RATING_RANGE: std::ops::RangeInclusive<f64> = 1.0..=5.0;

/// Local state slices. Each poll replaces its slice wholesale.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub printer: Option<PrinterStatus>,
    pub jobs: Vec<Job>,
    pub tracker: JobTracker,
    pub last_valid_command: Option<String>,
    pub telemetry: TelemetryBuffer,
    pub rating: RatingDraft,
    pub last_notice: Option<Notice>,
}

impl DashboardState {
    pub fn new(telemetry_capacity: usize) -> Self {
        Self {
            printer: None,
            jobs: Vec::new(),
            tracker: JobTracker::new(),
            last_valid_command: None,
            telemetry: TelemetryBuffer::new(telemetry_capacity),
            rating: RatingDraft::default(),
            last_notice: None,
        }
    }
}

/// Which slices the last poll tick managed to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub printer_status: bool,
    pub jobs: bool,
    pub last_valid: bool,
}

impl PollReport {
    pub fn all_ok(&self) -> bool {
        self.printer_status && self.jobs && self.last_valid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    Timelapse,
    Photos,
}

impl DownloadKind {
    pub fn file_name(&self, job_id: JobId) -> String {
        match self {
            DownloadKind::Timelapse => format!("timelapse_{}.mp4", job_id),
            DownloadKind::Photos => format!("photos_{}.zip", job_id),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DownloadKind::Timelapse => "timelapse",
            DownloadKind::Photos => "photos",
        }
    }
}

pub struct Dashboard {
    api: Arc<dyn DashboardApi>,
    config: DashboardConfig,
    state: Arc<RwLock<DashboardState>>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn DashboardApi>, config: DashboardConfig) -> Self {
        let state = DashboardState::new(config.polling.telemetry_capacity);
        Self {
            api,
            config,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Dashboard backed by the HTTP client described in `config`.
    pub fn connect(config: DashboardConfig) -> Result<Self, ApiError> {
        let backend = HttpBackend::new(config.backend.clone())?;
        Ok(Self::new(Arc::new(backend), config))
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub async fn state(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Start polling on the configured cadence. Dropping or shutting down the handle stops it.
    pub fn start(self: &Arc<Self>) -> PeriodicHandle {
        let dashboard = Arc::clone(self);
        tracing::info!(
            "Polling {} every {} ms",
            self.config.backend.base_url,
            self.config.polling.interval_ms
        );
        spawn_periodic("dashboard poll", self.config.polling.interval(), move || {
            let dashboard = dashboard.clone();
            async move {
                dashboard.poll_once().await;
            }
        })
    }

    /// One poll tick: the three reads run concurrently and fail independently.
    pub async fn poll_once(&self) -> PollReport {
        let (printer_status, jobs, last_valid) = tokio::join!(
            self.refresh_printer_status(),
            self.refresh_jobs(),
            self.refresh_last_valid(),
        );
        PollReport {
            printer_status: printer_status.is_ok(),
            jobs: jobs.is_ok(),
            last_valid: last_valid.is_ok(),
        }
    }

    pub async fn refresh_printer_status(&self) -> Result<(), ApiError> {
        match self.api.printer_status().await {
            Ok(status) => {
                let sample = TemperatureSample::from_status(&status, Local::now());
                let mut state = self.state.write().await;
                state.printer = Some(status);
                state.telemetry.push(sample);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to fetch printer status: {}", e);
                Err(e)
            }
        }
    }

    pub async fn refresh_jobs(&self) -> Result<(), ApiError> {
        match self.api.jobs().await {
            Ok(jobs) => {
                let mut state = self.state.write().await;
                state.tracker.apply(&jobs);
                if state.rating.job_id.is_none() {
                    state.rating.job_id = latest_finished(&jobs);
                }
                state.jobs = jobs;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to fetch jobs: {}", e);
                Err(e)
            }
        }
    }

    pub async fn refresh_last_valid(&self) -> Result<(), ApiError> {
        match self.api.last_valid_command().await {
            Ok(last) => {
                self.state.write().await.last_valid_command = Some(last.command);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to fetch last valid command: {}", e);
                Err(e)
            }
        }
    }

    /// Send a control command. On success printer status is re-polled right away.
    pub async fn dispatch(&self, command: ControlCommand) -> Notice {
        let notice = match self.api.send_control(command).await {
            Ok(()) => {
                tracing::info!("Printer {} command accepted", command);
                let _ = self.refresh_printer_status().await;
                Notice::success(format!("Printer {} command sent", command))
            }
            Err(e) => {
                tracing::error!("Printer {} command failed: {}", command, e);
                Notice::failure(format!("Failed to {} printer", command))
            }
        };
        self.record(notice).await
    }

    pub async fn controls(&self) -> ControlAvailability {
        ControlAvailability::from_status(self.state.read().await.printer.as_ref())
    }

    pub async fn rating_draft(&self) -> RatingDraft {
        self.state.read().await.rating.clone()
    }

    pub async fn set_rating_draft(&self, draft: RatingDraft) {
        self.state.write().await.rating = draft;
    }

    /// Submit the current rating draft. No request is made unless it names a job and both scores are in range.
    pub async fn submit_rating(&self) -> Notice {
        let draft = self.rating_draft().await;
        let request = match rating_request(&draft) {
            Ok(request) => request,
            Err(notice) => return self.record(notice).await,
        };
        let notice = match self.api.rate_job(&request).await {
            Ok(()) => {
                tracing::info!("Rating submitted for job {}", request.job_id);
                self.state.write().await.rating.clear();
                Notice::success("Rating submitted")
            }
            Err(e) => {
                tracing::error!("Rating for job {} failed: {}", request.job_id, e);
                Notice::failure("Failed to submit rating")
            }
        };
        self.record(notice).await
    }

    /// Rate `draft`, filling a missing job id with the latest finished job.
    /// A failed job refresh is reported as such rather than as a missing job.
    pub async fn rate_latest(&self, mut draft: RatingDraft) -> Notice {
        if draft.job_id.is_none() {
            if let Err(e) = self.refresh_jobs().await {
                tracing::error!("Cannot pick a job to rate: {}", e);
                return self.record(Notice::failure("Failed to load jobs")).await;
            }
            draft.job_id = self.rating_draft().await.job_id;
        }
        self.set_rating_draft(draft).await;
        self.submit_rating().await
    }

    pub async fn submit_next_valid(&self, command: &str) -> Notice {
        let command = command.trim();
        if command.is_empty() {
            return self.record(Notice::validation("Command must not be empty")).await;
        }
        let request = NextValidCommandRequest {
            command: command.to_string(),
        };
        let notice = match self.api.submit_next_valid(&request).await {
            Ok(()) => {
                tracing::info!("Next valid command set to '{}'", command);
                let _ = self.refresh_last_valid().await;
                Notice::success("Command submitted")
            }
            Err(e) => {
                tracing::error!("Submitting next valid command failed: {}", e);
                Notice::failure("Failed to submit command")
            }
        };
        self.record(notice).await
    }

    pub async fn download_timelapse(&self, job_id: JobId) -> Notice {
        self.download(DownloadKind::Timelapse, job_id).await
    }

    pub async fn download_photos(&self, job_id: JobId) -> Notice {
        self.download(DownloadKind::Photos, job_id).await
    }

    /// Path a download of `kind` for `job_id` is written to.
    pub fn download_path(&self, kind: DownloadKind, job_id: JobId) -> PathBuf {
        self.config.downloads.directory.join(kind.file_name(job_id))
    }

    async fn download(&self, kind: DownloadKind, job_id: JobId) -> Notice {
        let notice = match self.fetch_to_disk(kind, job_id).await {
            Ok(path) => {
                tracing::info!("Saved {} for job {} to {}", kind.label(), job_id, path.display());
                Notice::success(format!("Saved {}", path.display()))
            }
            Err(e) => {
                tracing::error!("Downloading {} for job {} failed: {}", kind.label(), job_id, e);
                Notice::failure(format!("Failed to download {}", kind.label()))
            }
        };
        self.record(notice).await
    }

    async fn fetch_to_disk(&self, kind: DownloadKind, job_id: JobId) -> Result<PathBuf, ApiError> {
        let bytes = match kind {
            DownloadKind::Timelapse => self.api.timelapse(job_id).await?,
            DownloadKind::Photos => self.api.picture_history(job_id).await?,
        };
        tokio::fs::create_dir_all(&self.config.downloads.directory).await?;
        let path = self.download_path(kind, job_id);
        tokio::fs::write(&path, &bytes).await?;
        Ok(path)
    }

    pub async fn snapshot(&self) -> DashboardView {
        let state = self.state.read().await;
        DashboardView::from_state(&state, self.config.camera_url())
    }

    async fn record(&self, notice: Notice) -> Notice {
        self.state.write().await.last_notice = Some(notice.clone());
        notice
    }
}

fn latest_finished(jobs: &[Job]) -> Option<JobId> {
    jobs.iter()
        .filter(|job| job.status == JobStatus::Finished)
        .max_by_key(|job| job.start_time)
        .map(|job| job.id)
}

fn rating_request(draft: &RatingDraft) -> Result<RatingRequest, Notice> {
    let Some(job_id) = draft.job_id else {
        return Err(Notice::validation("Select a job before submitting a rating"));
    };
    let (Some(quality), Some(speed)) = (draft.quality, draft.speed) else {
        return Err(Notice::validation("Rate both print quality and print speed"));
    };
    if !RATING_RANGE.contains(&quality) || !RATING_RANGE.contains(&speed) {
        return Err(Notice::validation("Ratings must be between 1 and 5"));
    }
    Ok(RatingRequest {
        job_id,
        print_quality: quality,
        print_speed: speed,
        feedback: draft.feedback.trim().to_string(),
    })
}
