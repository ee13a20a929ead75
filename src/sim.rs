//! Simulated dashboard backend.
//!
//! Serves the same REST surface as the real printer service from in-memory
//! state, so the dashboard can be developed and tested without a printer.
//! Temperatures drift toward their targets and the active job advances a
//! fixed step every time printer status is requested.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::EndpointMap;
use crate::models::{
    Job, JobId, JobStatus, LastValidCommand, NextValidCommandRequest, PrinterState, PrinterStatus,
    RatingRequest,
};

const PREHEAT_NOZZLE: f64 = 200.0;
const PREHEAT_BED: f64 = 60.0;
const PRINT_NOZZLE: f64 = 210.0;
const PRINT_BED: f64 = 60.0;
const AMBIENT: f64 = 22.0;
const JOB_ESTIMATE_SECS: f64 = 1800.0;
const FILAMENT_PER_PERCENT: f64 = 45.0;

#[derive(Debug, Clone)]
pub struct SimPrinter {
    pub nozzle: f64,
    pub bed: f64,
    pub nozzle_target: f64,
    pub bed_target: f64,
    pub jobs: Vec<Job>,
    pub active: Option<JobId>,
    pub paused: bool,
    pub last_valid: String,
    pub ratings: Vec<RatingRequest>,
    /// When set, control endpoints answer 500.
    pub fail_commands: bool,
    /// Progress added per status request, in percent.
    pub progress_step: f64,
    /// Adds random noise to temperature readings.
    pub jitter: bool,
    next_id: JobId,
}

impl Default for SimPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl SimPrinter {
    pub fn new() -> Self {
        Self {
            nozzle: AMBIENT,
            bed: AMBIENT,
            nozzle_target: 0.0,
            bed_target: 0.0,
            jobs: Vec::new(),
            active: None,
            paused: false,
            last_valid: "G28".to_string(),
            ratings: Vec::new(),
            fail_commands: false,
            progress_step: 5.0,
            jitter: true,
            next_id: 1,
        }
    }

    pub fn start_job(&mut self, file_name: &str) -> JobId {
        if let Some(id) = self.active {
            self.finish(id, JobStatus::Failed);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.jobs.push(Job {
            id,
            file_name: file_name.to_string(),
            status: JobStatus::Started,
            start_time: Utc::now(),
            end_time: None,
            filament_used: Some(0.0),
            progress: Some(0.0),
            estimated_completion_time: Some(JOB_ESTIMATE_SECS),
        });
        self.active = Some(id);
        self.paused = false;
        self.nozzle_target = PRINT_NOZZLE;
        self.bed_target = PRINT_BED;
        tracing::info!("Simulated job {} started ({})", id, file_name);
        id
    }

    pub fn status(&self) -> PrinterStatus {
        let printing = self.active.is_some();
        PrinterStatus {
            state: if printing { PrinterState::Printing } else { PrinterState::Idle },
            nozzle_temperature: self.nozzle,
            bed_temperature: self.bed,
            operational: true,
            printing: printing && !self.paused,
            paused: printing && self.paused,
        }
    }

    /// Jobs, newest first.
    pub fn jobs_desc(&self) -> Vec<Job> {
        let mut jobs = self.jobs.clone();
        jobs.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        jobs
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    fn job_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| job.id == id)
    }

    pub fn advance(&mut self) {
        let noise: f64 = if self.jitter { rand::rng().random_range(-0.3..0.3) } else { 0.0 };
        self.nozzle = approach(self.nozzle, self.nozzle_target.max(AMBIENT)) + noise;
        self.bed = approach(self.bed, self.bed_target.max(AMBIENT)) + noise / 2.0;

        let Some(id) = self.active else { return };
        if self.paused {
            return;
        }
        let step = self.progress_step;
        let mut done = false;
        if let Some(job) = self.job_mut(id) {
            let progress = (job.progress.unwrap_or(0.0) + step).min(100.0);
            job.progress = Some(progress);
            job.filament_used = Some(progress * FILAMENT_PER_PERCENT);
            done = progress >= 100.0;
        }
        if done {
            self.finish(id, JobStatus::Finished);
        }
    }

    pub fn pause(&mut self) -> Result<(), &'static str> {
        let id = self.active.ok_or("No active job")?;
        if self.paused {
            return Err("Job already paused");
        }
        self.paused = true;
        self.set_status(id, JobStatus::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), &'static str> {
        let id = self.active.ok_or("No active job")?;
        if !self.paused {
            return Err("Job is not paused");
        }
        self.paused = false;
        self.set_status(id, JobStatus::Resumed);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), &'static str> {
        let id = self.active.ok_or("No active job")?;
        self.finish(id, JobStatus::Failed);
        Ok(())
    }

    pub fn preheat(&mut self) {
        self.nozzle_target = PREHEAT_NOZZLE;
        self.bed_target = PREHEAT_BED;
    }

    fn set_status(&mut self, id: JobId, status: JobStatus) {
        if let Some(job) = self.job_mut(id) {
            job.status = status;
        }
    }

    fn finish(&mut self, id: JobId, status: JobStatus) {
        if let Some(job) = self.job_mut(id) {
            job.status = status;
            job.end_time = Some(Utc::now());
        }
        tracing::info!("Simulated job {} ended with status {}", id, status.as_str());
        self.active = None;
        self.paused = false;
        self.nozzle_target = 0.0;
        self.bed_target = 0.0;
    }
}

fn approach(current: f64, target: f64) -> f64 {
    current + (target - current) * 0.25
}

pub type SimState = Arc<Mutex<SimPrinter>>;

pub fn new_state(printer: SimPrinter) -> SimState {
    Arc::new(Mutex::new(printer))
}

fn lock(state: &SimState) -> MutexGuard<'_, SimPrinter> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Helper to create a JSON error response with a message and status code
fn json_error(message: &str, status: StatusCode) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Creates the router serving every dashboard endpoint at the given paths.
pub fn router(state: SimState, endpoints: &EndpointMap) -> Router {
    Router::new()
        .route(&endpoints.printer_status, get(get_status))
        .route(&endpoints.jobs, get(get_jobs))
        .route(&endpoints.last_valid, get(get_last_valid))
        .route(&endpoints.next_valid, post(post_next_valid))
        .route(&endpoints.pause, post(pause_handler))
        .route(&endpoints.resume, post(resume_handler))
        .route(&endpoints.cancel, post(cancel_handler))
        .route(&endpoints.preheat, post(preheat_handler))
        .route(&endpoints.rate_job, post(rate_handler))
        .route(&endpoints.timelapse, get(timelapse_handler))
        .route(&endpoints.picture_history, get(pictures_handler))
        .with_state(state)
}

pub fn app() -> Router {
    router(new_state(SimPrinter::new()), &EndpointMap::default())
}

async fn get_status(State(state): State<SimState>) -> Json<PrinterStatus> {
    let mut printer = lock(&state);
    printer.advance();
    Json(printer.status())
}

async fn get_jobs(State(state): State<SimState>) -> Json<Vec<Job>> {
    Json(lock(&state).jobs_desc())
}

async fn get_last_valid(State(state): State<SimState>) -> Json<LastValidCommand> {
    Json(LastValidCommand {
        command: lock(&state).last_valid.clone(),
    })
}

async fn post_next_valid(
    State(state): State<SimState>,
    Json(payload): Json<NextValidCommandRequest>,
) -> Response {
    if payload.command.trim().is_empty() {
        return json_error("Command must not be empty", StatusCode::BAD_REQUEST);
    }
    lock(&state).last_valid = payload.command;
    StatusCode::OK.into_response()
}

fn control(state: &SimState, action: impl FnOnce(&mut SimPrinter) -> Result<(), &'static str>) -> Response {
    let mut printer = lock(state);
    if printer.fail_commands {
        return json_error("Printer unavailable", StatusCode::INTERNAL_SERVER_ERROR);
    }
    match action(&mut *printer) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(message) => json_error(message, StatusCode::CONFLICT),
    }
}

async fn pause_handler(State(state): State<SimState>) -> Response {
    control(&state, SimPrinter::pause)
}

async fn resume_handler(State(state): State<SimState>) -> Response {
    control(&state, SimPrinter::resume)
}

async fn cancel_handler(State(state): State<SimState>) -> Response {
    control(&state, SimPrinter::cancel)
}

async fn preheat_handler(State(state): State<SimState>) -> Response {
    control(&state, |printer| {
        printer.preheat();
        Ok(())
    })
}

async fn rate_handler(State(state): State<SimState>, Json(payload): Json<RatingRequest>) -> Response {
    let mut printer = lock(&state);
    if printer.job(payload.job_id).is_none() {
        return json_error("Unknown job", StatusCode::NOT_FOUND);
    }
    tracing::debug!("Rating received for job {}", payload.job_id);
    printer.ratings.push(payload);
    StatusCode::OK.into_response()
}

#[derive(Debug, Deserialize)]
struct JobQuery {
    #[serde(rename = "jobId")]
    job_id: JobId,
}

fn artifact(state: &SimState, job_id: JobId, content_type: &'static str, body: Vec<u8>) -> Response {
    if lock(state).job(job_id).is_none() {
        return json_error("Unknown job", StatusCode::NOT_FOUND);
    }
    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

async fn timelapse_handler(State(state): State<SimState>, Query(query): Query<JobQuery>) -> Response {
    let body = format!("SIMULATED-TIMELAPSE-{}", query.job_id).into_bytes();
    artifact(&state, query.job_id, "video/mp4", body)
}

async fn pictures_handler(State(state): State<SimState>, Query(query): Query<JobQuery>) -> Response {
    let mut body = b"PK\x03\x04".to_vec();
    body.extend_from_slice(format!("SIMULATED-PHOTOS-{}", query.job_id).as_bytes());
    artifact(&state, query.job_id, "application/zip", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_runs_to_completion() {
        let mut printer = SimPrinter::new();
        printer.progress_step = 50.0;
        let id = printer.start_job("cube.gcode");
        assert!(printer.status().printing);
        printer.advance();
        printer.advance();
        assert!(printer.active.is_none());
        let job = printer.job(id).unwrap();
        assert_eq!(job.status, JobStatus::Finished);
        assert!(job.end_time.is_some());
        assert_eq!(job.progress, Some(100.0));
    }

    #[test]
    fn test_pause_and_resume_transitions() {
        let mut printer = SimPrinter::new();
        assert!(printer.pause().is_err());
        let id = printer.start_job("cube.gcode");
        printer.pause().unwrap();
        assert!(printer.status().paused);
        assert!(!printer.status().printing);
        assert_eq!(printer.job(id).unwrap().status, JobStatus::Paused);
        let before = printer.job(id).unwrap().progress;
        printer.advance();
        assert_eq!(printer.job(id).unwrap().progress, before);
        printer.resume().unwrap();
        assert_eq!(printer.job(id).unwrap().status, JobStatus::Resumed);
        assert!(printer.resume().is_err());
    }

    #[test]
    fn test_temperatures_approach_targets() {
        let mut printer = SimPrinter::new();
        printer.jitter = false;
        printer.preheat();
        for _ in 0..40 {
            printer.advance();
        }
        assert!((printer.nozzle - PREHEAT_NOZZLE).abs() < 1.0);
        assert!((printer.bed - PREHEAT_BED).abs() < 1.0);
    }
}
