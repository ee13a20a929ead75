//! Plain-text rendering of a dashboard snapshot.

use chrono::Local;
use serde::Serialize;
use std::fmt::Write;

use crate::controls::ControlAvailability;
use crate::dashboard::DashboardState;
use crate::format::{
    estimated_end_time, format_duration, format_filament, format_optional_duration, format_progress,
    format_timestamp,
};
use crate::models::{Job, JobId, PrinterStatus};
use crate::notice::Notice;
use crate::telemetry::TemperatureSample;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Display values for the active job, computed per render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub file_name: String,
    pub status: String,
    pub started: String,
    pub elapsed: String,
    pub progress: String,
    pub filament: String,
    pub estimated_duration: String,
    pub estimated_end: String,
}

impl JobView {
    pub fn from_job(job: &Job) -> Self {
        Self {
            id: job.id,
            file_name: job.file_name.clone(),
            status: job.status.as_str().to_string(),
            started: format_timestamp(&job.start_time.with_timezone(&Local)),
            elapsed: elapsed(job),
            progress: format_progress(job.progress),
            filament: format_filament(job.filament_used),
            estimated_duration: format_optional_duration(job.estimated_completion_time),
            estimated_end: estimated_end_time(job)
                .map(|end| format_timestamp(&end.with_timezone(&Local)))
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: Option<PrinterStatus>,
    pub controls: ControlAvailability,
    pub active_job: Option<JobView>,
    pub job_count: usize,
    pub telemetry: Vec<TemperatureSample>,
    pub last_valid_command: Option<String>,
    pub last_notice: Option<Notice>,
    pub camera_url: String,
}

impl DashboardView {
    pub fn from_state(state: &DashboardState, camera_url: String) -> Self {
        Self {
            status: state.printer.clone(),
            controls: ControlAvailability::from_status(state.printer.as_ref()),
            active_job: state.tracker.current().map(JobView::from_job),
            job_count: state.jobs.len(),
            telemetry: state.telemetry.samples(),
            last_valid_command: state.last_valid_command.clone(),
            last_notice: state.last_notice.clone(),
            camera_url,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match &self.status {
            Some(s) => {
                let _ = writeln!(
                    out,
                    "Printer: {:?}  nozzle {:.1}°C  bed {:.1}°C  operational={} printing={} paused={}",
                    s.state, s.nozzle_temperature, s.bed_temperature, s.operational, s.printing, s.paused
                );
            }
            None => {
                let _ = writeln!(out, "Printer: status not loaded");
            }
        }
        let _ = writeln!(out, "Controls: {}", render_controls(&self.controls));
        match &self.active_job {
            Some(job) => {
                let _ = writeln!(out, "Job #{} {} [{}]", job.id, job.file_name, job.status);
                let _ = writeln!(
                    out,
                    "  progress {}  filament {}  started {}  elapsed {}",
                    job.progress, job.filament, job.started, job.elapsed
                );
                let _ = writeln!(
                    out,
                    "  estimated {}  ends {}",
                    job.estimated_duration, job.estimated_end
                );
            }
            None => {
                let _ = writeln!(out, "Job: none active ({} known)", self.job_count);
            }
        }
        if !self.telemetry.is_empty() {
            let nozzle: Vec<f64> = self.telemetry.iter().map(|s| s.nozzle).collect();
            let bed: Vec<f64> = self.telemetry.iter().map(|s| s.bed).collect();
            let _ = writeln!(out, "Nozzle {}", sparkline(&nozzle));
            let _ = writeln!(out, "Bed    {}", sparkline(&bed));
        }
        if let Some(command) = &self.last_valid_command {
            let _ = writeln!(out, "Last valid command: {}", command);
        }
        if let Some(notice) = &self.last_notice {
            let _ = writeln!(out, "{}", notice);
        }
        let _ = write!(out, "Camera: {}", self.camera_url);
        out
    }
}

fn render_controls(controls: &ControlAvailability) -> String {
    let mark = |enabled: bool, name: &str| {
        if enabled { format!("[{}]", name) } else { format!(" {} ", name) }
    };
    [
        mark(controls.pause, "pause"),
        mark(controls.resume, "resume"),
        mark(controls.cancel, "cancel"),
        mark(controls.preheat, "preheat"),
    ]
    .join(" ")
}

/// One bar per value, scaled between the series minimum and maximum.
pub fn sparkline(values: &[f64]) -> String {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                return ' ';
            }
            if max - min < f64::EPSILON {
                return SPARK_LEVELS[0];
            }
            let scaled = (v - min) / (max - min) * (SPARK_LEVELS.len() - 1) as f64;
            SPARK_LEVELS[scaled.round() as usize]
        })
        .collect()
}

fn elapsed(job: &Job) -> String {
    let end = job.end_time.unwrap_or_else(chrono::Utc::now);
    format_duration(end.signed_duration_since(job.start_time).num_seconds() as f64)
}
