//! Derived display values. Pure functions, no state.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::fmt;

use crate::models::Job;

const NOT_AVAILABLE: &str = "N/A";

/// `HH:MM:SS`, or `N/A` for zero, negative or non-finite input.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return NOT_AVAILABLE.to_string();
    }
    let total = seconds as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

pub fn format_optional_duration(seconds: Option<f64>) -> String {
    seconds.map(format_duration).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn format_progress(progress: Option<f64>) -> String {
    match progress {
        Some(p) if p.is_finite() => format!("{:.1}%", p.clamp(0.0, 100.0)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_filament(filament_used: Option<f64>) -> String {
    match filament_used {
        Some(f) if f.is_finite() => format!("{:.2} mm", f),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `start_time + estimated_completion_time`, absent when there is no usable estimate.
pub fn estimated_end_time(job: &Job) -> Option<DateTime<Utc>> {
    let seconds = job.estimated_completion_time?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let delta = TimeDelta::try_milliseconds((seconds * 1000.0) as i64)?;
    job.start_time.checked_add_signed(delta)
}
