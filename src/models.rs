//! Data models for the dashboard backend's requests and responses.
//!
//! Printer and job snapshots are owned by the backend; the dashboard only
//! ever reads them and replaces its local copies wholesale on each poll.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = i64;

/// Coarse printer state as reported by `/dashboard/printer-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrinterState {
    Printing,
    Idle,
    Error,
    #[serde(other)]
    Other,
}

/// Represents the current status of the printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterStatus {
    pub state: PrinterState,
    #[serde(default)]
    pub nozzle_temperature: f64,
    #[serde(default)]
    pub bed_temperature: f64,
    #[serde(default)]
    pub operational: bool,
    #[serde(default)]
    pub printing: bool,
    #[serde(default)]
    pub paused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Started,
    Resumed,
    Paused,
    Finished,
    Failed,
}

impl JobStatus {
    /// Started, resumed and paused jobs still occupy the printer.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Started | JobStatus::Resumed | JobStatus::Paused)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Started => "STARTED",
            JobStatus::Resumed => "RESUMED",
            JobStatus::Paused => "PAUSED",
            JobStatus::Finished => "FINISHED",
            JobStatus::Failed => "FAILED",
        }
    }
}

/// A print job snapshot from `/dashboard/jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub file_name: String,
    pub status: JobStatus,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub filament_used: Option<f64>,
    #[serde(default)]
    pub progress: Option<f64>,
    /// Seconds from `start_time` until the backend expects the print to finish.
    #[serde(default)]
    pub estimated_completion_time: Option<f64>,
}

impl Job {
    /// An active job has an active status and no recorded end time.
    pub fn is_active(&self) -> bool {
        self.status.is_active() && self.end_time.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastValidCommand {
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextValidCommandRequest {
    pub command: String,
}

/// Body of `/dashboard/rate-job`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub job_id: JobId,
    pub print_quality: f64,
    pub print_speed: f64,
    pub feedback: String,
}

/// Local rating form state. Cleared after a successful submission, except for the job id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingDraft {
    pub quality: Option<f64>,
    pub speed: Option<f64>,
    pub feedback: String,
    pub job_id: Option<JobId>,
}

impl RatingDraft {
    pub fn for_job(job_id: JobId) -> Self {
        Self {
            job_id: Some(job_id),
            ..Default::default()
        }
    }

    pub fn clear(&mut self) {
        self.quality = None;
        self.speed = None;
        self.feedback.clear();
    }
}

/// Backend timestamps arrive either as RFC 3339 or as naive ISO-8601 (assumed UTC).
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw))),
                None => Ok(None),
            }
        }
    }
}
