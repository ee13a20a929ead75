//! Derives the current active job from a freshly polled job list.
//!
//! Recomputing from scratch every tick would flicker between "no active job"
//! and the real one while the backend moves a job between states, so a job
//! that was active stays tracked until the backend reports it as finished or
//! failed.

use crate::models::{Job, JobId, JobStatus};

/// What a poll did to the tracked job.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// A job in the list is active; it becomes (or stays) the current job.
    Active(Job),
    /// The tracked job reached a terminal status; live metrics are reset.
    Cleared { id: JobId, status: JobStatus },
    /// Nothing conclusive in the list; keep whatever was tracked before.
    Retained,
}

/// Most recent job (by start time) with an active status and no end time.
/// Ties go to the job listed first.
pub fn select_active(jobs: &[Job]) -> Option<&Job> {
    jobs.iter().filter(|job| job.is_active()).fold(None, |best: Option<&Job>, job| match best {
        Some(b) if b.start_time >= job.start_time => Some(b),
        _ => Some(job),
    })
}

pub fn reconcile(jobs: &[Job], previous: Option<&Job>) -> Reconciliation {
    if let Some(candidate) = select_active(jobs) {
        return Reconciliation::Active(candidate.clone());
    }
    if let Some(prev) = previous.filter(|p| p.status.is_active()) {
        if let Some(updated) = jobs.iter().find(|job| job.id == prev.id) {
            if updated.status.is_terminal() {
                return Reconciliation::Cleared {
                    id: updated.id,
                    status: updated.status,
                };
            }
        }
    }
    Reconciliation::Retained
}

/// Holds the current active job across polls.
#[derive(Debug, Clone, Default)]
pub struct JobTracker {
    current: Option<Job>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Job> {
        self.current.as_ref()
    }

    pub fn apply(&mut self, jobs: &[Job]) -> Reconciliation {
        let outcome = reconcile(jobs, self.current.as_ref());
        match &outcome {
            Reconciliation::Active(job) => {
                if self.current.as_ref().map(|c| c.id) != Some(job.id) {
                    tracing::info!("Tracking active job {} ({})", job.id, job.file_name);
                }
                self.current = Some(job.clone());
            }
            Reconciliation::Cleared { id, status } => {
                tracing::info!("Job {} ended with status {}", id, status.as_str());
                self.current = None;
            }
            Reconciliation::Retained => {}
        }
        outcome
    }
}
