// src/telemetry.rs
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;

use crate::models::PrinterStatus;

pub const DEFAULT_CAPACITY: usize = 20;

/// One temperature reading, taken once per successful status poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureSample {
    pub time: String,
    pub nozzle: f64,
    pub bed: f64,
}

impl TemperatureSample {
    pub fn from_status(status: &PrinterStatus, at: DateTime<Local>) -> Self {
        Self {
            time: at.format("%H:%M:%S").to_string(),
            nozzle: status.nozzle_temperature,
            bed: status.bed_temperature,
        }
    }
}

/// Fixed-capacity rolling window of recent samples, oldest evicted first.
#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    samples: VecDeque<TemperatureSample>,
    capacity: usize,
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TelemetryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, sample: TemperatureSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&TemperatureSample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemperatureSample> {
        self.samples.iter()
    }

    /// Samples in append order, oldest first.
    pub fn samples(&self) -> Vec<TemperatureSample> {
        self.samples.iter().cloned().collect()
    }

    // Chart series
    pub fn labels(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.time.as_str()).collect()
    }

    pub fn nozzle_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.nozzle).collect()
    }

    pub fn bed_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.bed).collect()
    }
}
