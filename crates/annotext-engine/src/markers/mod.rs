//! # Time markers
//!
//! Timestamped notes dropped while a speaking-practice stopwatch runs.
//! The log is append-only: notes can be edited and the whole log cleared,
//! but markers are never reordered or deleted one by one.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    #[error("no time marker at index {index} (log has {len})")]
    NoSuchMarker { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeMarker {
    /// Stopwatch reading in whole seconds.
    pub time: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
}

impl TimeMarker {
    pub fn elapsed(&self) -> String {
        format_elapsed(self.time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeMarkerLog {
    markers: Vec<TimeMarker>,
}

impl TimeMarkerLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, time: u64, timestamp: DateTime<Utc>, note: impl Into<String>) -> usize {
        self.markers.push(TimeMarker {
            time,
            timestamp,
            note: note.into(),
        });
        self.markers.len() - 1
    }

    /// Appends a marker stamped with the current wall-clock time.
    pub fn append_now(&mut self, time: u64, note: impl Into<String>) -> usize {
        self.append(time, Utc::now(), note)
    }

    pub fn edit_note(&mut self, index: usize, note: impl Into<String>) -> Result<(), MarkerError> {
        let len = self.markers.len();
        let marker = self
            .markers
            .get_mut(index)
            .ok_or(MarkerError::NoSuchMarker { index, len })?;
        marker.note = note.into();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn get(&self, index: usize) -> Option<&TimeMarker> {
        self.markers.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeMarker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// `MM:SS`, with minutes growing past two digits when needed.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Pausable elapsed-time counter driven by caller-supplied instants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stopwatch {
    running_since: Option<Instant>,
    banked: Duration,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn start(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn stop(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.banked += now.saturating_duration_since(since);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .running_since
            .map(|since| now.saturating_duration_since(since))
            .unwrap_or_default();
        self.banked + running
    }

    /// Appends a marker at the current reading.
    pub fn mark(&self, log: &mut TimeMarkerLog, now: Instant, note: impl Into<String>) -> usize {
        log.append_now(self.elapsed(now).as_secs(), note)
    }
}
