use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::annotation::Annotation;
use crate::text::DocumentId;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

/// A whole-list save that is ready to hand to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    pub doc: DocumentId,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
struct Entry {
    annotations: Vec<Annotation>,
    last_change: Instant,
}

/// Coalesces bursts of edits into one save per document.
///
/// Every `schedule` replaces the pending list for that document and restarts
/// its quiet period. The caller owns the clock: it passes `now` in and polls
/// [`due`](Self::due) from its event loop.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    quiet: Duration,
    pending: BTreeMap<DocumentId, Entry>,
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl SaveDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: BTreeMap::new(),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    pub fn schedule(&mut self, doc: DocumentId, annotations: Vec<Annotation>, now: Instant) {
        self.pending.insert(
            doc,
            Entry {
                annotations,
                last_change: now,
            },
        );
    }

    /// Takes every save whose quiet period has elapsed by `now`.
    pub fn due(&mut self, now: Instant) -> Vec<PendingSave> {
        let ready: Vec<DocumentId> = self
            .pending
            .iter()
            .filter(|(_, e)| now.saturating_duration_since(e.last_change) >= self.quiet)
            .map(|(doc, _)| doc.clone())
            .collect();
        ready
            .into_iter()
            .filter_map(|doc| {
                self.pending.remove(&doc).map(|e| PendingSave {
                    doc,
                    annotations: e.annotations,
                })
            })
            .collect()
    }

    /// Takes every pending save regardless of timing (shutdown, explicit save).
    pub fn flush(&mut self) -> Vec<PendingSave> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(doc, e)| PendingSave {
                doc,
                annotations: e.annotations,
            })
            .collect()
    }

    pub fn is_pending(&self, doc: &DocumentId) -> bool {
        self.pending.contains_key(doc)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest instant at which [`due`](Self::due) will return something.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|e| e.last_change + self.quiet)
            .min()
    }
}
