//! # Fetch Retry Service
//!
//! Thread-safe wrapper over [`FetchRetryTracker`] that logs decisions and
//! keeps the marker metrics current.

use crate::domain::config::RetryConfig;
use crate::domain::marker::{reason_label, FetchFailedMarker, FetchSubject};
use crate::domain::tracker::{ClearReport, FetchRetryTracker};
use board_telemetry::{FETCH_FAILURES, FETCH_MARKERS};
use parking_lot::RwLock;
use shared_types::{FetchReason, IdentityId, MessageId, Timestamp};
use tracing::{debug, info};

/// Shared retry tracker.
pub struct FetchRetryService {
    tracker: RwLock<FetchRetryTracker>,
}

impl FetchRetryService {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            tracker: RwLock::new(FetchRetryTracker::new(config)),
        }
    }

    pub fn on_fetch_failed(&self, subject: FetchSubject, reason: FetchReason, now: Timestamp) -> FetchFailedMarker {
        let marker = {
            let mut tracker = self.tracker.write();
            let marker = tracker.on_fetch_failed(subject, reason, now).clone();
            FETCH_MARKERS.set(tracker.len() as f64);
            marker
        };
        FETCH_FAILURES
            .with_label_values(&[subject.kind(), reason_label(reason)])
            .inc();
        debug!(
            subject = %subject,
            reason = ?reason,
            retry_count = marker.retry_count,
            next_retry = marker.next_retry,
            "Fetch failed, retry scheduled"
        );
        marker
    }

    pub fn on_fetch_succeeded(&self, subject: &FetchSubject) {
        let mut tracker = self.tracker.write();
        if let Some(marker) = tracker.on_fetch_succeeded(subject) {
            debug!(subject = %subject, retries = marker.retry_count, "Fetch recovered");
        }
        FETCH_MARKERS.set(tracker.len() as f64);
    }

    pub fn is_retry_allowed_now(&self, subject: &FetchSubject, now: Timestamp) -> bool {
        self.tracker.read().is_retry_allowed_now(subject, now)
    }

    pub fn clear_expired_fetch_failed_markers(&self, now: Timestamp) -> ClearReport {
        let mut tracker = self.tracker.write();
        let report = tracker.clear_expired_fetch_failed_markers(now);
        FETCH_MARKERS.set(tracker.len() as f64);
        if !report.eligible.is_empty() || !report.purged.is_empty() {
            info!(
                eligible = report.eligible.len(),
                purged = report.purged.len(),
                remaining = tracker.len(),
                "Swept fetch-failed markers"
            );
        }
        report
    }

    pub fn prune_author(&self, identity: &IdentityId) -> usize {
        let mut tracker = self.tracker.write();
        let removed = tracker.prune_author(identity);
        FETCH_MARKERS.set(tracker.len() as f64);
        removed
    }

    pub fn prune_subjects<'a>(&self, ids: impl IntoIterator<Item = &'a MessageId>) -> usize {
        let mut tracker = self.tracker.write();
        let removed = tracker.prune_subjects(ids);
        FETCH_MARKERS.set(tracker.len() as f64);
        removed
    }

    /// Drop message markers for which `keep` returns false.
    pub fn retain_messages(&self, keep: impl FnMut(&MessageId) -> bool) -> usize {
        let mut tracker = self.tracker.write();
        let removed = tracker.retain_messages(keep);
        FETCH_MARKERS.set(tracker.len() as f64);
        removed
    }

    pub fn marker(&self, subject: &FetchSubject) -> Option<FetchFailedMarker> {
        self.tracker.read().get(subject).cloned()
    }

    pub fn markers(&self) -> Vec<FetchFailedMarker> {
        self.tracker.read().markers().cloned().collect()
    }

    pub fn load(&self, markers: Vec<FetchFailedMarker>) {
        let mut tracker = self.tracker.write();
        tracker.load(markers);
        FETCH_MARKERS.set(tracker.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.tracker.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.read().is_empty()
    }
}

impl Default for FetchRetryService {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_round_trip() {
        let service = FetchRetryService::default();
        let subject = FetchSubject::Message(MessageId::generate(IdentityId([1; 32])));

        let marker = service.on_fetch_failed(subject, FetchReason::NotFound, 100);
        assert_eq!(marker.next_retry, 700);
        assert!(!service.is_retry_allowed_now(&subject, 200));

        service.on_fetch_succeeded(&subject);
        assert!(service.is_empty());
    }

    #[test]
    fn test_load_replaces_markers() {
        let service = FetchRetryService::default();
        let subject = FetchSubject::Message(MessageId::generate(IdentityId([1; 32])));
        service.on_fetch_failed(subject, FetchReason::Transient, 0);
        let saved = service.markers();

        let restored = FetchRetryService::default();
        restored.load(saved);
        assert_eq!(restored.marker(&subject).map(|m| m.retry_count), Some(0));
    }
}
