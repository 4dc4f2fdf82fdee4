//! # Fetch Retry Tracker
//!
//! Pure state machine over failure markers. All operations take the current
//! time explicitly; the service layer supplies it.

use super::config::RetryConfig;
use super::marker::{FetchFailedMarker, FetchSubject};
use shared_types::{FetchReason, IdentityId, MessageId, Timestamp};
use std::collections::{BTreeMap, HashSet};

/// Result of a periodic sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearReport {
    /// Subjects whose backoff elapsed since the previous sweep.
    pub eligible: Vec<FetchSubject>,
    /// Subjects whose markers outlived the TTL and were dropped.
    pub purged: Vec<FetchSubject>,
}

/// Failure markers keyed by subject.
#[derive(Debug, Clone, Default)]
pub struct FetchRetryTracker {
    markers: BTreeMap<FetchSubject, FetchFailedMarker>,
    config: RetryConfig,
}

impl FetchRetryTracker {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            markers: BTreeMap::new(),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Record a failed fetch and schedule the next attempt.
    pub fn on_fetch_failed(
        &mut self,
        subject: FetchSubject,
        reason: FetchReason,
        now: Timestamp,
    ) -> &FetchFailedMarker {
        let config = &self.config;
        let marker = self
            .markers
            .entry(subject)
            .and_modify(|m| {
                m.retry_count = m.retry_count.saturating_add(1);
                m.reason = reason;
                m.last_attempt = now;
                m.next_retry = now.saturating_add(config.delay_for(m.retry_count));
                m.retry_reported = false;
            })
            .or_insert_with(|| FetchFailedMarker::new(subject, reason, now, config.min_delay_secs));
        &*marker
    }

    /// True iff no marker exists or its backoff elapsed.
    pub fn is_retry_allowed_now(&self, subject: &FetchSubject, now: Timestamp) -> bool {
        self.markers.get(subject).map_or(true, |m| m.is_due(now))
    }

    /// Forget the marker after a successful fetch.
    pub fn on_fetch_succeeded(&mut self, subject: &FetchSubject) -> Option<FetchFailedMarker> {
        self.markers.remove(subject)
    }

    /// Report newly due subjects and purge markers older than the TTL.
    ///
    /// A due subject is reported once per failure; the marker itself stays
    /// so that a further failure continues the schedule.
    pub fn clear_expired_fetch_failed_markers(&mut self, now: Timestamp) -> ClearReport {
        let ttl = self.config.marker_ttl_secs;
        let mut report = ClearReport::default();

        self.markers.retain(|subject, marker| {
            if marker.is_stale(now, ttl) {
                report.purged.push(*subject);
                return false;
            }
            if marker.is_due(now) && !marker.retry_reported {
                marker.retry_reported = true;
                report.eligible.push(*subject);
            }
            true
        });

        report
    }

    /// Remove every marker for subjects authored by `identity`.
    pub fn prune_author(&mut self, identity: &IdentityId) -> usize {
        let before = self.markers.len();
        self.markers.retain(|subject, _| subject.author() != *identity);
        before - self.markers.len()
    }

    /// Remove markers for the given message ids.
    pub fn prune_subjects<'a>(&mut self, ids: impl IntoIterator<Item = &'a MessageId>) -> usize {
        let ids: HashSet<&MessageId> = ids.into_iter().collect();
        let before = self.markers.len();
        self.markers.retain(|subject, _| match subject {
            FetchSubject::Message(id) => !ids.contains(id),
            FetchSubject::MessageList(_) => true,
        });
        before - self.markers.len()
    }

    /// Keep only message markers accepted by `keep`; list markers are untouched.
    pub fn retain_messages(&mut self, mut keep: impl FnMut(&MessageId) -> bool) -> usize {
        let before = self.markers.len();
        self.markers.retain(|subject, _| match subject {
            FetchSubject::Message(id) => keep(id),
            FetchSubject::MessageList(_) => true,
        });
        before - self.markers.len()
    }

    pub fn get(&self, subject: &FetchSubject) -> Option<&FetchFailedMarker> {
        self.markers.get(subject)
    }

    pub fn markers(&self) -> impl Iterator<Item = &FetchFailedMarker> {
        self.markers.values()
    }

    /// Replace all markers (snapshot restore).
    pub fn load(&mut self, markers: impl IntoIterator<Item = FetchFailedMarker>) {
        self.markers = markers.into_iter().map(|m| (m.subject, m)).collect();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
