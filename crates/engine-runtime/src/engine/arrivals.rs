//! Arrivals from the content store: messages, message lists and failures.

use super::{BoardEngine, EngineError, EngineResult};
use board_telemetry::{
    log_board_event, metric_add, metric_inc, time_histogram, DUPLICATES_IGNORED, GHOSTS_CREATED,
    GHOSTS_RESOLVED, INCONSISTENT_REFERENCES, INGEST_DURATION, MESSAGES_INGESTED, ORPHANS_ADOPTED,
    VALIDATION_REJECTIONS,
};
use shared_bus::BoardEvent;
use shared_types::{
    validate_message, FetchReason, IdentityId, Message, MessageId, MessageListId, MessageListReference,
    Timestamp,
};
use std::collections::BTreeSet;
use tl_02_board_index::{IngestReport, RootSlot};
use tl_03_fetch_retry::{ClearReport, FetchFailedMarker, FetchSubject};
use tracing::{debug, info, warn};

/// Outcome of one message arrival across all its boards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalReport {
    pub message_id: MessageId,
    /// One report per target board, in board-name order.
    pub boards: Vec<IngestReport>,
}

impl ArrivalReport {
    /// True when every board already held the message.
    pub fn is_duplicate(&self) -> bool {
        self.boards.iter().all(IngestReport::is_duplicate)
    }

    pub fn ghost_resolved(&self) -> bool {
        self.boards.iter().any(|r| r.ghost_resolved)
    }

    /// Bus notifications for the boards that changed.
    pub fn notifications(&self) -> Vec<BoardEvent> {
        let mut events = Vec::new();
        for report in self.boards.iter().filter(|r| !r.is_duplicate()) {
            events.push(BoardEvent::BoardUpdated {
                board: report.board.clone(),
                message_id: report.message_id,
            });
            if report.ghost_resolved {
                events.push(BoardEvent::GhostResolved {
                    board: report.board.clone(),
                    message_id: report.message_id,
                });
            }
        }
        events
    }
}

impl BoardEngine {
    /// Reconcile a downloaded message into every board it targets.
    ///
    /// `announced_by` is the identity the fetch was issued for; when given,
    /// it must match the author embedded in the message id.
    pub fn on_message_received(&self, message: Message, announced_by: Option<IdentityId>) -> EngineResult<ArrivalReport> {
        let id = message.id;
        if self.is_deleted(&id.author) {
            debug!(message_id = %id, "Message from deleted identity ignored");
            return Err(EngineError::DeletedIdentity(id.author));
        }

        if let Err(e) = validate_message(&message, announced_by, &self.config.validation) {
            metric_inc!(VALIDATION_REJECTIONS, &["message"]);
            warn!(message_id = %id, kind = e.kind(), error = %e, "Message rejected");
            self.discard_invalid(&id);
            return Err(e.into());
        }

        let _timer = time_histogram!(INGEST_DURATION);
        let mut report = ArrivalReport {
            message_id: id,
            boards: Vec::with_capacity(message.boards.len()),
        };

        // BTreeSet iteration gives the board-name lock order.
        for board in &message.boards {
            let handle = self.board_or_create(board);
            let mut graph = handle.write();
            // Re-checked under the board lock: a deletion that already swept
            // this board must not see the message land after it.
            if self.is_deleted(&id.author) {
                return Err(EngineError::DeletedIdentity(id.author));
            }
            let ingest = graph.ingest(message.clone())?;
            drop(graph);
            Self::record_ingest(&ingest);
            report.boards.push(ingest);
        }

        self.lists.mark_downloaded(&id);
        self.retry.on_fetch_succeeded(&FetchSubject::Message(id));

        if !report.is_duplicate() {
            let boards: Vec<&str> = message.boards.iter().map(|b| b.as_str()).collect();
            log_board_event!(
                debug,
                "Message received",
                boards.join(","),
                id,
                ghost_resolved = report.ghost_resolved()
            );
        }
        Ok(report)
    }

    fn record_ingest(report: &IngestReport) {
        if report.is_duplicate() {
            metric_inc!(DUPLICATES_IGNORED);
            return;
        }
        metric_inc!(MESSAGES_INGESTED);
        metric_add!(GHOSTS_CREATED, report.ghosts_created.len());
        metric_add!(ORPHANS_ADOPTED, report.orphans_adopted);
        if report.ghost_resolved {
            metric_inc!(GHOSTS_RESOLVED);
        }
        if report.inconsistent_reference {
            metric_inc!(INCONSISTENT_REFERENCES);
        }
    }

    /// Content that failed validation is never fetched again.
    pub fn discard_invalid(&self, id: &MessageId) {
        self.lists.mark_downloaded(id);
        self.retry.on_fetch_succeeded(&FetchSubject::Message(*id));
    }

    /// Accept a message list and return the ids that still need fetching.
    pub fn on_message_list_received(
        &self,
        list_id: MessageListId,
        references: Vec<MessageListReference>,
        received: Timestamp,
    ) -> EngineResult<Vec<MessageId>> {
        if self.is_deleted(&list_id.author) {
            debug!(list = %list_id, "Message list from deleted identity ignored");
            return Err(EngineError::DeletedIdentity(list_id.author));
        }

        let newly_wanted = self.lists.on_message_list_received(list_id, references, received)?;
        self.retry.on_fetch_succeeded(&FetchSubject::MessageList(list_id));

        // Messages already fetched as ghosts before their list arrived.
        let mut wanted = Vec::with_capacity(newly_wanted.len());
        for id in newly_wanted {
            if self.is_stored(&id) {
                self.lists.mark_downloaded(&id);
            } else {
                wanted.push(id);
            }
        }
        Ok(wanted)
    }

    pub fn on_message_fetch_failed(&self, message_id: MessageId, reason: FetchReason) -> FetchFailedMarker {
        self.retry
            .on_fetch_failed(FetchSubject::Message(message_id), reason, self.now())
    }

    pub fn on_message_list_fetch_failed(&self, list_id: MessageListId, reason: FetchReason) -> FetchFailedMarker {
        self.retry
            .on_fetch_failed(FetchSubject::MessageList(list_id), reason, self.now())
    }

    /// Report markers that became due and purge stale ones.
    pub fn clear_expired_fetch_failed_markers(&self) -> ClearReport {
        let report = self.retry.clear_expired_fetch_failed_markers(self.now());
        if !report.eligible.is_empty() || !report.purged.is_empty() {
            info!(
                eligible = report.eligible.len(),
                purged = report.purged.len(),
                "Fetch markers swept"
            );
        }
        report
    }

    pub fn is_retry_allowed_now(&self, subject: &FetchSubject) -> bool {
        self.retry.is_retry_allowed_now(subject, self.now())
    }

    /// True if any board holds `id`.
    pub fn is_stored(&self, id: &MessageId) -> bool {
        self.board_handles()
            .iter()
            .any(|(_, handle)| handle.read().contains(id))
    }

    /// Message ids worth fetching now, in id order.
    ///
    /// Sources: announced references not yet downloaded, ghost references,
    /// and the unknown roots of absolute orphans. Ids under backoff and ids
    /// of deleted identities are left out.
    pub fn messages_to_fetch(&self) -> Vec<MessageId> {
        let mut wanted: BTreeSet<MessageId> = self
            .lists
            .messages_to_fetch()
            .into_iter()
            .map(|r| r.message_id)
            .collect();

        for (_, handle) in self.board_handles() {
            let graph = handle.read();
            wanted.extend(graph.ghost_ids());
            wanted.extend(
                graph
                    .trees()
                    .filter(|tree| tree.root == RootSlot::Unknown)
                    .map(|tree| tree.id),
            );
        }

        let now = self.now();
        let deleted = self.deleted_identities.read().clone();
        wanted
            .into_iter()
            .filter(|id| !deleted.contains(&id.author))
            .filter(|id| !self.is_stored(id))
            .filter(|id| self.retry.is_retry_allowed_now(&FetchSubject::Message(*id), now))
            .collect()
    }

    /// Missing list editions of every known author that are not under backoff.
    pub fn lists_to_fetch(&self) -> Vec<MessageListId> {
        let authors: BTreeSet<IdentityId> = self.lists.lists().iter().map(|l| l.author()).collect();
        let now = self.now();
        authors
            .into_iter()
            .flat_map(|author| {
                self.lists
                    .missing_editions(&author)
                    .into_iter()
                    .map(move |edition| MessageListId::new(author, edition))
            })
            .filter(|id| self.retry.is_retry_allowed_now(&FetchSubject::MessageList(*id), now))
            .collect()
    }
}
