//! Debounced update log.
//!
//! Every field mutation is reported here with a snapshot of the demo's
//! vectors.  Rapid-fire mutations of the *same* demo coalesce into one
//! pending record (latest snapshot wins); a mutation of a *different*
//! demo, or the debounce window elapsing, flushes the pending record
//! into the outbox, where a persistence/logging collaborator drains it.
//!
//! Only the externally-visible log is debounced — PCA recompute
//! dispatch runs synchronously on every mutation and never passes
//! through here.

use demo_field::{DestVec, FieldEvent, SourceVec};
use tracing::debug;

/// Length of the coalescing window, in logical time units.
pub const DEBOUNCE_WINDOW: u64 = 500;

// ════════════════════════════════════════════════════════════════════════════
// UpdateRecord
// ════════════════════════════════════════════════════════════════════════════

/// One coalesced mutation, the unit of information exposed to the
/// persistence/logging collaborator.
///
/// For a removal the snapshot holds the demo's last known vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateRecord<const S: usize, const D: usize> {
    pub event:       FieldEvent,
    pub source:      SourceVec<S>,
    pub destination: DestVec<D>,
    /// Logical time of the latest mutation folded into this record.
    pub at:          u64,
}

// ════════════════════════════════════════════════════════════════════════════
// UpdateLog
// ════════════════════════════════════════════════════════════════════════════

/// Coalescing buffer between field mutations and the outside world.
#[derive(Clone, Debug, Default)]
pub struct UpdateLog<const S: usize, const D: usize> {
    pending: Option<UpdateRecord<S, D>>,
    /// Time the current pending record was opened; bounds how long a
    /// run of same-demo mutations can keep coalescing.
    started: u64,
    outbox:  Vec<UpdateRecord<S, D>>,
}

impl<const S: usize, const D: usize> UpdateLog<S, D> {
    pub fn new() -> Self {
        UpdateLog { pending: None, started: 0, outbox: Vec::new() }
    }

    /// Fold a mutation into the log at logical time `now`.
    ///
    /// Same demo, window still open → the pending snapshot is
    /// overwritten in place.  Different demo, or window expired → the
    /// pending record is flushed first and a new window opens.
    pub fn record(
        &mut self,
        event: FieldEvent,
        source: SourceVec<S>,
        destination: DestVec<D>,
        now: u64,
    ) {
        let must_flush = self
            .pending
            .as_ref()
            .is_some_and(|p| p.event.id() != event.id() || self.window_expired(now));
        if must_flush {
            self.flush();
        }
        if self.pending.is_none() {
            self.started = now;
        }
        self.pending = Some(UpdateRecord { event, source, destination, at: now });
    }

    /// Flush the pending record if its window has expired.  Called on
    /// every clock advance.
    pub fn expire(&mut self, now: u64) {
        if self.pending.is_some() && self.window_expired(now) {
            self.flush();
        }
    }

    /// Force the pending record out regardless of the window (used
    /// before saving, so nothing is silently in flight).
    pub fn flush(&mut self) {
        if let Some(record) = self.pending.take() {
            debug!(
                event = record.event.tag(),
                id = %record.event.id(),
                at = record.at,
                "update record flushed"
            );
            self.outbox.push(record);
        }
    }

    /// Take every flushed record, oldest first.
    pub fn drain(&mut self) -> Vec<UpdateRecord<S, D>> {
        std::mem::take(&mut self.outbox)
    }

    /// The record currently coalescing, if any.
    pub fn pending(&self) -> Option<&UpdateRecord<S, D>> {
        self.pending.as_ref()
    }

    /// Flushed records waiting to be drained.
    pub fn outbox_len(&self) -> usize {
        self.outbox.len()
    }

    fn window_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.started) >= DEBOUNCE_WINDOW
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use demo_field::DemoField;

    type Log = UpdateLog<2, 3>;

    fn two_ids() -> (demo_field::DemoId, demo_field::DemoId) {
        let mut f: DemoField<2, 3> = DemoField::new();
        let a = f.insert(SourceVec::zeros(), DestVec::zeros());
        let b = f.insert(SourceVec::zeros(), DestVec::zeros());
        (a, b)
    }

    fn src(x: f64) -> SourceVec<2> { SourceVec::from([x, 0.0]) }

    // ── coalescing ───────────────────────────────────────────────────────
    #[test]
    fn same_demo_within_window_coalesces_latest_wins() {
        let (a, _) = two_ids();
        let mut log = Log::new();
        log.record(FieldEvent::SourceChanged(a), src(1.0), DestVec::zeros(), 0);
        log.record(FieldEvent::SourceChanged(a), src(2.0), DestVec::zeros(), 10);
        assert_eq!(log.outbox_len(), 0);

        log.flush();
        let records = log.drain();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, src(2.0));
        assert_eq!(records[0].at, 10);
    }

    #[test]
    fn different_demo_forces_immediate_flush() {
        let (a, b) = two_ids();
        let mut log = Log::new();
        log.record(FieldEvent::SourceChanged(a), src(1.0), DestVec::zeros(), 0);
        log.record(FieldEvent::SourceChanged(b), src(9.0), DestVec::zeros(), 10);

        let records = log.drain();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, FieldEvent::SourceChanged(a));
        assert_eq!(records[0].source, src(1.0));
        // b is still coalescing
        assert_eq!(log.pending().map(|p| p.event.id()), Some(b));
    }

    #[test]
    fn latest_kind_wins_within_a_window() {
        let (a, _) = two_ids();
        let mut log = Log::new();
        log.record(FieldEvent::SourceChanged(a), src(1.0), DestVec::zeros(), 0);
        log.record(FieldEvent::DestinationChanged(a), src(1.0), DestVec::from([7.0, 0.0, 0.0]), 5);
        log.flush();
        let records = log.drain();
        assert_eq!(records[0].event, FieldEvent::DestinationChanged(a));
        assert_eq!(records[0].destination, DestVec::from([7.0, 0.0, 0.0]));
    }

    // ── window expiry ────────────────────────────────────────────────────
    #[test]
    fn expire_flushes_after_the_window() {
        let (a, _) = two_ids();
        let mut log = Log::new();
        log.record(FieldEvent::SourceChanged(a), src(1.0), DestVec::zeros(), 0);

        log.expire(499);
        assert_eq!(log.outbox_len(), 0);
        log.expire(500);
        assert_eq!(log.outbox_len(), 1);
        assert!(log.pending().is_none());
    }

    #[test]
    fn stale_window_flushes_before_accepting_same_demo() {
        let (a, _) = two_ids();
        let mut log = Log::new();
        log.record(FieldEvent::SourceChanged(a), src(1.0), DestVec::zeros(), 0);
        log.record(FieldEvent::SourceChanged(a), src(2.0), DestVec::zeros(), 600);

        let records = log.drain();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, src(1.0));
        assert_eq!(log.pending().map(|p| p.source), Some(src(2.0)));
    }

    // ── drains and flushes ───────────────────────────────────────────────
    #[test]
    fn drain_empties_the_outbox() {
        let (a, b) = two_ids();
        let mut log = Log::new();
        log.record(FieldEvent::Inserted(a), src(0.0), DestVec::zeros(), 0);
        log.record(FieldEvent::Inserted(b), src(1.0), DestVec::zeros(), 1);
        log.flush();

        assert_eq!(log.drain().len(), 2);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn flush_on_empty_log_is_a_no_op() {
        let mut log = Log::new();
        log.flush();
        assert!(log.drain().is_empty());
    }
}
