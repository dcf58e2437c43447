//! The owned mapping session.
//!
//! [`MapSession`] is the explicit session value collaborators pass
//! around: it exclusively owns the demonstration
//! field and every artifact derived from it (projection lenses,
//! neighbor-radii cache, update log), and keeps them consistent by
//! dispatching synchronously on each mutation.  No ambient global
//! state, no observer registry.

use demo_field::{persist, DemoField, DemoId, DestVec, FieldError, FieldEvent, Result, Scalar, SourceVec};
use field_lens::{LensBasis, Projected};
use sphere_blend::{blend, neighbor_radii, Blend, Strategy};
use std::path::Path;
use tracing::{debug, trace};

use crate::schedule::{UpdateLog, UpdateRecord};

// ════════════════════════════════════════════════════════════════════════════
// MapSession
// ════════════════════════════════════════════════════════════════════════════

/// One live mapping session over gesture space `S` and parameter
/// space `D`.
///
/// Recompute dispatch table, applied synchronously on every mutation
/// (never debounced):
///
/// | Event | Source lens | Destination lens | Radii cache |
/// |---|---|---|---|
/// | Inserted / Removed | refit | refit | invalidate |
/// | SourceChanged | refit | — | invalidate |
/// | DestinationChanged | — | refit | — |
///
/// The neighbor-radii cache is refilled lazily on the next
/// [`MapSession::query`], so a burst of edits costs one O(N²) pass,
/// not one per edit.
#[derive(Clone, Debug, Default)]
pub struct MapSession<const S: usize, const D: usize> {
    field:            DemoField<S, D>,
    source_lens:      LensBasis<S, 2>,
    destination_lens: LensBasis<D, 3>,
    radii:            Vec<Scalar>,
    radii_stale:      bool,
    log:              UpdateLog<S, D>,
    strategy:         Strategy,
    now:              u64,
}

/// The observed live configuration: 2-D gesture space driving six
/// synthesis parameters.
pub type GestureSession = MapSession<2, 6>;

impl<const S: usize, const D: usize> MapSession<S, D> {
    pub fn new() -> Self {
        Self::with_strategy(Strategy::default())
    }

    pub fn with_strategy(strategy: Strategy) -> Self {
        MapSession {
            field:            DemoField::new(),
            source_lens:      LensBasis::identity(),
            destination_lens: LensBasis::identity(),
            radii:            Vec::new(),
            radii_stale:      false,
            log:              UpdateLog::new(),
            strategy,
            now:              0,
        }
    }

    // ── clock ────────────────────────────────────────────────────────────

    /// Current logical time.
    pub fn now(&self) -> u64 { self.now }

    /// Advance the logical clock (one call per external tick) and let
    /// the update log expire a stale pending record.
    pub fn advance(&mut self, dt: u64) {
        self.now += dt;
        self.log.expire(self.now);
    }

    // ── mutations ────────────────────────────────────────────────────────

    /// Record a new demonstration.
    pub fn insert(&mut self, source: SourceVec<S>, destination: DestVec<D>) -> DemoId {
        let id = self.field.insert(source, destination);
        self.dispatch(FieldEvent::Inserted(id), source, destination);
        id
    }

    /// Move a demonstration's gesture point.
    pub fn update_source(&mut self, id: DemoId, source: SourceVec<S>) -> Result<()> {
        self.field.update_source(id, source)?;
        let destination = self.field.get(id).map(|d| d.destination).unwrap_or_else(DestVec::zeros);
        self.dispatch(FieldEvent::SourceChanged(id), source, destination);
        Ok(())
    }

    /// Replace a demonstration's parameter vector.
    pub fn update_destination(&mut self, id: DemoId, destination: DestVec<D>) -> Result<()> {
        self.field.update_destination(id, destination)?;
        let source = self.field.get(id).map(|d| d.source).unwrap_or_else(SourceVec::zeros);
        self.dispatch(FieldEvent::DestinationChanged(id), source, destination);
        Ok(())
    }

    /// Remove a demonstration; its id is invalid from here on.
    pub fn remove(&mut self, id: DemoId) -> Result<()> {
        let demo = self.field.remove(id)?;
        self.dispatch(FieldEvent::Removed(id), demo.source, demo.destination);
        Ok(())
    }

    fn dispatch(&mut self, event: FieldEvent, source: SourceVec<S>, destination: DestVec<D>) {
        trace!(event = event.tag(), id = %event.id(), "dispatch");

        if event.reshapes_source() {
            let rows: Vec<SourceVec<S>> = self.field.iter().map(|d| d.source).collect();
            self.source_lens = LensBasis::fit(&rows);
            self.radii_stale = true;
        }
        if event.reshapes_destination() {
            let rows: Vec<DestVec<D>> = self.field.iter().map(|d| d.destination).collect();
            self.destination_lens = LensBasis::fit(&rows);
        }
        self.log.record(event, source, destination, self.now);
    }

    // ── queries ──────────────────────────────────────────────────────────

    /// Estimate the parameter vector at gesture point `q`, with
    /// per-demo weight diagnostics.
    ///
    /// Takes `&mut self` because the neighbor-radii cache may need a
    /// refill after source edits; the session model is strictly
    /// serialized, so this costs nothing.
    pub fn query(&mut self, q: &SourceVec<S>) -> Blend<D> {
        if self.radii_stale || self.radii.len() != self.field.len() {
            debug!(demos = self.field.len(), "refreshing neighbor radii");
            self.radii = neighbor_radii(&self.field);
            self.radii_stale = false;
        }
        blend(q, &self.field, &self.radii, &self.strategy)
    }

    /// A demonstration's position in the 2-D source editing view.
    pub fn project_source(&self, id: DemoId) -> Result<Projected<2>> {
        let demo = self.field.get(id).ok_or(FieldError::NotFound(id))?;
        Ok(self.source_lens.project(&demo.source))
    }

    /// A demonstration's position in the reduced destination view
    /// (mapped onward to a perceptual color space by the caller).
    pub fn project_destination(&self, id: DemoId) -> Result<Projected<3>> {
        let demo = self.field.get(id).ok_or(FieldError::NotFound(id))?;
        Ok(self.destination_lens.project(&demo.destination))
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn field(&self) -> &DemoField<S, D> { &self.field }
    pub fn len(&self) -> usize { self.field.len() }
    pub fn is_empty(&self) -> bool { self.field.is_empty() }
    pub fn source_lens(&self) -> &LensBasis<S, 2> { &self.source_lens }
    pub fn destination_lens(&self) -> &LensBasis<D, 3> { &self.destination_lens }
    pub fn strategy(&self) -> &Strategy { &self.strategy }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    /// One-line summary for status displays.
    pub fn status(&self) -> String {
        format!(
            "{} demos · {} · t={} · {} update(s) flushed, pending: {}",
            self.field.len(),
            self.strategy.name(),
            self.now,
            self.log.outbox_len(),
            if self.log.pending().is_some() { "yes" } else { "no" },
        )
    }

    // ── update log ───────────────────────────────────────────────────────

    /// Take every flushed update record, oldest first.
    pub fn drain_updates(&mut self) -> Vec<UpdateRecord<S, D>> {
        self.log.drain()
    }

    /// Force the coalescing record out of the log (used before save,
    /// so nothing is silently in flight).
    pub fn flush_updates(&mut self) {
        self.log.flush();
    }

    // ── persistence ──────────────────────────────────────────────────────

    /// Encode the field in the line-based save format.
    pub fn save(&self) -> String {
        persist::save(&self.field)
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        persist::save_file(&self.field, path)
    }

    /// Rebuild a session from saved text: each line is replayed as an
    /// insert in file order (ids are reassigned), then both lenses are
    /// fitted once.  The update log starts clean — loading is not an
    /// edit session.
    pub fn load(text: &str) -> Result<Self> {
        let field: DemoField<S, D> = persist::parse(text)?;
        Ok(Self::from_field(field))
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let field: DemoField<S, D> = persist::load_file(path)?;
        Ok(Self::from_field(field))
    }

    fn from_field(field: DemoField<S, D>) -> Self {
        let sources: Vec<SourceVec<S>> = field.iter().map(|d| d.source).collect();
        let destinations: Vec<DestVec<D>> = field.iter().map(|d| d.destination).collect();
        MapSession {
            source_lens:      LensBasis::fit(&sources),
            destination_lens: LensBasis::fit(&destinations),
            radii:            neighbor_radii(&field),
            radii_stale:      false,
            field,
            log:              UpdateLog::new(),
            strategy:         Strategy::default(),
            now:              0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use sphere_blend::BlendKind;

    fn corners() -> (MapSession<2, 3>, DemoId, DemoId, DemoId) {
        let mut s = MapSession::new();
        let a = s.insert(SourceVec::from([0.0, 0.0]), DestVec::from([1.0, 0.0, 0.0]));
        let b = s.insert(SourceVec::from([1.0, 0.0]), DestVec::from([0.0, 1.0, 0.0]));
        let c = s.insert(SourceVec::from([0.0, 1.0]), DestVec::from([0.0, 0.0, 1.0]));
        (s, a, b, c)
    }

    // ── query through the session ────────────────────────────────────────
    #[test]
    fn exact_recall_via_session() {
        let (mut s, _, b, _) = corners();
        let out = s.query(&SourceVec::from([1.0, 0.0]));
        assert_eq!(out.kind, BlendKind::Exact);
        assert_eq!(out.estimate, DestVec::from([0.0, 1.0, 0.0]));
        let w = out.weights.iter().find(|w| w.id == b).unwrap();
        assert_eq!(w.weight, 1.0);
    }

    #[test]
    fn empty_session_query_is_the_defined_fallback() {
        let mut s: MapSession<2, 3> = MapSession::new();
        let out = s.query(&SourceVec::from([0.5, 0.5]));
        assert_eq!(out.kind, BlendKind::Empty);
        assert_eq!(out.estimate, DestVec::<3>::zeros());
    }

    // ── radii cache invalidation ─────────────────────────────────────────
    #[test]
    fn moving_a_demo_is_visible_to_the_next_query() {
        let (mut s, a, _, _) = corners();
        // Warm the cache.
        let _ = s.query(&SourceVec::from([0.5, 0.5]));

        s.update_source(a, SourceVec::from([5.0, 5.0])).unwrap();
        let out = s.query(&SourceVec::from([5.0, 5.0]));
        assert_eq!(out.kind, BlendKind::Exact);
        assert_eq!(out.estimate, DestVec::from([1.0, 0.0, 0.0]));
    }

    #[test]
    fn removing_a_demo_is_visible_to_the_next_query() {
        let (mut s, a, _, _) = corners();
        let _ = s.query(&SourceVec::from([0.0, 0.0]));
        s.remove(a).unwrap();
        let out = s.query(&SourceVec::from([0.0, 0.0]));
        // The removed corner no longer answers exactly.
        assert_ne!(out.estimate, DestVec::from([1.0, 0.0, 0.0]));
        assert_eq!(out.weights.len(), 2);
    }

    // ── lens dispatch table ──────────────────────────────────────────────
    #[test]
    fn destination_edit_leaves_the_source_lens_alone() {
        let (mut s, a, _, _) = corners();
        let before = s.source_lens().clone();
        let dest_before = s.destination_lens().clone();
        s.update_destination(a, DestVec::from([0.5, 0.5, 0.5])).unwrap();
        assert_eq!(s.source_lens(), &before);
        assert_ne!(s.destination_lens(), &dest_before);
    }

    #[test]
    fn source_edit_leaves_the_destination_lens_alone() {
        let (mut s, a, _, _) = corners();
        let before = s.destination_lens().clone();
        let src_before = s.source_lens().clone();
        s.update_source(a, SourceVec::from([0.4, 0.4])).unwrap();
        assert_eq!(s.destination_lens(), &before);
        assert_ne!(s.source_lens(), &src_before);
    }

    #[test]
    fn lenses_stay_identity_below_three_demos() {
        let mut s: MapSession<2, 3> = MapSession::new();
        s.insert(SourceVec::from([3.0, 3.0]), DestVec::from([1.0, 2.0, 3.0]));
        s.insert(SourceVec::from([4.0, 4.0]), DestVec::from([4.0, 5.0, 6.0]));
        assert_eq!(s.source_lens(), &LensBasis::identity());
        assert_eq!(s.destination_lens(), &LensBasis::identity());
    }

    #[test]
    fn dropping_below_three_resets_the_lenses() {
        let (mut s, a, _, _) = corners();
        assert_ne!(s.source_lens(), &LensBasis::identity());
        s.remove(a).unwrap();
        assert_eq!(s.source_lens(), &LensBasis::identity());
        assert_eq!(s.destination_lens(), &LensBasis::identity());
    }

    // ── projections ──────────────────────────────────────────────────────
    #[test]
    fn project_source_fails_for_removed_id() {
        let (mut s, a, _, _) = corners();
        s.remove(a).unwrap();
        assert!(matches!(s.project_source(a), Err(FieldError::NotFound(_))));
        assert!(matches!(s.project_destination(a), Err(FieldError::NotFound(_))));
    }

    #[test]
    fn projections_are_available_for_live_demos() {
        let (s, a, _, _) = corners();
        assert!(s.project_source(a).is_ok());
        assert!(s.project_destination(a).is_ok());
    }

    // ── debounced update log ─────────────────────────────────────────────
    #[test]
    fn same_demo_edits_coalesce_into_one_record() {
        let (mut s, a, _, _) = corners();
        s.flush_updates();
        s.drain_updates(); // discard the insert records

        s.update_source(a, SourceVec::from([0.1, 0.1])).unwrap();
        s.advance(10);
        s.update_source(a, SourceVec::from([0.2, 0.2])).unwrap();
        s.flush_updates();

        let records = s.drain_updates();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, SourceVec::from([0.2, 0.2]));
        assert_eq!(records[0].event, FieldEvent::SourceChanged(a));
    }

    #[test]
    fn edit_of_another_demo_flushes_the_first() {
        let (mut s, a, b, _) = corners();
        s.flush_updates();
        s.drain_updates();

        s.update_source(a, SourceVec::from([0.1, 0.1])).unwrap();
        s.advance(10);
        s.update_source(b, SourceVec::from([0.9, 0.9])).unwrap();

        let records = s.drain_updates();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event, FieldEvent::SourceChanged(a));
    }

    #[test]
    fn window_expiry_surfaces_the_pending_record() {
        let (mut s, a, _, _) = corners();
        s.flush_updates();
        s.drain_updates();

        s.update_source(a, SourceVec::from([0.1, 0.1])).unwrap();
        s.advance(499);
        assert!(s.drain_updates().is_empty());
        s.advance(1);
        let records = s.drain_updates();
        assert_eq!(records.len(), 1);
    }

    // ── persistence ──────────────────────────────────────────────────────
    #[test]
    fn save_load_round_trips_the_pairs() {
        let (s, _, _, _) = corners();
        let reloaded: MapSession<2, 3> = MapSession::load(&s.save()).unwrap();
        assert_eq!(reloaded.len(), 3);
        for (x, y) in s.field().iter().zip(reloaded.field().iter()) {
            assert_eq!(x.source, y.source);
            assert_eq!(x.destination, y.destination);
        }
    }

    #[test]
    fn loaded_session_is_immediately_queryable() {
        let (s, _, _, _) = corners();
        let mut reloaded: MapSession<2, 3> = MapSession::load(&s.save()).unwrap();
        let out = reloaded.query(&SourceVec::from([0.0, 0.0]));
        assert_eq!(out.estimate, DestVec::from([1.0, 0.0, 0.0]));
    }

    #[test]
    fn loaded_session_starts_with_a_clean_log() {
        let (s, _, _, _) = corners();
        let mut reloaded: MapSession<2, 3> = MapSession::load(&s.save()).unwrap();
        assert!(reloaded.drain_updates().is_empty());
    }

    #[test]
    fn load_rejects_malformed_text() {
        assert!(MapSession::<2, 3>::load("s 0 0 d 1 2").is_err());
    }

    // ── misc ─────────────────────────────────────────────────────────────
    #[test]
    fn status_mentions_the_demo_count() {
        let (s, _, _, _) = corners();
        assert!(s.status().contains("3 demos"));
    }

    #[test]
    fn strategy_can_be_swapped_live() {
        let (mut s, _, _, _) = corners();
        let q = SourceVec::from([0.3, 0.3]);
        let spheres = s.query(&q);
        s.set_strategy(Strategy::InverseDistance(Default::default()));
        let idw = s.query(&q);
        // Both normalize; the mixes differ.
        assert_eq!(spheres.kind, BlendKind::Weighted);
        assert_eq!(idw.kind, BlendKind::Weighted);
        assert_ne!(spheres.estimate, idw.estimate);
    }
}
