//! # demo_field
//!
//! The owned set of user-authored *demonstrations*: pairs of a
//! low-dimensional gesture point (**source**, length `S`) and a
//! higher-dimensional synthesis-parameter vector (**destination**,
//! length `D`).  The field is the single source of truth; every other
//! component reads it through [`DemoField::iter`] or derives artifacts
//! from it.
//!
//! Ids are generational: removing a demonstration bumps its slot's
//! generation, so a stale [`DemoId`] can never silently address a demo
//! that later reused the slot — it fails with [`FieldError::NotFound`].
//!
//! ## Quick start
//!
//! ```rust
//! use demo_field::{DemoField, SourceVec, DestVec};
//!
//! let mut field: DemoField<2, 3> = DemoField::new();
//! let a = field.insert(SourceVec::from([0.0, 0.0]), DestVec::from([1.0, 0.0, 0.0]));
//! let b = field.insert(SourceVec::from([1.0, 0.0]), DestVec::from([0.0, 1.0, 0.0]));
//!
//! field.update_source(b, SourceVec::from([2.0, 0.0])).unwrap();
//! assert_eq!(field.len(), 2);
//!
//! field.remove(a).unwrap();
//! assert!(field.get(a).is_none());           // id died with the demo
//! assert!(field.remove(a).is_err());         // and stays dead
//! ```

use thiserror::Error;

pub mod persist;

/// Scalar type used across the whole mapping core.
pub type Scalar = f64;

/// A gesture-space point of fixed dimension `S`.
pub type SourceVec<const S: usize> = nalgebra::SVector<Scalar, S>;

/// A parameter-space vector of fixed dimension `D`.
pub type DestVec<const D: usize> = nalgebra::SVector<Scalar, D>;

// ════════════════════════════════════════════════════════════════════════════
// DemoId — generational identity
// ════════════════════════════════════════════════════════════════════════════

/// Stable opaque identity of a demonstration.
///
/// Embeds both the slot index and the slot's generation at insertion
/// time.  Removing the demo increments the slot generation, so an id
/// held across a remove (and a possible slot reuse) resolves to
/// nothing rather than to the wrong demo.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DemoId {
    slot:       u32,
    generation: u32,
}

impl std::fmt::Display for DemoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}.{}", self.slot, self.generation)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Demo — one demonstration
// ════════════════════════════════════════════════════════════════════════════

/// A recorded (source, destination) pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Demo<const S: usize, const D: usize> {
    pub id:          DemoId,
    pub source:      SourceVec<S>,
    pub destination: DestVec<D>,
}

// ════════════════════════════════════════════════════════════════════════════
// FieldEvent — mutation taxonomy
// ════════════════════════════════════════════════════════════════════════════

/// What a mutating operation did to the field.
///
/// The owning session passes these, synchronously and in order, to the
/// recompute dispatch; there is no implicit observer registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldEvent {
    Inserted(DemoId),
    Removed(DemoId),
    SourceChanged(DemoId),
    DestinationChanged(DemoId),
}

impl FieldEvent {
    /// The demo the event concerns.
    pub fn id(&self) -> DemoId {
        match *self {
            FieldEvent::Inserted(id)
            | FieldEvent::Removed(id)
            | FieldEvent::SourceChanged(id)
            | FieldEvent::DestinationChanged(id) => id,
        }
    }

    /// True when the event invalidates source-space derivations
    /// (source PCA basis, neighbor radii).
    pub fn reshapes_source(&self) -> bool {
        !matches!(self, FieldEvent::DestinationChanged(_))
    }

    /// True when the event invalidates destination-space derivations.
    pub fn reshapes_destination(&self) -> bool {
        !matches!(self, FieldEvent::SourceChanged(_))
    }

    /// Short tag for logs and the update record format.
    pub fn tag(&self) -> &'static str {
        match self {
            FieldEvent::Inserted(_)           => "insert",
            FieldEvent::Removed(_)            => "remove",
            FieldEvent::SourceChanged(_)      => "source",
            FieldEvent::DestinationChanged(_) => "destination",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FieldError
// ════════════════════════════════════════════════════════════════════════════

/// Errors surfaced by field and session operations.  None are fatal.
#[derive(Error, Debug)]
pub enum FieldError {
    /// The id is unknown or was removed (possibly a stale generation).
    #[error("no demonstration with id {0}")]
    NotFound(DemoId),

    /// A line of the save format could not be parsed.
    #[error("save format, line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Only produced by the file convenience wrappers in [`persist`].
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for field operations.
pub type Result<T> = std::result::Result<T, FieldError>;

// ════════════════════════════════════════════════════════════════════════════
// DemoField — the store
// ════════════════════════════════════════════════════════════════════════════

/// Slot in the arena.  `demo` is `None` while the slot sits on the
/// free list; `generation` counts how many times the slot was freed.
#[derive(Clone, Debug)]
struct Slot<const S: usize, const D: usize> {
    generation: u32,
    demo:       Option<Demo<S, D>>,
}

/// The demonstration store.
///
/// * Insertion order is preserved and is the iteration order, even
///   across slot reuse.
/// * All id-taking operations fail with [`FieldError::NotFound`] for
///   unknown or removed ids; [`DemoField::insert`] always succeeds.
/// * The store itself performs no recompute dispatch; the owning
///   session calls the scheduler with the matching [`FieldEvent`]
///   immediately after each mutation.
#[derive(Clone, Debug, Default)]
pub struct DemoField<const S: usize, const D: usize> {
    slots: Vec<Slot<S, D>>,
    free:  Vec<u32>,
    /// Ids in insertion order; the iteration contract lives here.
    order: Vec<DemoId>,
}

impl<const S: usize, const D: usize> DemoField<S, D> {
    pub fn new() -> Self {
        DemoField { slots: Vec::new(), free: Vec::new(), order: Vec::new() }
    }

    /// Number of live demonstrations.
    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    /// Add a demonstration.  Always succeeds; returns its fresh id.
    pub fn insert(&mut self, source: SourceVec<S>, destination: DestVec<D>) -> DemoId {
        let id = match self.free.pop() {
            Some(slot) => {
                let generation = self.slots[slot as usize].generation;
                DemoId { slot, generation }
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot { generation: 0, demo: None });
                DemoId { slot, generation: 0 }
            }
        };
        self.slots[id.slot as usize].demo = Some(Demo { id, source, destination });
        self.order.push(id);
        id
    }

    /// Look up a live demonstration.  Stale generations miss.
    pub fn get(&self, id: DemoId) -> Option<&Demo<S, D>> {
        self.slots
            .get(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.demo.as_ref())
    }

    pub fn contains(&self, id: DemoId) -> bool {
        self.get(id).is_some()
    }

    /// Replace the gesture point of `id`.
    pub fn update_source(&mut self, id: DemoId, source: SourceVec<S>) -> Result<()> {
        let demo = self.get_mut(id)?;
        demo.source = source;
        Ok(())
    }

    /// Replace the parameter vector of `id`.
    pub fn update_destination(&mut self, id: DemoId, destination: DestVec<D>) -> Result<()> {
        let demo = self.get_mut(id)?;
        demo.destination = destination;
        Ok(())
    }

    /// Remove a demonstration.  The id is invalid from here on: the
    /// slot's generation is bumped before it returns to the free list.
    pub fn remove(&mut self, id: DemoId) -> Result<Demo<S, D>> {
        if !self.contains(id) {
            return Err(FieldError::NotFound(id));
        }
        let slot = &mut self.slots[id.slot as usize];
        let demo = slot.demo.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.order.retain(|o| *o != id);
        demo.ok_or(FieldError::NotFound(id))
    }

    /// Iterate live demonstrations in insertion order.  Finite and
    /// restartable: call again for a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = &Demo<S, D>> + '_ {
        self.order.iter().filter_map(move |id| self.get(*id))
    }

    /// Ids in insertion order.
    pub fn ids(&self) -> &[DemoId] { &self.order }

    fn get_mut(&mut self, id: DemoId) -> Result<&mut Demo<S, D>> {
        self.slots
            .get_mut(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.demo.as_mut())
            .ok_or(FieldError::NotFound(id))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn field_abc() -> (DemoField<2, 3>, DemoId, DemoId, DemoId) {
        let mut f = DemoField::new();
        let a = f.insert(SourceVec::from([0.0, 0.0]), DestVec::from([1.0, 0.0, 0.0]));
        let b = f.insert(SourceVec::from([1.0, 0.0]), DestVec::from([0.0, 1.0, 0.0]));
        let c = f.insert(SourceVec::from([0.0, 1.0]), DestVec::from([0.0, 0.0, 1.0]));
        (f, a, b, c)
    }

    // ── insert / get ─────────────────────────────────────────────────────
    #[test]
    fn insert_then_get() {
        let (f, a, _, _) = field_abc();
        let demo = f.get(a).unwrap();
        assert_eq!(demo.source, SourceVec::from([0.0, 0.0]));
        assert_eq!(demo.destination, DestVec::from([1.0, 0.0, 0.0]));
        assert_eq!(demo.id, a);
    }

    #[test]
    fn ids_are_distinct() {
        let (_, a, b, c) = field_abc();
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn len_tracks_inserts_and_removes() {
        let (mut f, a, _, _) = field_abc();
        assert_eq!(f.len(), 3);
        f.remove(a).unwrap();
        assert_eq!(f.len(), 2);
        assert!(!f.is_empty());
    }

    // ── updates ──────────────────────────────────────────────────────────
    #[test]
    fn update_source_replaces_vector() {
        let (mut f, a, _, _) = field_abc();
        f.update_source(a, SourceVec::from([5.0, 5.0])).unwrap();
        assert_eq!(f.get(a).unwrap().source, SourceVec::from([5.0, 5.0]));
        // destination untouched
        assert_eq!(f.get(a).unwrap().destination, DestVec::from([1.0, 0.0, 0.0]));
    }

    #[test]
    fn update_destination_replaces_vector() {
        let (mut f, _, b, _) = field_abc();
        f.update_destination(b, DestVec::from([0.5, 0.5, 0.5])).unwrap();
        assert_eq!(f.get(b).unwrap().destination, DestVec::from([0.5, 0.5, 0.5]));
    }

    #[test]
    fn update_unknown_id_fails() {
        let (mut f, a, _, _) = field_abc();
        f.remove(a).unwrap();
        let err = f.update_source(a, SourceVec::zeros()).unwrap_err();
        assert!(matches!(err, FieldError::NotFound(_)));
    }

    // ── remove / generation safety ───────────────────────────────────────
    #[test]
    fn remove_invalidates_id_immediately() {
        let (mut f, a, _, _) = field_abc();
        f.remove(a).unwrap();
        assert!(f.get(a).is_none());
        assert!(matches!(f.remove(a), Err(FieldError::NotFound(_))));
    }

    #[test]
    fn reused_slot_does_not_resurrect_stale_id() {
        let (mut f, a, _, _) = field_abc();
        f.remove(a).unwrap();
        // New insert reuses slot 0 with a bumped generation.
        let fresh = f.insert(SourceVec::from([9.0, 9.0]), DestVec::from([9.0, 9.0, 9.0]));
        assert!(f.get(fresh).is_some());
        assert!(f.get(a).is_none());
        assert!(f.update_destination(a, DestVec::zeros()).is_err());
    }

    // ── iteration order ──────────────────────────────────────────────────
    #[test]
    fn iter_is_insertion_ordered() {
        let (f, a, b, c) = field_abc();
        let ids: Vec<DemoId> = f.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn iter_order_survives_slot_reuse() {
        let (mut f, a, b, c) = field_abc();
        f.remove(b).unwrap();
        let d = f.insert(SourceVec::from([4.0, 4.0]), DestVec::zeros());
        let ids: Vec<DemoId> = f.iter().map(|x| x.id).collect();
        // d reuses b's slot but still iterates last.
        assert_eq!(ids, vec![a, c, d]);
    }

    #[test]
    fn iter_is_restartable() {
        let (f, _, _, _) = field_abc();
        assert_eq!(f.iter().count(), 3);
        assert_eq!(f.iter().count(), 3);
    }

    // ── events ───────────────────────────────────────────────────────────
    #[test]
    fn event_staleness_classification() {
        let (_, a, _, _) = field_abc();
        assert!(FieldEvent::Inserted(a).reshapes_source());
        assert!(FieldEvent::Inserted(a).reshapes_destination());
        assert!(FieldEvent::Removed(a).reshapes_source());
        assert!(FieldEvent::Removed(a).reshapes_destination());
        assert!(FieldEvent::SourceChanged(a).reshapes_source());
        assert!(!FieldEvent::SourceChanged(a).reshapes_destination());
        assert!(!FieldEvent::DestinationChanged(a).reshapes_source());
        assert!(FieldEvent::DestinationChanged(a).reshapes_destination());
    }
}
