//! # field_session
//!
//! The integration layer of the mapping core: one owned [`MapSession`]
//! ties together the demonstration field, the interpolation strategy,
//! the two projection lenses, and the debounced update log.
//!
//! ## Collaborator surface
//!
//! | Collaborator | Calls |
//! |---|---|
//! | Editing UI | `insert` / `update_source` / `update_destination` / `remove` |
//! | Cursor → audio/control mapping | `query(q)` → estimate + per-demo weights |
//! | Visualization | `project_source(id)` (2-D view), `project_destination(id)` (color view) |
//! | Persistence / logging | `drain_updates()`, `save()` / `load()` |
//! | Frame loop | `advance(dt)` once per tick |
//!
//! Everything is synchronous and strictly serialized: mutations
//! dispatch their recomputes before returning, and only the
//! externally-visible update log is debounced.
//!
//! ## Quick start
//!
//! ```rust
//! use demo_field::{SourceVec, DestVec};
//! use field_session::MapSession;
//!
//! let mut session: MapSession<2, 3> = MapSession::new();
//! session.insert(SourceVec::from([0.0, 0.0]), DestVec::from([1.0, 0.0, 0.0]));
//! session.insert(SourceVec::from([1.0, 0.0]), DestVec::from([0.0, 1.0, 0.0]));
//! session.insert(SourceVec::from([0.0, 1.0]), DestVec::from([0.0, 0.0, 1.0]));
//!
//! let out = session.query(&SourceVec::from([0.2, 0.3]));
//! let total: f64 = out.weights.iter().map(|w| w.weight).sum();
//! assert!((total - 1.0).abs() < 1e-9);
//! ```

pub mod schedule;
pub mod session;

pub use schedule::{UpdateLog, UpdateRecord, DEBOUNCE_WINDOW};
pub use session::{GestureSession, MapSession};
