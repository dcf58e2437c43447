//! Scripted session walk-through: authoring, querying, editing, and
//! the debounced update log.

use demo_field::{DestVec, SourceVec};
use field_session::MapSession;
use sphere_blend::{InverseDistance, Strategy};

fn main() {
    println!("\n=== Mapping Session Demo ===\n");

    // ── 1. Author three demonstrations (S=2, D=3) ────────────────────────
    println!("1. Author three demonstrations");
    let mut session: MapSession<2, 3> = MapSession::new();
    let a = session.insert(SourceVec::from([0.0, 0.0]), DestVec::from([1.0, 0.0, 0.0]));
    let _b = session.insert(SourceVec::from([1.0, 0.0]), DestVec::from([0.0, 1.0, 0.0]));
    let _c = session.insert(SourceVec::from([0.0, 1.0]), DestVec::from([0.0, 0.0, 1.0]));
    println!("   {}\n", session.status());

    // ── 2. Sweep a cursor across the field ───────────────────────────────
    println!("2. Sweep a cursor from corner A toward corner B");
    for step in 0..=4 {
        let t = step as f64 / 4.0;
        let out = session.query(&SourceVec::from([t, 0.0]));
        println!(
            "   q=({:.2}, 0.00)  kind={:?}  estimate={:?}",
            t,
            out.kind,
            out.estimate.as_slice()
        );
    }
    println!();

    // ── 3. Drag a demonstration; the next query sees it ──────────────────
    println!("3. Drag demo {} in three quick steps (coalesced in the log)", a);
    session.update_source(a, SourceVec::from([0.1, 0.1])).unwrap();
    session.advance(10);
    session.update_source(a, SourceVec::from([0.2, 0.2])).unwrap();
    session.advance(10);
    session.update_source(a, SourceVec::from([0.3, 0.3])).unwrap();

    let out = session.query(&SourceVec::from([0.3, 0.3]));
    println!("   query at the new spot: kind={:?}\n", out.kind);

    // ── 4. The log kept one record for the whole drag ────────────────────
    println!("4. Update log after the drag (insert records + one drag record)");
    session.flush_updates();
    for r in session.drain_updates() {
        println!(
            "   t={:<4} {:<12} {}  s={:?}",
            r.at,
            r.event.tag(),
            r.event.id(),
            r.source.as_slice()
        );
    }
    println!();

    // ── 5. Strategy swap ─────────────────────────────────────────────────
    println!("5. Same query under inverse-distance weighting");
    session.set_strategy(Strategy::InverseDistance(InverseDistance::new().power(4.0)));
    let out = session.query(&SourceVec::from([0.5, 0.25]));
    println!("   estimate = {:?}\n", out.estimate.as_slice());

    // ── 6. Save and reload ───────────────────────────────────────────────
    println!("6. Save format round trip");
    let text = session.save();
    for line in text.lines() {
        println!("   {}", line);
    }
    let reloaded: MapSession<2, 3> = MapSession::load(&text).unwrap();
    println!("   reloaded {} demos\n", reloaded.len());
}
