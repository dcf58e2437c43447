//! Demonstrates the field store: inserts, edits, generational ids,
//! and the line-based save format.

use demo_field::{persist, DemoField, DestVec, SourceVec};

fn main() {
    println!("\n=== DemoField Walk-through ===\n");

    // ── 1. Build a small field (S=2 gesture, D=6 parameters) ─────────────
    println!("1. Insert three demonstrations");
    let mut field: DemoField<2, 6> = DemoField::new();
    let a = field.insert(
        SourceVec::from([0.2, 0.2]),
        DestVec::from([0.9, 0.1, 0.0, 0.5, 0.5, 0.0]),
    );
    let b = field.insert(
        SourceVec::from([0.8, 0.3]),
        DestVec::from([0.1, 0.9, 0.2, 0.0, 0.7, 0.3]),
    );
    let c = field.insert(
        SourceVec::from([0.5, 0.9]),
        DestVec::from([0.0, 0.2, 0.9, 1.0, 0.0, 0.6]),
    );
    println!("   ids: {} {} {}   len={}\n", a, b, c, field.len());

    // ── 2. Edit a demonstration ──────────────────────────────────────────
    println!("2. Drag demo {} to a new gesture point", b);
    field.update_source(b, SourceVec::from([0.75, 0.35])).unwrap();
    println!("   source is now {:?}\n", field.get(b).unwrap().source.as_slice());

    // ── 3. Generational safety ───────────────────────────────────────────
    println!("3. Remove {}, then reuse its slot", a);
    field.remove(a).unwrap();
    let fresh = field.insert(SourceVec::from([0.1, 0.6]), DestVec::zeros());
    println!("   new id {} lives in the recycled slot", fresh);
    println!("   stale lookup: {:?}", field.get(a).map(|d| d.id));
    println!("   stale remove: {:?}\n", field.remove(a).err().map(|e| e.to_string()));

    // ── 4. Save format round trip ────────────────────────────────────────
    println!("4. Save format (one line per demo, insertion order)");
    let text = persist::save(&field);
    for line in text.lines() {
        println!("   {}", line);
    }
    let reloaded: DemoField<2, 6> = persist::parse(&text).unwrap();
    println!("   reloaded {} demos, ids reassigned from zero\n", reloaded.len());
}
