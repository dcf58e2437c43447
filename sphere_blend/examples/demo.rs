//! Demonstrates the two weighting strategies and their diagnostics.

use demo_field::{DemoField, DestVec, SourceVec};
use sphere_blend::{blend, neighbor_radii, Blend, InverseDistance, Strategy};

fn show<const D: usize>(label: &str, out: &Blend<D>) {
    println!("   {}: kind={:?}", label, out.kind);
    println!("      estimate = {:?}", out.estimate.as_slice());
    for w in &out.weights {
        println!(
            "      {}  d={:.3}  r={:.3}  w={:.3}",
            w.id, w.distance, w.radius, w.weight
        );
    }
}

fn main() {
    println!("\n=== sphere_blend Strategy Demo ===\n");

    // Three demonstrations on the unit corners (S=2, D=3).
    let mut field: DemoField<2, 3> = DemoField::new();
    field.insert(SourceVec::from([0.0, 0.0]), DestVec::from([1.0, 0.0, 0.0]));
    field.insert(SourceVec::from([1.0, 0.0]), DestVec::from([0.0, 1.0, 0.0]));
    field.insert(SourceVec::from([0.0, 1.0]), DestVec::from([0.0, 0.0, 1.0]));
    let radii = neighbor_radii(&field);
    println!("neighbor radii: {:?}\n", radii);

    // ── 1. Exact hit ─────────────────────────────────────────────────────
    println!("1. Query on a demonstration");
    let q = SourceVec::from([0.0, 0.0]);
    show("spheres", &blend(&q, &field, &radii, &Strategy::IntersectingSpheres));
    println!();

    // ── 2. Interior blend, both strategies ───────────────────────────────
    println!("2. Interior query (0.3, 0.2)");
    let q = SourceVec::from([0.3, 0.2]);
    show("spheres", &blend(&q, &field, &radii, &Strategy::IntersectingSpheres));
    show(
        "idw p=8",
        &blend(&q, &field, &radii, &Strategy::InverseDistance(InverseDistance::new())),
    );
    println!();

    // ── 3. Softer inverse-distance falloff ───────────────────────────────
    println!("3. Same query with a gentler power");
    let soft = Strategy::InverseDistance(InverseDistance::new().power(2.0));
    show("idw p=2", &blend(&q, &field, &radii, &soft));
    println!();

    // ── 4. The documented fallback ───────────────────────────────────────
    println!("4. Coincident demos, query elsewhere → fallback");
    let mut twins: DemoField<2, 3> = DemoField::new();
    twins.insert(SourceVec::from([0.0, 0.0]), DestVec::from([1.0, 0.0, 0.0]));
    twins.insert(SourceVec::from([0.0, 0.0]), DestVec::from([0.0, 1.0, 0.0]));
    let tr = neighbor_radii(&twins);
    show("spheres", &blend(&SourceVec::from([1.0, 1.0]), &twins, &tr, &Strategy::IntersectingSpheres));
    println!();
}
