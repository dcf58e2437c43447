//! Demonstrates lens fitting, the degenerate reset, and round trips.

use field_lens::{LensBasis, Projected};
use nalgebra::SVector;

fn main() {
    println!("\n=== field_lens Demo ===\n");

    // ── 1. Degenerate reset ──────────────────────────────────────────────
    println!("1. Fewer than 3 samples resets to the identity default");
    let sparse: Vec<SVector<f64, 3>> = vec![SVector::from([9.0, 9.0, 9.0])];
    let lens: LensBasis<3, 2> = LensBasis::fit(&sparse);
    println!("   mean = {:?}", lens.mean.as_slice());
    println!("   forward =\n{}", lens.forward);

    // ── 2. A real fit over tilted planar data ────────────────────────────
    println!("2. Fit over points scattered in a tilted plane");
    let rows: Vec<SVector<f64, 3>> = (0..12)
        .map(|i| {
            let t = i as f64 * 0.7;
            // plane spanned by (1,0,1)/√2 and (0,1,0), offset by (5,5,5)
            SVector::from([5.0 + t, 5.0 + (t * 1.3).sin(), 5.0 + t])
        })
        .collect();
    let lens: LensBasis<3, 2> = LensBasis::fit(&rows);
    println!("   mean    = {:?}", lens.mean.as_slice());
    println!("   forward =\n{}", lens.forward);

    // ── 3. Round trip ────────────────────────────────────────────────────
    println!("3. Project / unproject");
    let v = rows[7];
    let u: Projected<2> = lens.project(&v);
    let back = lens.unproject(&u);
    println!("   v    = {:?}", v.as_slice());
    println!("   u    = {:?}", u.as_slice());
    println!("   back = {:?}", back.as_slice());
    println!("   reconstruction error = {:.3e}\n", (back - v).norm());
}
