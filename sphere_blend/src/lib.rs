//! # sphere_blend
//!
//! Scattered-data interpolation over a [`DemoField`]: given a query
//! point in gesture space, estimate a destination-parameter vector as a
//! normalized weighted mix of the demonstrations, and report each
//! demo's influence for diagnostics.
//!
//! Two weighting strategies share one normalization contract, so
//! callers are strategy-agnostic:
//!
//! * [`Strategy::IntersectingSpheres`] — the primary strategy.  The
//!   query carries an influence circle whose radius is the distance to
//!   its nearest demo; each demo carries a neighbor circle whose radius
//!   is the distance to *its* nearest other demo.  A demo's raw weight
//!   is the area of the circle–circle intersection lens, normalized by
//!   the smaller circle's area.
//! * [`Strategy::InverseDistance`] — classic inverse-distance
//!   weighting with a configurable power and distance floor.
//!
//! ## Quick start
//!
//! ```rust
//! use demo_field::{DemoField, SourceVec, DestVec};
//! use sphere_blend::{blend, neighbor_radii, Strategy};
//!
//! let mut field: DemoField<2, 3> = DemoField::new();
//! field.insert(SourceVec::from([0.0, 0.0]), DestVec::from([1.0, 0.0, 0.0]));
//! field.insert(SourceVec::from([1.0, 0.0]), DestVec::from([0.0, 1.0, 0.0]));
//! field.insert(SourceVec::from([0.0, 1.0]), DestVec::from([0.0, 0.0, 1.0]));
//!
//! let radii = neighbor_radii(&field);
//! let out = blend(
//!     &SourceVec::from([0.3, 0.2]),
//!     &field,
//!     &radii,
//!     &Strategy::IntersectingSpheres,
//! );
//! let total: f64 = out.weights.iter().map(|w| w.weight).sum();
//! assert!((total - 1.0).abs() < 1e-9);
//! ```

use demo_field::{Demo, DemoField, DemoId, DestVec, Scalar, SourceVec};

/// Distance below which a query is treated as sitting exactly on a
/// demonstration (degenerate short-circuit).
pub const SLOP: Scalar = 5.0 * Scalar::EPSILON;

// ════════════════════════════════════════════════════════════════════════════
// Strategy
// ════════════════════════════════════════════════════════════════════════════

/// Inverse-distance weighting parameters.
///
/// `w = rescale / max(d − r_min, d_min)^power`
///
/// # Builder pattern
///
/// ```rust
/// use sphere_blend::InverseDistance;
///
/// let idw = InverseDistance::new().power(4.0).rescale(2.0);
/// assert_eq!(idw.power, 4.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InverseDistance {
    /// Exponent applied to the floored distance.
    pub power:   Scalar,
    /// Lower bound on the floored distance, keeps weights finite.
    pub d_min:   Scalar,
    /// Radius subtracted from every distance before flooring.
    pub r_min:   Scalar,
    /// Uniform scale on raw weights (cancels in normalization).
    pub rescale: Scalar,
}

impl InverseDistance {
    pub fn new() -> Self {
        InverseDistance {
            power:   8.0,
            d_min:   Scalar::EPSILON,
            r_min:   0.0,
            rescale: 1.0,
        }
    }

    pub fn power(mut self, power: Scalar) -> Self {
        self.power = power;
        self
    }

    pub fn d_min(mut self, d_min: Scalar) -> Self {
        self.d_min = d_min.max(Scalar::EPSILON);
        self
    }

    pub fn r_min(mut self, r_min: Scalar) -> Self {
        self.r_min = r_min.max(0.0);
        self
    }

    pub fn rescale(mut self, rescale: Scalar) -> Self {
        self.rescale = rescale;
        self
    }
}

impl Default for InverseDistance {
    fn default() -> Self { InverseDistance::new() }
}

/// Weighting strategy for [`blend`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Strategy {
    /// Circle–circle intersection areas (primary).
    IntersectingSpheres,
    /// Inverse-distance weighting (secondary, O(N) per query).
    InverseDistance(InverseDistance),
}

impl Strategy {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::IntersectingSpheres => "Intersecting Spheres",
            Strategy::InverseDistance(_)  => "Inverse Distance",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self { Strategy::IntersectingSpheres }
}

// ════════════════════════════════════════════════════════════════════════════
// Blend result
// ════════════════════════════════════════════════════════════════════════════

/// Per-demo influence diagnostics for one query.  Rebuilt on every
/// call, aligned with the field's iteration order, never shared
/// across queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DemoWeight {
    pub id:       DemoId,
    /// Distance from the query to this demo's source.
    pub distance: Scalar,
    /// This demo's neighbor radius (∞ for a lone demo).
    pub radius:   Scalar,
    /// Normalized weight; weights sum to 1 unless the blend fell back.
    pub weight:   Scalar,
}

/// How the estimate was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendKind {
    /// The query sat on a demonstration; its destination was returned
    /// exactly.
    Exact,
    /// A normalized weighted mix of two or more contributions.
    Weighted,
    /// Every raw weight was zero; the documented fallback (zero
    /// estimate, zero weights) was returned instead of dividing by
    /// zero.
    Uncovered,
    /// The field holds no demonstrations.
    Empty,
}

/// Result of one [`blend`] query.
#[derive(Clone, Debug)]
pub struct Blend<const D: usize> {
    pub estimate: DestVec<D>,
    pub weights:  Vec<DemoWeight>,
    pub kind:     BlendKind,
}

// ════════════════════════════════════════════════════════════════════════════
// Neighbor radii
// ════════════════════════════════════════════════════════════════════════════

/// Distance from each demo to its nearest *other* demo, in iteration
/// order.  O(N²); callers are expected to cache the result and
/// invalidate it when the field's sources change.
///
/// A lone demo has no neighbor; its radius is ∞, which downstream
/// collapses to `min(rₙ, dₙ) = dₙ` so the single demo covers the whole
/// space.  Coincident demos get radius 0.
pub fn neighbor_radii<const S: usize, const D: usize>(field: &DemoField<S, D>) -> Vec<Scalar> {
    let sources: Vec<SourceVec<S>> = field.iter().map(|demo| demo.source).collect();
    sources
        .iter()
        .enumerate()
        .map(|(i, a)| {
            sources
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, b)| (a - b).norm())
                .fold(Scalar::INFINITY, Scalar::min)
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// blend — the query entry point
// ════════════════════════════════════════════════════════════════════════════

/// Estimate the destination vector at `q`.
///
/// `radii` must be the neighbor radii for the field's current sources,
/// aligned with iteration order (see [`neighbor_radii`]).
///
/// Defined fallbacks instead of errors:
/// * empty field → zero estimate, no weights, [`BlendKind::Empty`];
/// * zero weight sum (only reachable when every usable neighbor radius
///   is zero, i.e. all demos coincide and the query sits elsewhere) →
///   zero estimate, zero weights, [`BlendKind::Uncovered`].
pub fn blend<const S: usize, const D: usize>(
    q: &SourceVec<S>,
    field: &DemoField<S, D>,
    radii: &[Scalar],
    strategy: &Strategy,
) -> Blend<D> {
    let demos: Vec<&Demo<S, D>> = field.iter().collect();
    if demos.is_empty() {
        return Blend { estimate: DestVec::zeros(), weights: Vec::new(), kind: BlendKind::Empty };
    }
    assert_eq!(radii.len(), demos.len(), "radii not aligned with field iteration order");

    let distances: Vec<Scalar> = demos.iter().map(|demo| (demo.source - q).norm()).collect();

    // Degenerate short-circuit: the query sits on a demonstration.
    // First in iteration order wins, which also settles the tie when
    // two demos coincide exactly.
    if let Some(hit) = distances.iter().position(|d| *d <= SLOP) {
        let weights = make_weights(&demos, &distances, radii, |i| {
            if i == hit { 1.0 } else { 0.0 }
        });
        return Blend { estimate: demos[hit].destination, weights, kind: BlendKind::Exact };
    }

    let raw: Vec<Scalar> = match strategy {
        Strategy::IntersectingSpheres => sphere_weights(&distances, radii),
        Strategy::InverseDistance(p)  => inverse_distance_weights(&distances, p),
    };

    let sum: Scalar = raw.iter().sum();
    if sum <= 0.0 {
        let weights = make_weights(&demos, &distances, radii, |_| 0.0);
        return Blend { estimate: DestVec::zeros(), weights, kind: BlendKind::Uncovered };
    }

    let mut estimate = DestVec::<D>::zeros();
    for (demo, w) in demos.iter().zip(&raw) {
        estimate += demo.destination * *w;
    }
    estimate /= sum;

    let weights = make_weights(&demos, &distances, radii, |i| raw[i] / sum);
    Blend { estimate, weights, kind: BlendKind::Weighted }
}

fn make_weights<const S: usize, const D: usize>(
    demos: &[&Demo<S, D>],
    distances: &[Scalar],
    radii: &[Scalar],
    weight_of: impl Fn(usize) -> Scalar,
) -> Vec<DemoWeight> {
    demos
        .iter()
        .enumerate()
        .map(|(i, demo)| DemoWeight {
            id:       demo.id,
            distance: distances[i],
            radius:   radii[i],
            weight:   weight_of(i),
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Intersecting spheres
// ════════════════════════════════════════════════════════════════════════════

fn sphere_weights(distances: &[Scalar], radii: &[Scalar]) -> Vec<Scalar> {
    // Query influence radius: distance to the nearest demo.
    let r_q = distances.iter().copied().fold(Scalar::INFINITY, Scalar::min);

    distances
        .iter()
        .zip(radii)
        .map(|(&d, &r_n)| {
            if r_q + r_n < d {
                // Influence circle and neighbor circle never touch.
                return 0.0;
            }
            let r = r_n.min(d);
            if r <= 0.0 {
                // Coincident twin: a zero-radius circle has no lens.
                return 0.0;
            }
            lens_area(d, r, r_q) / (std::f64::consts::PI * r * r)
        })
        .collect()
}

/// Area of the intersection lens of two circles with radii `r` and
/// `big_r`, centers `d` apart.  All arguments must be positive.
///
/// Floating-point excursions outside the acos domain are clamped and
/// a negative square-root operand contributes zero, so disjoint or
/// fully-contained configurations come out as 0 or the full smaller
/// circle rather than NaN.
fn lens_area(d: Scalar, r: Scalar, big_r: Scalar) -> Scalar {
    let a1 = ((d * d + r * r - big_r * big_r) / (2.0 * d * r)).clamp(-1.0, 1.0);
    let a2 = ((d * d + big_r * big_r - r * r) / (2.0 * d * big_r)).clamp(-1.0, 1.0);
    let k = (-d + r + big_r) * (d + r - big_r) * (d - r + big_r) * (d + r + big_r);
    let root = if k > 0.0 { k.sqrt() } else { 0.0 };
    r * r * a1.acos() + big_r * big_r * a2.acos() - 0.5 * root
}

// ════════════════════════════════════════════════════════════════════════════
// Inverse distance
// ════════════════════════════════════════════════════════════════════════════

fn inverse_distance_weights(distances: &[Scalar], p: &InverseDistance) -> Vec<Scalar> {
    distances
        .iter()
        .map(|&d| p.rescale / (d - p.r_min).max(p.d_min).powf(p.power))
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
