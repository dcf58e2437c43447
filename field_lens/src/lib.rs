//! # field_lens
//!
//! Linear "lenses" over the demonstration field: a [`LensBasis`] is a
//! mean plus an orthonormal forward/inverse projection pair reducing an
//! `N`-dimensional vector space to its top `R` principal directions.
//! One lens is fitted over gesture sources (for the 2-D editing view)
//! and an independent one over destinations (for the reduced
//! color-space view).
//!
//! With fewer than [`MIN_SAMPLES`] demonstrations a lens is *reset* to
//! the identity default — zero mean, axis-aligned unit selection —
//! never left stale or singular from a previous fit.
//!
//! ## Quick start
//!
//! ```rust
//! use nalgebra::SVector;
//! use field_lens::LensBasis;
//!
//! // Points close to the x/y plane of a 3-D space.
//! let rows: Vec<SVector<f64, 3>> = vec![
//!     SVector::from([1.0, 0.0, 0.0]),
//!     SVector::from([0.0, 1.0, 0.0]),
//!     SVector::from([1.0, 1.0, 0.0]),
//!     SVector::from([2.0, 0.5, 0.0]),
//! ];
//! let lens: LensBasis<3, 2> = LensBasis::fit(&rows);
//!
//! // In-plane points survive the round trip.
//! let v = rows[3];
//! let back = lens.unproject(&lens.project(&v));
//! assert!((back - v).norm() < 1e-9);
//! ```

use demo_field::Scalar;
use nalgebra::{DMatrix, SMatrix, SVector};
use tracing::debug;

/// Fewest samples a principal-component fit is attempted on.
pub const MIN_SAMPLES: usize = 3;

/// A reduced coordinate in lens space.
pub type Projected<const R: usize> = SVector<Scalar, R>;

// ════════════════════════════════════════════════════════════════════════════
// LensBasis
// ════════════════════════════════════════════════════════════════════════════

/// Mean + forward/inverse projection pair for one vector space.
///
/// Invariants:
/// * the rows of `forward` are mutually orthonormal principal
///   directions, ordered by decreasing variance;
/// * `inverse` is `forwardᵀ`, so `forward · inverse` is the identity
///   on the reduced subspace and `unproject ∘ project` is the
///   orthogonal projection onto it.
#[derive(Clone, Debug, PartialEq)]
pub struct LensBasis<const N: usize, const R: usize> {
    pub mean:    SVector<Scalar, N>,
    pub forward: SMatrix<Scalar, R, N>,
    pub inverse: SMatrix<Scalar, N, R>,
}

impl<const N: usize, const R: usize> LensBasis<N, R> {
    /// The degenerate default: zero mean, identity on the leading `R`
    /// axes.  Used whenever a fit is impossible.
    pub fn identity() -> Self {
        LensBasis {
            mean:    SVector::zeros(),
            forward: SMatrix::identity(),
            inverse: SMatrix::identity(),
        }
    }

    /// Fit the lens to the given sample rows.
    ///
    /// Fewer than [`MIN_SAMPLES`] rows yield [`LensBasis::identity`],
    /// deterministically and regardless of the rows' contents.
    pub fn fit(rows: &[SVector<Scalar, N>]) -> Self {
        if rows.len() < MIN_SAMPLES {
            debug!(samples = rows.len(), "too few samples, lens reset to identity");
            return Self::identity();
        }

        let n = rows.len();
        let mut mean = SVector::<Scalar, N>::zeros();
        for row in rows {
            mean += row;
        }
        mean /= n as Scalar;

        let centered = DMatrix::from_fn(n, N, |i, j| rows[i][j] - mean[j]);
        let svd = centered.svd(false, true);
        let Some(vt) = svd.v_t else {
            // Unreachable with compute_v = true; stay well-defined anyway.
            return Self::identity();
        };

        // Top R right-singular vectors (descending singular value),
        // sign-normalized so the fitted basis is deterministic.  Any
        // direction past the decomposition's row count keeps its
        // axis-aligned default.
        let mut forward = SMatrix::<Scalar, R, N>::identity();
        for i in 0..R.min(vt.nrows()) {
            let mut flip = 1.0;
            let mut peak = 0.0;
            for j in 0..N {
                let c: Scalar = vt[(i, j)];
                if c.abs() > peak {
                    peak = c.abs();
                    flip = if c < 0.0 { -1.0 } else { 1.0 };
                }
            }
            for j in 0..N {
                forward[(i, j)] = flip * vt[(i, j)];
            }
        }

        let inverse = forward.transpose();
        LensBasis { mean, forward, inverse }
    }

    /// Map an original-space vector into lens coordinates.
    pub fn project(&self, v: &SVector<Scalar, N>) -> Projected<R> {
        self.forward * (v - self.mean)
    }

    /// Map lens coordinates back into the original space.
    pub fn unproject(&self, u: &Projected<R>) -> SVector<Scalar, N> {
        self.inverse * u + self.mean
    }
}

impl<const N: usize, const R: usize> Default for LensBasis<N, R> {
    fn default() -> Self { Self::identity() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
