// src/reigh.rs

use crate::adjoint::Adjoint;
use crate::linalg_backends::{BackendEigh, LinAlgBackendProvider, ThreadSafeStdError};
use crate::params::RandomizedEighConfig;
use crate::range_finder::approx_range_finder;
use log::{debug, trace};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_linalg::{Lapack, Scalar};
use num_traits::Float;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A truncated eigendecomposition of a Hermitian matrix, `A ≈ V * diag(λ) * V^H`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "A: Serialize, A::Real: Serialize",
    deserialize = "A: DeserializeOwned, A::Real: DeserializeOwned"
))]
pub struct TruncatedEigh<A: Scalar> {
    /// Real eigenvalues ordered by descending magnitude. Shape: (k)
    pub eigenvalues: Array1<A::Real>,
    /// Orthonormal eigenvectors as columns. Shape: (n, k)
    pub eigenvectors: Array2<A>,
}

impl<A: Scalar> TruncatedEigh<A> {
    /// Number of eigenpairs kept.
    pub fn rank(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Rebuilds `V * diag(λ) * V^H`.
    pub fn reconstruct(&self) -> Array2<A> {
        let mut scaled = self.eigenvectors.clone();
        for (mut column, &lambda) in scaled.axis_iter_mut(Axis(1)).zip(self.eigenvalues.iter()) {
            let factor = A::from_real(lambda);
            column.mapv_inplace(|x| x * factor);
        }
        scaled.dot(&self.eigenvectors.adjoint())
    }
}

/// Computes the `n_components` dominant eigenpairs of a Hermitian matrix.
///
/// The range of `a` is sampled with [`approx_range_finder`] using
/// `n_components + config.n_oversamples` random vectors, `a` is compressed to
/// `C = Q^H * a * Q`, and the exact eigendecomposition of the small matrix `C`
/// (Hermitian part `(C + C^H) / 2`, which absorbs rounding) is lifted back with
/// `V = Q * W`. Dominance is by eigenvalue magnitude, so large negative
/// eigenvalues of indefinite matrices are kept ahead of small positive ones.
///
/// * `a` - Square Hermitian matrix (n x n). Neither property is checked.
/// * `n_components` - Number of eigenpairs to return.
/// * `config` - Oversampling, power iterations and normalizer. `PowerIterations::Auto`
///   resolves exactly as for [`crate::randomized_svd`].
/// * `rng` - Source of the random test matrix.
///
/// # Errors
/// Propagates backend failures from the range finder or the small eigensolver.
pub fn randomized_eigh<A, S, R>(
    a: &ArrayBase<S, Ix2>,
    n_components: usize,
    config: &RandomizedEighConfig,
    rng: &mut R,
) -> Result<TruncatedEigh<A>, ThreadSafeStdError>
where
    A: Scalar + Lapack,
    S: Data<Elem = A>,
    R: Rng + ?Sized,
{
    let shape = a.dim();
    let sketch_size = n_components + config.n_oversamples;
    let n_iter = config.n_iter.resolve(n_components, shape);
    debug!(
        "Randomized eigh: input {}x{}, n_components={}, sketch_size={}, n_iter={}, normalizer={}",
        shape.0, shape.1, n_components, sketch_size, n_iter, config.normalizer
    );

    let q_basis = approx_range_finder(a, sketch_size, n_iter, config.normalizer, rng)?;

    // C = Q^H * A * Q, (sketch x sketch)
    let compressed = q_basis.adjoint_dot(&a.dot(&q_basis));
    let half = A::from_real(A::real(0.5));
    let hermitian_part = (&compressed + &compressed.adjoint()).mapv(|x| x * half);

    let backend = LinAlgBackendProvider::<A>::new();
    let eigh_c = backend
        .eigh_upper(&hermitian_part)
        .map_err(|e| {
            format!("Eigendecomposition of the compressed matrix C failed in randomized eigh: {e}")
        })?;

    let order = dominant_order(&eigh_c.eigenvalues);
    let k = n_components.min(order.len());
    let kept = &order[..k];
    let eigenvalues = eigh_c.eigenvalues.select(Axis(0), kept);
    let w_kept = eigh_c.eigenvectors.select(Axis(1), kept);
    let eigenvectors = q_basis.dot(&w_kept);
    trace!("Randomized eigh kept {} eigenpairs: {:?}", k, eigenvalues);

    Ok(TruncatedEigh { eigenvalues, eigenvectors })
}

/// Like [`randomized_eigh`], drawing the test matrix from a `ChaCha8Rng`.
///
/// * `seed` - `Some(seed)` for reproducible results, `None` to seed from system entropy.
pub fn randomized_eigh_seeded<A, S>(
    a: &ArrayBase<S, Ix2>,
    n_components: usize,
    config: &RandomizedEighConfig,
    seed: Option<u64>,
) -> Result<TruncatedEigh<A>, ThreadSafeStdError>
where
    A: Scalar + Lapack,
    S: Data<Elem = A>,
{
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    randomized_eigh(a, n_components, config, &mut rng)
}

/// Indices of `eigenvalues` sorted by descending magnitude. Stable, so equal
/// magnitudes keep the solver's ascending order.
fn dominant_order<T: Float>(eigenvalues: &Array1<T>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
    order.sort_by(|&i, &j| {
        let magnitude_i = Float::abs(eigenvalues[i]);
        let magnitude_j = Float::abs(eigenvalues[j]);
        magnitude_j.partial_cmp(&magnitude_i).unwrap_or(Ordering::Equal)
    });
    order
}
