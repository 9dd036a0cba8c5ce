// src/range_finder.rs

use crate::adjoint::Adjoint;
use crate::linalg_backends::{BackendLU, BackendQR, LinAlgBackendProvider, ThreadSafeStdError};
use crate::params::Normalizer;
use log::{debug, trace, warn};
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_linalg::{Lapack, Scalar};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Computes a matrix with orthonormal columns whose range approximates the range of `a`.
///
/// Randomized subspace iteration (Halko, Martinsson & Tropp 2011, Algorithms 4.3/4.4):
/// a real Gaussian test matrix `Omega` (`a.ncols() x size`) is pushed through
/// `n_iter` rounds of `Q <- a * Q`, `Q <- a^H * Q`, each product optionally
/// re-normalized, and the final sample `a * Q` is orthonormalized with a thin QR.
///
/// * `a` - Input matrix (m x n), real or complex. Not modified.
/// * `size` - Number of columns of the returned basis. Should not exceed `min(m, n)`;
///   this is not checked.
/// * `n_iter` - Number of power iteration rounds.
/// * `normalizer` - Re-normalization applied after every product inside the power
///   iterations. `Normalizer::Auto` resolves to `None` for `n_iter <= 2` and `Lu` otherwise.
/// * `rng` - Source of the standard-normal test matrix. Advanced by `a.ncols() * size` draws.
///
/// # Returns
/// An `m x size` matrix `Q` with `Q^H Q = I`, so that `a - Q Q^H a` is small when
/// `a` is well approximated by a rank-`size` matrix.
///
/// # Errors
/// Propagates failures of the QR or LU backend. No input validation is done here;
/// `size` larger than the effective rank of `a` yields whatever the factorizations
/// produce for rank-deficient input.
pub fn approx_range_finder<A, S, R>(
    a: &ArrayBase<S, Ix2>,
    size: usize,
    n_iter: usize,
    normalizer: Normalizer,
    rng: &mut R,
) -> Result<Array2<A>, ThreadSafeStdError>
where
    A: Scalar + Lapack,
    S: Data<Elem = A>,
    R: Rng + ?Sized,
{
    let (nrows, ncols) = a.dim();
    let normalizer = normalizer.resolve(n_iter);
    debug!(
        "Range finder: input {}x{}, size={}, n_iter={}, normalizer={}",
        nrows, ncols, size, n_iter, normalizer
    );
    if size >= nrows.min(ncols) {
        warn!(
            "Range finder: size {} is not below min({}, {}); the basis carries no approximation guarantee.",
            size, nrows, ncols
        );
    }

    let backend = LinAlgBackendProvider::<A>::new();

    // Real Gaussian entries suffice even for complex input.
    let mut q_basis: Array2<A> = Array2::from_shape_fn((ncols, size), |_| {
        let draw: f64 = StandardNormal.sample(&mut *rng);
        A::from_real(A::real(draw))
    });

    for iter_idx in 0..n_iter {
        trace!("Range finder power iteration {}/{}", iter_idx + 1, n_iter);
        let sampled = a.dot(&q_basis);
        let sampled = normalize(&backend, sampled, normalizer)
            .map_err(|e| {
                format!(
                    "Normalizing A*Q ({}) in power iteration {} failed: {}",
                    normalizer,
                    iter_idx + 1,
                    e
                )
            })?;
        let pulled_back = a.adjoint_dot(&sampled);
        q_basis = normalize(&backend, pulled_back, normalizer)
            .map_err(|e| {
                format!(
                    "Normalizing A^H*Q ({}) in power iteration {} failed: {}",
                    normalizer,
                    iter_idx + 1,
                    e
                )
            })?;
    }

    let final_sample = a.dot(&q_basis);
    let orthonormal_basis = backend
        .qr_q_factor(&final_sample)
        .map_err(|e| format!("QR decomposition of the final range sample failed: {}", e))?;
    trace!("Range finder produced basis of shape {:?}", orthonormal_basis.dim());
    Ok(orthonormal_basis)
}

/// Applies one re-normalization step of the power iteration.
fn normalize<A, B>(backend: &B, matrix: Array2<A>, normalizer: Normalizer) -> Result<Array2<A>, ThreadSafeStdError>
where
    A: Scalar,
    B: BackendQR<A> + BackendLU<A>,
{
    match normalizer {
        Normalizer::None | Normalizer::Auto => Ok(matrix),
        Normalizer::Lu => backend.lu_permuted_l_factor(&matrix),
        Normalizer::Qr => backend.qr_q_factor(&matrix),
    }
}
