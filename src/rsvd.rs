// src/rsvd.rs

use crate::adjoint::Adjoint;
use crate::linalg_backends::{BackendSVD, LinAlgBackendProvider, ThreadSafeStdError};
use crate::params::RandomizedSvdConfig;
use crate::range_finder::approx_range_finder;
use log::{debug, trace};
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_linalg::{Lapack, Scalar};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A truncated singular value decomposition `M ≈ u * diag(s) * vt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "A: Serialize, A::Real: Serialize",
    deserialize = "A: DeserializeOwned, A::Real: DeserializeOwned"
))]
pub struct TruncatedSvd<A: Scalar> {
    /// Left singular vectors as columns. Shape: (n_rows, k)
    pub u: Array2<A>,
    /// Singular values, non-negative and in descending order. Shape: (k)
    pub s: Array1<A::Real>,
    /// Right singular vectors as rows. Shape: (k, n_cols)
    pub vt: Array2<A>,
}

impl<A: Scalar> TruncatedSvd<A> {
    /// Number of singular triplets kept.
    pub fn rank(&self) -> usize {
        self.s.len()
    }

    /// Right singular vectors as columns, i.e. `vt^H`. Shape: (n_cols, k)
    pub fn v(&self) -> Array2<A> {
        self.vt.adjoint()
    }

    /// Rebuilds the rank-k approximation `u * diag(s) * vt`.
    pub fn reconstruct(&self) -> Array2<A> {
        let mut scaled_u = self.u.clone();
        for (mut column, &sigma) in scaled_u.axis_iter_mut(Axis(1)).zip(self.s.iter()) {
            let factor = A::from_real(sigma);
            column.mapv_inplace(|x| x * factor);
        }
        scaled_u.dot(&self.vt)
    }
}

/// Computes a truncated randomized SVD of `matrix`.
///
/// The range of `matrix` (or of its transpose, see `config.transpose`) is sampled
/// with [`approx_range_finder`] using `n_components + config.n_oversamples` random
/// vectors. The input is projected onto that basis, `B = Q^H * M`, a thin
/// divide-and-conquer SVD of the small matrix `B` is taken, and its left
/// singular vectors are lifted back with `U = Q * U_B`. Halko, Martinsson &
/// Tropp (2011); Martinsson, Rokhlin & Tygert (2011); Szlam, Kluger & Tygert (2014).
///
/// * `matrix` - Matrix to decompose (m x n), real or complex. Not modified.
/// * `n_components` - Number of singular triplets to return. Should not exceed `min(m, n)`.
/// * `config` - Oversampling, power iterations, normalizer and transposition.
///   `PowerIterations::Auto` resolves to 7 when `n_components < 0.1 * min(m, n)` and 4
///   otherwise; `Transpose::Auto` works on `M^T` when `m < n`.
/// * `rng` - Source of the random test matrix.
///
/// # Returns
/// A [`TruncatedSvd`] with `u` (m x k), `s` (k) and `vt` (k x n), `k = n_components`
/// unless the sketch yields fewer singular values.
///
/// # Errors
/// Propagates backend failures from the range finder or the small SVD.
pub fn randomized_svd<A, S, R>(
    matrix: &ArrayBase<S, Ix2>,
    n_components: usize,
    config: &RandomizedSvdConfig,
    rng: &mut R,
) -> Result<TruncatedSvd<A>, ThreadSafeStdError>
where
    A: Scalar + Lapack,
    S: Data<Elem = A>,
    R: Rng + ?Sized,
{
    let shape = matrix.dim();
    let sketch_size = n_components + config.n_oversamples;
    let n_iter = config.n_iter.resolve(n_components, shape);
    let transpose = config.transpose.resolve(shape);
    debug!(
        "Randomized SVD: input {}x{}, n_components={}, sketch_size={}, n_iter={}, normalizer={}, \
         transpose={}",
        shape.0,
        shape.1,
        n_components,
        sketch_size,
        n_iter,
        config.normalizer,
        transpose
    );

    // Plain transpose: M = (M^T)^T, so the factors of M^T map back without conjugation.
    let working = if transpose { matrix.t() } else { matrix.view() };

    let q_basis = approx_range_finder(&working, sketch_size, n_iter, config.normalizer, rng)?;

    // B = Q^H * M, (sketch x n); its thin SVD has min(sketch, n) triplets.
    let projected_b = q_basis.adjoint().dot(&working);

    let backend = LinAlgBackendProvider::<A>::new();
    let svd_b = backend
        .svd_into(projected_b, true, true)
        .map_err(|e| format!("SVD of the projected sketch B failed in randomized SVD: {}", e))?;
    let u_b = svd_b.u.ok_or("SVD of the projected sketch did not return U")?;
    let vt_b = svd_b.vt.ok_or("SVD of the projected sketch did not return V^T")?;

    let k = n_components.min(svd_b.s.len());
    let u_lifted = q_basis.dot(&u_b.slice(s![.., ..k]));
    let s_truncated = svd_b.s.slice(s![..k]).to_owned();
    let vt_truncated = vt_b.slice(s![..k, ..]).to_owned();
    trace!(
        "Randomized SVD kept {} components; leading singular value {:?}",
        k,
        s_truncated.first()
    );

    if transpose {
        // M^T ≈ U' S Vt'  =>  M ≈ Vt'^T S U'^T
        Ok(TruncatedSvd {
            u: vt_truncated.t().to_owned(),
            s: s_truncated,
            vt: u_lifted.t().to_owned(),
        })
    } else {
        Ok(TruncatedSvd { u: u_lifted, s: s_truncated, vt: vt_truncated })
    }
}

/// Like [`randomized_svd`], drawing the test matrix from a `ChaCha8Rng`.
///
/// * `seed` - `Some(seed)` for reproducible results, `None` to seed from system entropy.
pub fn randomized_svd_seeded<A, S>(
    matrix: &ArrayBase<S, Ix2>,
    n_components: usize,
    config: &RandomizedSvdConfig,
    seed: Option<u64>,
) -> Result<TruncatedSvd<A>, ThreadSafeStdError>
where
    A: Scalar + Lapack,
    S: Data<Elem = A>,
{
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    randomized_svd(matrix, n_components, config, &mut rng)
}
