// src/linalg_backends.rs

use log::debug;
use ndarray::{s, Array1, Array2, Axis, ShapeBuilder};
use ndarray_linalg::{
    AllocatedArray, AllocatedArrayMut, Eigh as NdLinalgEigh, JobSvd, Lapack, Scalar, QR as NdLinalgQR,
    SVDDCInto as NdLinalgSVDDCInto, UPLO,
};
use std::error::Error;
use std::marker::PhantomData;

/// A thread-safe wrapper for standard dynamic errors,
/// so they implement `Send` and `Sync`.
pub type ThreadSafeStdError = Box<dyn Error + Send + Sync + 'static>;

#[derive(Debug, Default, Copy, Clone)]
pub struct LinAlgBackendProvider<A: Scalar> {
    _phantom: PhantomData<A>,
}

impl<A: Scalar> LinAlgBackendProvider<A> {
    pub fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

// --- Trait Definitions ---

/// Output of a Hermitian eigendecomposition.
#[derive(Debug)]
pub struct EighOutput<A: Scalar> {
    /// Eigenvalues (always real), sorted in ascending order.
    pub eigenvalues: Array1<A::Real>,
    /// Eigenvectors as columns of the matrix.
    /// eigenvectors.column(i) corresponds to eigenvalues[i].
    pub eigenvectors: Array2<A>,
}

/// Trait for Hermitian eigendecomposition (LAPACK's xSYEVD / xHEEVD family).
/// Only the upper triangle of `matrix` is read.
pub trait BackendEigh<A: Scalar> {
    fn eigh_upper(&self, matrix: &Array2<A>) -> Result<EighOutput<A>, ThreadSafeStdError>;
}

/// Trait for QR decomposition, focusing on retrieving the thin Q factor.
pub trait BackendQR<A: Scalar> {
    fn qr_q_factor(&self, matrix: &Array2<A>) -> Result<Array2<A>, ThreadSafeStdError>;
}

/// Trait for LU decomposition with partial (row) pivoting.
///
/// For an `m x n` matrix with `matrix = P * L * U`, returns the product `P * L`
/// of shape `m x min(m, n)`: the unit-lower-trapezoidal factor with the row
/// permutation folded back in. When the factorization hits an exactly zero
/// pivot the thin Q factor of `matrix` is returned, which spans the same columns.
pub trait BackendLU<A: Scalar> {
    fn lu_permuted_l_factor(&self, matrix: &Array2<A>) -> Result<Array2<A>, ThreadSafeStdError>;
}

/// Output of a thin Singular Value Decomposition of an `m x n` matrix:
/// `u` is `m x min(m, n)` and `vt` is `min(m, n) x n`.
#[derive(Debug)]
pub struct SVDOutput<A: Scalar> {
    pub u: Option<Array2<A>>,
    /// Singular values in descending order.
    pub s: Array1<A::Real>,
    pub vt: Option<Array2<A>>,
}

/// Trait for Singular Value Decomposition.
pub trait BackendSVD<A: Scalar> {
    fn svd_into(&self, matrix: Array2<A>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<A>, ThreadSafeStdError>;
}

// --- NdarrayLinAlgBackend Implementation ---

#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

// Helper to convert ndarray-linalg's error to ThreadSafeStdError
fn to_dyn_error<E: Error + Send + Sync + 'static>(e: E) -> ThreadSafeStdError {
    Box::new(e)
}

impl<A: Scalar + Lapack> BackendEigh<A> for NdarrayLinAlgBackend {
    fn eigh_upper(&self, matrix: &Array2<A>) -> Result<EighOutput<A>, ThreadSafeStdError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(format!(
                "Matrix must be square for eigendecomposition, got {}x{}.",
                matrix.nrows(),
                matrix.ncols()
            )
            .into());
        }
        if matrix.is_empty() {
            return Ok(EighOutput { eigenvalues: Array1::zeros(0), eigenvectors: Array2::zeros((0, 0)) });
        }
        let (eigenvalues, eigenvectors) = matrix.eigh(UPLO::Upper).map_err(to_dyn_error)?;
        Ok(EighOutput { eigenvalues, eigenvectors })
    }
}

impl<A: Scalar + Lapack> BackendQR<A> for NdarrayLinAlgBackend {
    fn qr_q_factor(&self, matrix: &Array2<A>) -> Result<Array2<A>, ThreadSafeStdError> {
        let (nrows, ncols) = matrix.dim();
        if nrows == 0 || ncols == 0 {
            return Ok(Array2::zeros((nrows, nrows.min(ncols))));
        }
        let (q_factor, _r) = matrix.qr().map_err(to_dyn_error)?;
        Ok(q_factor)
    }
}

impl<A: Scalar + Lapack> BackendLU<A> for NdarrayLinAlgBackend {
    fn lu_permuted_l_factor(&self, matrix: &Array2<A>) -> Result<Array2<A>, ThreadSafeStdError> {
        let (nrows, ncols) = matrix.dim();
        let k = nrows.min(ncols);
        if k == 0 {
            return Ok(Array2::zeros((nrows, k)));
        }

        // xGETRF factors column-major storage in place.
        // A row-major buffer would yield the LU of M^T.
        let mut packed = Array2::<A>::zeros((nrows, ncols).f());
        packed.assign(matrix);
        let layout = packed.layout().map_err(to_dyn_error)?;
        let pivots = match A::lu(layout, packed.as_allocated_mut().map_err(to_dyn_error)?) {
            Ok(pivots) => pivots,
            Err(e) => {
                // An exactly zero pivot is reported as an error and the pivots are discarded.
                debug!(
                    "LU of a {}x{} block is exactly singular ({}); using its thin Q factor instead.",
                    nrows, ncols, e
                );
                return self.qr_q_factor(matrix);
            }
        };

        // Replay the 1-based row interchanges: row i of L*U is row row_origin[i] of the input.
        let mut row_origin: Vec<usize> = (0..nrows).collect();
        for (i, &pivot) in pivots.iter().enumerate() {
            row_origin.swap(i, (pivot - 1) as usize);
        }
        let mut source_row = vec![0usize; nrows];
        for (position, &origin) in row_origin.iter().enumerate() {
            source_row[origin] = position;
        }

        // Unit-lower-trapezoidal L from the packed factor; U above the diagonal is dropped.
        let mut lower = packed.slice(s![.., ..k]).to_owned();
        for ((i, j), x) in lower.indexed_iter_mut() {
            if i == j {
                *x = A::one();
            } else if j > i {
                *x = A::zero();
            }
        }
        Ok(lower.select(Axis(0), &source_row))
    }
}

impl<A: Scalar + Lapack> BackendSVD<A> for NdarrayLinAlgBackend {
    fn svd_into(&self, matrix: Array2<A>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<A>, ThreadSafeStdError> {
        let (nrows, ncols) = matrix.dim();
        let k_dim = nrows.min(ncols);
        if matrix.is_empty() {
            return Ok(SVDOutput {
                u: if compute_u { Some(Array2::zeros((nrows, k_dim))) } else { None },
                s: Array1::zeros(k_dim),
                vt: if compute_v { Some(Array2::zeros((k_dim, ncols))) } else { None },
            });
        }
        // Divide and conquer computes both thin factors or neither.
        let job = if compute_u || compute_v { JobSvd::Some } else { JobSvd::None };
        let (u, s, vt) = matrix.svddc_into(job).map_err(to_dyn_error)?;
        Ok(SVDOutput {
            u: u.filter(|_| compute_u),
            s,
            vt: vt.filter(|_| compute_v),
        })
    }
}

// --- LinAlgBackendProvider Dispatch ---

impl<A> BackendEigh<A> for LinAlgBackendProvider<A>
where
    A: Scalar,
    NdarrayLinAlgBackend: BackendEigh<A>,
{
    fn eigh_upper(&self, matrix: &Array2<A>) -> Result<EighOutput<A>, ThreadSafeStdError> {
        NdarrayLinAlgBackend.eigh_upper(matrix)
    }
}

impl<A> BackendQR<A> for LinAlgBackendProvider<A>
where
    A: Scalar,
    NdarrayLinAlgBackend: BackendQR<A>,
{
    fn qr_q_factor(&self, matrix: &Array2<A>) -> Result<Array2<A>, ThreadSafeStdError> {
        NdarrayLinAlgBackend.qr_q_factor(matrix)
    }
}

impl<A> BackendLU<A> for LinAlgBackendProvider<A>
where
    A: Scalar,
    NdarrayLinAlgBackend: BackendLU<A>,
{
    fn lu_permuted_l_factor(&self, matrix: &Array2<A>) -> Result<Array2<A>, ThreadSafeStdError> {
        NdarrayLinAlgBackend.lu_permuted_l_factor(matrix)
    }
}

impl<A> BackendSVD<A> for LinAlgBackendProvider<A>
where
    A: Scalar,
    NdarrayLinAlgBackend: BackendSVD<A>,
{
    fn svd_into(&self, matrix: Array2<A>, compute_u: bool, compute_v: bool) -> Result<SVDOutput<A>, ThreadSafeStdError> {
        NdarrayLinAlgBackend.svd_into(matrix, compute_u, compute_v)
    }
}
