// src/adjoint.rs

use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_linalg::Scalar;

/// Conjugate transpose for 2-D arrays of any `Scalar` element.
///
/// For real element types conjugation is the identity, so both methods reduce
/// to the plain transpose; complex element types get the Hermitian adjoint.
pub trait Adjoint<A: Scalar> {
    /// Returns `self^H` as an owned array.
    fn adjoint(&self) -> Array2<A>;

    /// Returns `self^H * rhs` without materializing `self^H`.
    ///
    /// Uses `self^H * rhs = conj(self^T * conj(rhs))`, so only `rhs` and the
    /// product are conjugated. Prefer this when `self` is the large operand.
    fn adjoint_dot<S2>(&self, rhs: &ArrayBase<S2, Ix2>) -> Array2<A>
    where
        S2: Data<Elem = A>;
}

impl<A, S> Adjoint<A> for ArrayBase<S, Ix2>
where
    A: Scalar,
    S: Data<Elem = A>,
{
    fn adjoint(&self) -> Array2<A> {
        self.t().mapv(|x| x.conj())
    }

    fn adjoint_dot<S2>(&self, rhs: &ArrayBase<S2, Ix2>) -> Array2<A>
    where
        S2: Data<Elem = A>,
    {
        let conjugated_rhs = rhs.mapv(|x| x.conj());
        let mut product = self.t().dot(&conjugated_rhs);
        product.mapv_inplace(|x| x.conj());
        product
    }
}
