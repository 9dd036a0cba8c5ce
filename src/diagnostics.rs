// src/diagnostics.rs

//! Accuracy metrics for bases and truncated decompositions, plus a phase
//! convention that makes singular/eigen vectors comparable across runs.

use crate::adjoint::Adjoint;
use crate::rsvd::TruncatedSvd;
use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_linalg::Scalar;
use num_traits::{Float, Zero};
use rayon::prelude::*;

/// Computes the Frobenius norm `sqrt(sum |a_ij|^2)`. Empty matrices have norm zero.
pub fn frobenius_norm<A, S>(matrix: &ArrayBase<S, Ix2>) -> A::Real
where
    A: Scalar,
    S: Data<Elem = A>,
{
    let sum_of_squares = matrix
        .iter()
        .fold(<A::Real as Zero>::zero(), |acc, &x| acc + x.square());
    Float::sqrt(sum_of_squares)
}

/// Computes the orthogonality error `||Q^H Q - I||_F` of a basis with `k` columns.
pub fn orthogonality_error<A, S>(q_matrix: &ArrayBase<S, Ix2>) -> A::Real
where
    A: Scalar,
    S: Data<Elem = A>,
{
    let mut gram = q_matrix.adjoint_dot(q_matrix);
    for i in 0..gram.nrows() {
        gram[[i, i]] -= A::one();
    }
    frobenius_norm(&gram)
}

/// Computes how much of `a` lies outside the span of `q_basis`: `||A - Q (Q^H A)||_F`.
///
/// `q_basis` must have orthonormal columns and as many rows as `a`.
pub fn range_approximation_error<A, S1, S2>(a: &ArrayBase<S1, Ix2>, q_basis: &ArrayBase<S2, Ix2>) -> A::Real
where
    A: Scalar,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
{
    let coefficients = q_basis.adjoint_dot(a);
    let residual = a - &q_basis.dot(&coefficients);
    frobenius_norm(&residual)
}

/// Computes the absolute reconstruction error `||A - U diag(s) Vt||_F`.
pub fn svd_reconstruction_error<A, S>(a: &ArrayBase<S, Ix2>, svd: &TruncatedSvd<A>) -> A::Real
where
    A: Scalar,
    S: Data<Elem = A>,
{
    let residual = a - &svd.reconstruct();
    frobenius_norm(&residual)
}

/// Returns a copy of `vectors` where every column is scaled by the unit-modulus
/// factor that turns its largest-magnitude entry into a positive real number.
///
/// Singular and eigen vectors are only defined up to such a factor (a sign for
/// real data), so two decompositions of the same matrix agree column-for-column
/// after this step. On ties the first largest entry wins. All-zero columns are
/// left untouched.
pub fn canonicalize_phases<A, S>(vectors: &ArrayBase<S, Ix2>) -> Array2<A>
where
    A: Scalar + Send + Sync,
    S: Data<Elem = A>,
{
    let mut canonical = vectors.to_owned();
    canonical
        .axis_iter_mut(Axis(1))
        .into_par_iter()
        .for_each(|mut column| {
            let mut pivot = A::zero();
            let mut pivot_magnitude = <A::Real as Zero>::zero();
            for &x in column.iter() {
                let magnitude = x.abs();
                if magnitude > pivot_magnitude {
                    pivot = x;
                    pivot_magnitude = magnitude;
                }
            }
            if pivot_magnitude > <A::Real as Zero>::zero() {
                let phase = pivot.conj() / A::from_real(pivot_magnitude);
                column.mapv_inplace(|x| x * phase);
            }
        });
    canonical
}
