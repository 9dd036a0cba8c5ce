// tests/common/mod.rs
#![allow(dead_code)]

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_linalg::{Lapack, Scalar, QR};
use rand_chacha::ChaCha8Rng;
use sketch_svd::Adjoint;

pub const SEED: u64 = 42;

/// `count` values evenly spaced from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![start];
    }
    let step = (end - start) / (count - 1) as f64;
    (0..count).map(|i| start + step * i as f64).collect()
}

/// A `rows x cols` matrix with orthonormal columns (real or complex).
pub fn random_orthonormal<A: Scalar + Lapack>(rows: usize, cols: usize, rng: &mut ChaCha8Rng) -> Array2<A> {
    let raw = Array2::from_shape_fn((rows, cols), |_| A::rand(&mut *rng) - A::rand(&mut *rng));
    let (q, _r) = raw.qr().unwrap();
    q
}

/// `U0 * diag(s) * V0^H` with random orthonormal factors.
pub struct LowRankFixture<A: Scalar> {
    pub matrix: Array2<A>,
    pub u: Array2<A>,
    pub s: Array1<f64>,
    pub v: Array2<A>,
}

pub fn random_lowrank<A>(rows: usize, cols: usize, singular_values: &[f64], rng: &mut ChaCha8Rng) -> LowRankFixture<A>
where
    A: Scalar<Real = f64> + Lapack,
{
    let rank = singular_values.len();
    let u = random_orthonormal::<A>(rows, rank, rng);
    let v = random_orthonormal::<A>(cols, rank, rng);
    let s = Array1::from(singular_values.to_vec());
    let mut scaled_u = u.clone();
    for (mut column, &sigma) in scaled_u.axis_iter_mut(Axis(1)).zip(s.iter()) {
        column.mapv_inplace(|x| x * A::from_real(sigma));
    }
    let matrix = scaled_u.dot(&v.adjoint());
    LowRankFixture { matrix, u, s, v }
}

/// Same as [`random_lowrank`], rescaled to unit Frobenius norm.
pub fn random_lowrank_unit_norm<A>(rows: usize, cols: usize, singular_values: &[f64], rng: &mut ChaCha8Rng) -> Array2<A>
where
    A: Scalar<Real = f64> + Lapack,
{
    let norm = singular_values.iter().map(|s| s * s).sum::<f64>().sqrt();
    let scaled: Vec<f64> = singular_values.iter().map(|s| s / norm).collect();
    random_lowrank::<A>(rows, cols, &scaled, rng).matrix
}

/// `V0 * diag(eigenvalues) * V0^H`, Hermitian by construction.
pub struct HermitianFixture<A: Scalar> {
    pub matrix: Array2<A>,
    pub eigenvalues: Array1<f64>,
    pub eigenvectors: Array2<A>,
}

pub fn random_lowrank_hermitian<A>(n: usize, eigenvalues: &[f64], rng: &mut ChaCha8Rng) -> HermitianFixture<A>
where
    A: Scalar<Real = f64> + Lapack,
{
    let v = random_orthonormal::<A>(n, eigenvalues.len(), rng);
    let lambda = Array1::from(eigenvalues.to_vec());
    let mut scaled = v.clone();
    for (mut column, &l) in scaled.axis_iter_mut(Axis(1)).zip(lambda.iter()) {
        column.mapv_inplace(|x| x * A::from_real(l));
    }
    let product = scaled.dot(&v.adjoint());
    // Exactly Hermitian, so the upper-triangle eigensolver sees the same matrix as the full products.
    let matrix = (&product + &product.adjoint()).mapv(|x| x * A::from_real(0.5));
    HermitianFixture { matrix, eigenvalues: lambda, eigenvectors: v }
}

pub fn assert_f64_arrays_are_close(got: ArrayView1<f64>, expected: ArrayView1<f64>, tolerance: f64, context: &str) {
    assert_eq!(got.dim(), expected.dim(), "Array dimensions differ for {}. Got: {:?}, Expected: {:?}", context, got.dim(), expected.dim());
    for (i, (g, e)) in got.iter().zip(expected.iter()).enumerate() {
        assert!(
            (g - e).abs() < tolerance,
            "Mismatch at index {} for {}: {} vs {} (diff: {})",
            i,
            context,
            g,
            e,
            (g - e).abs()
        );
    }
}

/// Asserts that every column of `got` equals the matching column of `expected`
/// times some unit-modulus factor (a sign for real data). Columns of `expected`
/// must have unit norm.
pub fn assert_columns_match_up_to_phase<A>(got: ArrayView2<A>, expected: ArrayView2<A>, tolerance: f64, context: &str)
where
    A: Scalar<Real = f64>,
{
    assert_eq!(got.dim(), expected.dim(), "Matrix dimensions differ for {}. Got: {:?}, Expected: {:?}", context, got.dim(), expected.dim());
    for (c_idx, (g, e)) in got.axis_iter(Axis(1)).zip(expected.axis_iter(Axis(1))).enumerate() {
        // e^H g is the phase when g = e * phase.
        let overlap = e.iter().zip(g.iter()).fold(A::zero(), |acc, (&ei, &gi)| acc + ei.conj() * gi);
        let magnitude = overlap.abs();
        assert!(magnitude > 0.5, "Column {} for {} is nearly orthogonal to the expected vector (|overlap| = {})", c_idx, context, magnitude);
        let unphase = overlap.conj() / A::from_real(magnitude);
        let diff_norm = g
            .iter()
            .zip(e.iter())
            .map(|(&gi, &ei)| (gi * unphase - ei).square())
            .sum::<f64>()
            .sqrt();
        assert!(diff_norm < tolerance, "Column {} for {} differs from the expected vector by {} after phase alignment", c_idx, context, diff_norm);
    }
}
