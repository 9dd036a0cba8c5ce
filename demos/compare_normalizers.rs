use ndarray::{Array1, Array2, Axis};
use ndarray_linalg::QR;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sketch_svd::diagnostics::{orthogonality_error, range_approximation_error, svd_reconstruction_error};
use sketch_svd::{approx_range_finder, randomized_svd_seeded, Normalizer, RandomizedSvdConfig};

fn main() {
    // 400 x 250 matrix with singular values 0.9^j.
    let mut rng = ChaCha8Rng::seed_from_u64(2011);
    let (n_rows, n_cols) = (400, 250);
    let left = Array2::from_shape_fn((n_rows, n_cols), |_| rng.gen::<f64>() - 0.5).qr().expect("QR failed").0;
    let right = Array2::from_shape_fn((n_cols, n_cols), |_| rng.gen::<f64>() - 0.5).qr().expect("QR failed").0;
    let spectrum = Array1::from_shape_fn(n_cols, |j| 0.9f64.powi(j as i32));
    let mut scaled = left.clone();
    for (mut column, &sigma) in scaled.axis_iter_mut(Axis(1)).zip(spectrum.iter()) {
        column *= sigma;
    }
    let data = scaled.dot(&right.t());

    let k = 20;
    // Best possible rank-k error: sqrt(sum of the dropped sigma^2).
    let optimal_error = spectrum.iter().skip(k).map(|s| s * s).sum::<f64>().sqrt();
    println!("Optimal rank-{} error: {:.3e}", k, optimal_error);
    println!();
    println!("{:<8} {:>6} {:>14} {:>14} {:>14}", "norm.", "n_iter", "range error", "Q ortho. err", "SVD error");

    for normalizer in [Normalizer::None, Normalizer::Lu, Normalizer::Qr] {
        for n_iter in [0, 2, 4, 7] {
            let mut rng = ChaCha8Rng::seed_from_u64(7);
            let q = approx_range_finder(&data, k + 10, n_iter, normalizer, &mut rng).expect("range finder failed");
            let config = RandomizedSvdConfig::default().with_normalizer(normalizer).with_n_iter(n_iter);
            let svd = randomized_svd_seeded(&data, k, &config, Some(7)).expect("randomized SVD failed");
            println!(
                "{:<8} {:>6} {:>14.3e} {:>14.3e} {:>14.3e}",
                normalizer.to_string(),
                n_iter,
                range_approximation_error(&data, &q),
                orthogonality_error(&q),
                svd_reconstruction_error(&data, &svd)
            );
        }
    }
}
