// Randomized low-rank decompositions

#![doc = include_str!("../README.md")]

pub mod adjoint;
pub mod diagnostics;
pub mod linalg_backends;
pub mod params;
pub mod range_finder;
pub mod reigh;
pub mod rsvd;

pub use adjoint::Adjoint;
pub use linalg_backends::ThreadSafeStdError;
pub use params::{
    Normalizer, PowerIterations, RandomizedEighConfig, RandomizedSvdConfig, Transpose,
    DEFAULT_N_OVERSAMPLES,
};
pub use range_finder::approx_range_finder;
pub use reigh::{randomized_eigh, randomized_eigh_seeded, TruncatedEigh};
pub use rsvd::{randomized_svd, randomized_svd_seeded, TruncatedSvd};
