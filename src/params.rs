// src/params.rs

//! Tuning parameters for the randomized decompositions and the pure functions
//! that resolve their `auto` settings from the input shape.

use crate::linalg_backends::ThreadSafeStdError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default number of extra sketch columns beyond the requested rank.
pub const DEFAULT_N_OVERSAMPLES: usize = 10;

/// How power iterations are re-normalized between multiplications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalizer {
    /// `None` for at most two iterations, `Lu` otherwise.
    #[default]
    Auto,
    /// Thin QR after every multiplication. Slowest, most accurate.
    Qr,
    /// Permuted lower factor of a partial-pivoting LU. Cheap and stable.
    Lu,
    /// No normalization. Fastest; loses accuracy once `n_iter` reaches about 5.
    None,
}

impl Normalizer {
    /// Resolves `Auto` for the given iteration count; explicit choices pass through.
    pub fn resolve(self, n_iter: usize) -> Normalizer {
        match self {
            Normalizer::Auto if n_iter <= 2 => Normalizer::None,
            Normalizer::Auto => Normalizer::Lu,
            explicit => explicit,
        }
    }
}

impl fmt::Display for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Normalizer::Auto => "auto",
            Normalizer::Qr => "qr",
            Normalizer::Lu => "lu",
            Normalizer::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for Normalizer {
    type Err = ThreadSafeStdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Normalizer::Auto),
            "qr" => Ok(Normalizer::Qr),
            "lu" => Ok(Normalizer::Lu),
            "none" => Ok(Normalizer::None),
            other => Err(format!("Unknown power iteration normalizer '{}'. Expected one of: auto, qr, lu, none.", other).into()),
        }
    }
}

/// Number of power iterations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerIterations {
    /// 7 when the requested rank is below a tenth of the smaller dimension, 4 otherwise.
    #[default]
    Auto,
    Fixed(usize),
}

impl PowerIterations {
    /// Resolves `Auto` for a target rank and an `(nrows, ncols)` shape.
    pub fn resolve(self, n_components: usize, shape: (usize, usize)) -> usize {
        match self {
            PowerIterations::Fixed(n_iter) => n_iter,
            PowerIterations::Auto => {
                let smaller_dim = shape.0.min(shape.1);
                if (n_components as f64) < 0.1 * smaller_dim as f64 {
                    7
                } else {
                    4
                }
            }
        }
    }
}

impl From<usize> for PowerIterations {
    fn from(n_iter: usize) -> Self {
        PowerIterations::Fixed(n_iter)
    }
}

impl fmt::Display for PowerIterations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerIterations::Auto => f.write_str("auto"),
            PowerIterations::Fixed(n_iter) => write!(f, "{}", n_iter),
        }
    }
}

impl FromStr for PowerIterations {
    type Err = ThreadSafeStdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(PowerIterations::Auto);
        }
        trimmed
            .parse::<usize>()
            .map(PowerIterations::Fixed)
            .map_err(|e| format!("Invalid power iteration count '{}': {}", trimmed, e).into())
    }
}

/// Whether the SVD works on the transpose of its input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transpose {
    /// Transpose when the input has fewer rows than columns.
    #[default]
    Auto,
    Always,
    Never,
}

impl Transpose {
    /// Resolves `Auto` for an `(nrows, ncols)` shape.
    pub fn resolve(self, shape: (usize, usize)) -> bool {
        match self {
            Transpose::Auto => shape.0 < shape.1,
            Transpose::Always => true,
            Transpose::Never => false,
        }
    }
}

impl From<bool> for Transpose {
    fn from(transpose: bool) -> Self {
        if transpose {
            Transpose::Always
        } else {
            Transpose::Never
        }
    }
}

impl fmt::Display for Transpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transpose::Auto => "auto",
            Transpose::Always => "true",
            Transpose::Never => "false",
        };
        f.write_str(name)
    }
}

impl FromStr for Transpose {
    type Err = ThreadSafeStdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Transpose::Auto),
            "true" | "always" => Ok(Transpose::Always),
            "false" | "never" => Ok(Transpose::Never),
            other => Err(format!("Unknown transpose mode '{}'. Expected one of: auto, true, false.", other).into()),
        }
    }
}

/// Parameters of [`crate::randomized_svd`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizedSvdConfig {
    /// Extra random vectors sampled beyond `n_components` (sketch size is `n_components + n_oversamples`).
    pub n_oversamples: usize,
    pub n_iter: PowerIterations,
    pub normalizer: Normalizer,
    pub transpose: Transpose,
}

impl Default for RandomizedSvdConfig {
    fn default() -> Self {
        RandomizedSvdConfig {
            n_oversamples: DEFAULT_N_OVERSAMPLES,
            n_iter: PowerIterations::Auto,
            normalizer: Normalizer::Auto,
            transpose: Transpose::Auto,
        }
    }
}

impl RandomizedSvdConfig {
    pub fn with_n_oversamples(mut self, n_oversamples: usize) -> Self {
        self.n_oversamples = n_oversamples;
        self
    }

    /// Fixes the number of power iterations, overriding `PowerIterations::Auto`.
    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = PowerIterations::Fixed(n_iter);
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_transpose(mut self, transpose: impl Into<Transpose>) -> Self {
        self.transpose = transpose.into();
        self
    }
}

/// Parameters of [`crate::randomized_eigh`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomizedEighConfig {
    pub n_oversamples: usize,
    pub n_iter: PowerIterations,
    pub normalizer: Normalizer,
}

impl Default for RandomizedEighConfig {
    fn default() -> Self {
        RandomizedEighConfig {
            n_oversamples: DEFAULT_N_OVERSAMPLES,
            n_iter: PowerIterations::Auto,
            normalizer: Normalizer::Auto,
        }
    }
}

impl RandomizedEighConfig {
    pub fn with_n_oversamples(mut self, n_oversamples: usize) -> Self {
        self.n_oversamples = n_oversamples;
        self
    }

    /// Fixes the number of power iterations, overriding `PowerIterations::Auto`.
    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = PowerIterations::Fixed(n_iter);
        self
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_normalizer_switches_to_lu_after_two_iterations() {
        assert_eq!(Normalizer::Auto.resolve(0), Normalizer::None);
        assert_eq!(Normalizer::Auto.resolve(2), Normalizer::None);
        assert_eq!(Normalizer::Auto.resolve(3), Normalizer::Lu);
        assert_eq!(Normalizer::Auto.resolve(10), Normalizer::Lu);
    }

    #[test]
    fn explicit_normalizers_are_kept() {
        for normalizer in [Normalizer::Qr, Normalizer::Lu, Normalizer::None] {
            assert_eq!(normalizer.resolve(0), normalizer);
            assert_eq!(normalizer.resolve(9), normalizer);
        }
    }

    #[test]
    fn auto_power_iterations_depend_on_relative_rank() {
        // 0.1 * min(500, 80) = 8
        assert_eq!(PowerIterations::Auto.resolve(7, (500, 80)), 7);
        assert_eq!(PowerIterations::Auto.resolve(8, (500, 80)), 4);
        assert_eq!(PowerIterations::Auto.resolve(3, (50, 30)), 4);
        assert_eq!(PowerIterations::Auto.resolve(1, (1000, 1000)), 7);
        assert_eq!(PowerIterations::Fixed(2).resolve(1, (1000, 1000)), 2);
    }

    #[test]
    fn auto_transpose_prefers_wide_inputs() {
        assert!(Transpose::Auto.resolve((30, 50)));
        assert!(!Transpose::Auto.resolve((50, 30)));
        assert!(!Transpose::Auto.resolve((40, 40)));
        assert!(Transpose::Always.resolve((50, 30)));
        assert!(!Transpose::Never.resolve((30, 50)));
        assert_eq!(Transpose::from(true), Transpose::Always);
        assert_eq!(Transpose::from(false), Transpose::Never);
    }

    #[test]
    fn parameters_parse_from_strings() {
        assert_eq!("LU".parse::<Normalizer>().unwrap(), Normalizer::Lu);
        assert_eq!(" qr ".parse::<Normalizer>().unwrap(), Normalizer::Qr);
        assert_eq!("none".parse::<Normalizer>().unwrap(), Normalizer::None);
        assert!("cholesky".parse::<Normalizer>().is_err());

        assert_eq!("auto".parse::<PowerIterations>().unwrap(), PowerIterations::Auto);
        assert_eq!("5".parse::<PowerIterations>().unwrap(), PowerIterations::Fixed(5));
        assert!("-1".parse::<PowerIterations>().is_err());

        assert_eq!("true".parse::<Transpose>().unwrap(), Transpose::Always);
        assert_eq!("False".parse::<Transpose>().unwrap(), Transpose::Never);
        assert_eq!("never".parse::<Transpose>().unwrap(), Transpose::Never);
        assert!("sometimes".parse::<Transpose>().is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for normalizer in [Normalizer::Auto, Normalizer::Qr, Normalizer::Lu, Normalizer::None] {
            assert_eq!(normalizer.to_string().parse::<Normalizer>().unwrap(), normalizer);
        }
        for transpose in [Transpose::Auto, Transpose::Always, Transpose::Never] {
            assert_eq!(transpose.to_string().parse::<Transpose>().unwrap(), transpose);
        }
        assert_eq!(PowerIterations::Fixed(3).to_string(), "3");
    }

    #[test]
    fn config_defaults_and_builders() {
        let config = RandomizedSvdConfig::default();
        assert_eq!(config.n_oversamples, 10);
        assert_eq!(config.n_iter, PowerIterations::Auto);
        assert_eq!(config.normalizer, Normalizer::Auto);
        assert_eq!(config.transpose, Transpose::Auto);

        let config = config.with_n_iter(2).with_normalizer(Normalizer::Qr).with_transpose(true).with_n_oversamples(5);
        assert_eq!(config.n_iter, PowerIterations::Fixed(2));
        assert_eq!(config.normalizer, Normalizer::Qr);
        assert_eq!(config.transpose, Transpose::Always);
        assert_eq!(config.n_oversamples, 5);

        let eigh_config = RandomizedEighConfig::default().with_n_iter(10);
        assert_eq!(eigh_config.n_iter, PowerIterations::Fixed(10));
        assert_eq!(eigh_config.n_oversamples, 10);
    }

    #[test]
    fn config_serializes_with_lowercase_names() {
        let config = RandomizedSvdConfig::default().with_normalizer(Normalizer::Lu).with_n_iter(3);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"normalizer\":\"lu\""), "unexpected json: {}", json);
        assert!(json.contains("\"n_iter\":{\"fixed\":3}"), "unexpected json: {}", json);
        let restored: RandomizedSvdConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);

        // Missing fields fall back to defaults.
        let partial: RandomizedSvdConfig = serde_json::from_str("{\"transpose\":\"never\"}").unwrap();
        assert_eq!(partial.transpose, Transpose::Never);
        assert_eq!(partial.n_oversamples, 10);
    }
}
