//! Policy evaluation over flat parameter vectors.
//!
//! The policy is a fixed scoring function rather than a configurable network
//! architecture: parameters live in one flat `Vec<f64>`, and every evaluation
//! derives its output width from the parameter and state lengths.

mod evaluator;
mod gradient;

pub use evaluator::{evaluate, forward, loss, DISCOUNT};
pub use gradient::{l2_norm, FiniteDifferenceGradient, GradientEstimator};

use rand::Rng;

use crate::config::InitMethod;
use crate::{MetaRLError, Result};

/// Sample a fresh meta-parameter vector.
///
/// Each entry is `(U(0,1) - 0.5) * sqrt(variance)` with the variance set by
/// `method`: `2/d` for Xavier, `2/sqrt(d)` for He, and a fixed `0.1` for
/// uniform initialization.
pub fn initialize_parameters(
    dimensions: usize,
    method: InitMethod,
    rng: &mut impl Rng,
) -> Result<Vec<f64>> {
    if dimensions == 0 {
        return Err(MetaRLError::Initialization(
            "dimensions must be positive".to_string(),
        ));
    }

    let variance = match method {
        InitMethod::Xavier => 2.0 / dimensions as f64,
        InitMethod::He => 2.0 / (dimensions as f64).sqrt(),
        InitMethod::Uniform => 0.1,
    };
    let scale = variance.sqrt();

    Ok((0..dimensions)
        .map(|_| (rng.gen::<f64>() - 0.5) * scale)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_dimensions_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        let err = initialize_parameters(0, InitMethod::Xavier, &mut rng);
        assert!(matches!(err, Err(MetaRLError::Initialization(_))));
    }

    #[test]
    fn test_initialization_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for method in [InitMethod::Xavier, InitMethod::He, InitMethod::Uniform] {
            let dims = 64;
            let params = initialize_parameters(dims, method, &mut rng).unwrap();
            assert_eq!(params.len(), dims);

            let variance = match method {
                InitMethod::Xavier => 2.0 / dims as f64,
                InitMethod::He => 2.0 / (dims as f64).sqrt(),
                InitMethod::Uniform => 0.1,
            };
            let bound = 0.5 * variance.sqrt();
            assert!(params.iter().all(|p| p.abs() <= bound));
        }
    }

    #[test]
    fn test_seeded_initialization_reproducible() {
        let a = initialize_parameters(8, InitMethod::He, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = initialize_parameters(8, InitMethod::He, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a, b);
    }
}
