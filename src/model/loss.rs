use ndarray::{Array2, ArrayView2};

use crate::error::{Result, TrainErr};

/// A differentiable training objective.
pub trait LossFn {
    /// Scalar loss for a batch of predictions against targets.
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32;

    /// Gradient of the loss with respect to the predictions.
    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32>;
}

/// Mean squared error.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> f32 {
        (&y_pred - &y)
            .mapv(|d| d.powi(2))
            .mean()
            .unwrap_or_default()
    }

    fn loss_prime(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Array2<f32> {
        (&y_pred - &y) * (2.0 / y_pred.len() as f32)
    }
}

/// Resolves the configured loss tag. The set of losses is closed.
///
/// # Errors
/// Returns `InvalidConfig` for tags outside the set.
pub fn build_loss(name: &str) -> Result<Mse> {
    match name {
        "mse" => Ok(Mse::new()),
        other => Err(TrainErr::InvalidConfig(format!("unknown loss: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use ndarray::arr2;

    use super::*;

    #[test]
    fn mse_on_equal_arrays_is_zero() {
        let y = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(Mse::new().loss(y.view(), y.view()), 0.0);
    }

    #[test]
    fn mse_matches_the_mean_of_squared_errors() {
        let y_pred = arr2(&[[1.0], [2.0]]);
        let y = arr2(&[[0.0], [4.0]]);
        // ((1)^2 + (-2)^2) / 2
        assert_eq!(Mse::new().loss(y_pred.view(), y.view()), 2.5);
    }

    #[test]
    fn loss_prime_points_from_target_to_prediction() {
        let y_pred = arr2(&[[2.0]]);
        let y = arr2(&[[1.0]]);
        let d = Mse::new().loss_prime(y_pred.view(), y.view());
        assert_eq!(d[[0, 0]], 2.0);
    }

    #[test]
    fn unknown_loss_is_rejected() {
        assert!(build_loss("mse").is_ok());
        assert!(matches!(
            build_loss("hinge"),
            Err(TrainErr::InvalidConfig(_))
        ));
    }
}
