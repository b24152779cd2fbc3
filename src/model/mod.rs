pub mod feed_forward;
pub mod loss;

use ndarray::{Array2, ArrayView2};
use rand::Rng;
use serde_json::Value;

use crate::error::{Result, TrainErr};

pub use feed_forward::FeedForward;
pub use loss::{LossFn, Mse, build_loss};

/// A trainable model over a flat parameter buffer.
///
/// `forward` caches whatever the following `backward` call needs, so
/// the two must be called in pairs on the same batch during training.
pub trait PredictiveModel {
    /// Ordered input feature names, one per input column.
    fn input_names(&self) -> &[String];

    /// Ordered output names, one per target column.
    fn output_names(&self) -> &[String];

    /// Total number of trainable parameters.
    fn num_params(&self) -> usize;

    fn params(&self) -> &[f32];

    fn params_mut(&mut self) -> &mut [f32];

    /// Predictions for a batch, one row per instance.
    fn forward(&mut self, x: ArrayView2<f32>) -> Array2<f32>;

    /// Writes the parameter gradient for the last forwarded batch into
    /// `grad`, given the loss gradient at the output.
    fn backward(&mut self, d_out: ArrayView2<f32>, grad: &mut [f32]);
}

/// Constructs a model from its resolved configuration mapping.
///
/// The architecture namespace is closed: `model.arch` must name one of
/// the registered architectures.
///
/// # Errors
/// Returns `MissingKey` if `model.arch` is absent and
/// `UnknownArchitecture` for unregistered tags; construction errors of
/// the selected architecture propagate as-is.
pub fn construct_model<R: Rng>(model_cfg: &Value, rng: &mut R) -> Result<Box<dyn PredictiveModel>> {
    let arch = model_cfg
        .get("arch")
        .and_then(Value::as_str)
        .ok_or(TrainErr::MissingKey { key: "model.arch" })?;

    match arch {
        "feed_forward" => Ok(Box::new(FeedForward::from_args(&model_cfg["args"], rng)?)),
        other => Err(TrainErr::UnknownArchitecture {
            name: other.to_string(),
        }),
    }
}
