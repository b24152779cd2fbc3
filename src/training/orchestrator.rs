use std::path::Path;

use rand::Rng;
use serde_json::Value;

use super::trainer::{SupervisedTrainer, TrainingSummary};
use crate::configs::TrainSettings;
use crate::data::BatchSource;
use crate::error::Result;
use crate::model::{PredictiveModel, build_loss};
use crate::optimization::resolve_optimizer;

/// Takes an assembled model through one training run.
///
/// Builds the configured loss, resolves the optimizer descriptor
/// against the registry (one lookup, never retried), and hands model,
/// shared loss, both batch sources, the run directory and the
/// remaining training args over to the trainer, which owns every state
/// from there on.
///
/// # Errors
/// Returns `MissingRequiredArg` for absent required train args,
/// `UnknownOptimizer` for descriptors outside the registry, and
/// whatever the trainer's epoch loop surfaces.
pub fn train_model<R: Rng>(
    model: Box<dyn PredictiveModel>,
    config: &Value,
    train_source: BatchSource,
    valid_source: BatchSource,
    run_dir: &Path,
    rng: R,
) -> Result<(Box<dyn PredictiveModel>, TrainingSummary)> {
    let settings = TrainSettings::from_config(config)?;

    let loss_fn = build_loss(&settings.loss)?;
    let optimizer = resolve_optimizer(
        &settings.optimizer_name,
        &settings.optimizer_args,
        model.num_params(),
    )?;
    log::info!(
        "optimizer '{}' resolved, delegating up to {} epoch(s) to the trainer",
        settings.optimizer_name,
        settings.epochs,
    );

    let trainer = SupervisedTrainer::new(
        model,
        optimizer,
        loss_fn,
        train_source,
        valid_source,
        run_dir.to_path_buf(),
        settings.epochs,
        settings.early_stopping,
        settings.checkpoint_every,
        rng,
    );

    trainer.train()
}
