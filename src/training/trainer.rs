use std::{
    fs,
    path::{Path, PathBuf},
};

use rand::Rng;

use crate::data::BatchSource;
use crate::error::Result;
use crate::model::{LossFn, PredictiveModel};
use crate::optimization::Optimizer;

/// What a finished (or early-stopped) training run reports back.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs_run: usize,
    pub train_losses: Vec<f32>,
    pub valid_losses: Vec<f32>,
    pub best_valid_loss: f32,
}

/// Average loss of `model` over one pass of `source`, without updates.
pub fn evaluate<L: LossFn>(
    model: &mut dyn PredictiveModel,
    loss_fn: &L,
    source: &BatchSource,
) -> f32 {
    let mut total = 0.0;
    let mut num_batches = 0;

    for (x, y) in source.batches() {
        let y_pred = model.forward(x.view());
        total += loss_fn.loss(y_pred.view(), y.view());
        num_batches += 1;
    }

    if num_batches == 0 {
        0.0
    } else {
        total / num_batches as f32
    }
}

/// Owns the epoch loop of one run: per-epoch reshuffled training
/// batches, a validation pass, best-model tracking, early stopping and
/// periodic parameter checkpoints in the run directory.
pub struct SupervisedTrainer<L: LossFn, R: Rng> {
    model: Box<dyn PredictiveModel>,
    optimizer: Box<dyn Optimizer>,
    loss_fn: L,
    train_source: BatchSource,
    valid_source: BatchSource,
    out_dir: PathBuf,

    epochs: usize,
    early_stopping: usize,
    checkpoint_every: usize,
    rng: R,
}

impl<L: LossFn, R: Rng> SupervisedTrainer<L, R> {
    /// Returns a new `SupervisedTrainer`.
    ///
    /// # Arguments
    /// * `model` - The model that will be trained.
    /// * `optimizer` - The update rule, sized for the model's parameters.
    /// * `loss_fn` - The objective shared by training and validation.
    /// * `train_source` - Shuffled batch source for the train subset.
    /// * `valid_source` - Sequential batch source for the validation subset.
    /// * `out_dir` - The run directory checkpoints are written into.
    /// * `epochs` - Upper bound on the number of epochs.
    /// * `early_stopping` - Patience in epochs; `0` disables it.
    /// * `checkpoint_every` - Checkpoint cadence in epochs; `0` disables it.
    /// * `rng` - A random number generator for the per-epoch reshuffle.
    pub fn new(
        model: Box<dyn PredictiveModel>,
        optimizer: Box<dyn Optimizer>,
        loss_fn: L,
        train_source: BatchSource,
        valid_source: BatchSource,
        out_dir: PathBuf,
        epochs: usize,
        early_stopping: usize,
        checkpoint_every: usize,
        rng: R,
    ) -> Self {
        Self {
            model,
            optimizer,
            loss_fn,
            train_source,
            valid_source,
            out_dir,
            epochs,
            early_stopping,
            checkpoint_every,
            rng,
        }
    }

    /// Runs the epoch loop to completion or early stop.
    ///
    /// # Returns
    /// The trained model and a summary of the run.
    pub fn train(mut self) -> Result<(Box<dyn PredictiveModel>, TrainingSummary)> {
        let mut grad = vec![0.0; self.model.num_params()];
        let mut train_losses = Vec::with_capacity(self.epochs);
        let mut valid_losses = Vec::with_capacity(self.epochs);
        let mut best_valid_loss = f32::INFINITY;
        let mut epochs_since_best = 0;

        for epoch in 1..=self.epochs {
            self.train_source.begin_epoch(&mut self.rng);

            let mut total = 0.0;
            let mut num_batches = 0;
            for (x, y) in self.train_source.batches() {
                let y_pred = self.model.forward(x.view());
                total += self.loss_fn.loss(y_pred.view(), y.view());
                num_batches += 1;

                grad.fill(0.0);
                let d = self.loss_fn.loss_prime(y_pred.view(), y.view());
                self.model.backward(d.view(), &mut grad);
                self.optimizer
                    .update_params(&grad, self.model.params_mut())?;
            }

            let train_loss = if num_batches == 0 {
                0.0
            } else {
                total / num_batches as f32
            };
            let valid_loss = evaluate(&mut *self.model, &self.loss_fn, &self.valid_source);
            log::info!("epoch {epoch}: train loss {train_loss:.6}, valid loss {valid_loss:.6}");

            train_losses.push(train_loss);
            valid_losses.push(valid_loss);

            if valid_loss < best_valid_loss {
                best_valid_loss = valid_loss;
                epochs_since_best = 0;
                self.save_params(&self.out_dir.join("best.params"))?;
            } else {
                epochs_since_best += 1;
            }

            if self.checkpoint_every > 0 && epoch % self.checkpoint_every == 0 {
                let path = self.out_dir.join(format!("checkpoint-epoch-{epoch}.params"));
                self.save_params(&path)?;
            }

            if self.early_stopping > 0 && epochs_since_best >= self.early_stopping {
                log::info!(
                    "no validation improvement for {epochs_since_best} epoch(s), stopping early"
                );
                break;
            }
        }

        let summary = TrainingSummary {
            epochs_run: train_losses.len(),
            train_losses,
            valid_losses,
            best_valid_loss,
        };

        Ok((self.model, summary))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self.model.params())?;
        fs::write(path, bytes)?;
        Ok(())
    }
}
