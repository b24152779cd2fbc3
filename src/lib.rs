pub mod configs;
pub mod data;
pub mod error;
pub mod model;
pub mod optimization;
pub mod training;

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;

pub use error::{Result, TrainErr};

use crate::configs::{DataSettings, TrainSettings};
use crate::data::{BatchMode, BatchSource, DatasetBundle, SplitRatios, split_groups};
use crate::model::{PredictiveModel, build_loss};
use crate::training::{TrainingSummary, evaluate, setup_model, train_model};

/// Builds the run's single random source: seeded for reproducible
/// splits and shuffles, from OS entropy otherwise.
pub fn generate_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Everything one finished run hands back to its caller.
pub struct RunOutcome {
    pub name: String,
    pub run_dir: PathBuf,
    pub summary: TrainingSummary,
    pub test_loss: f32,
    pub model: Box<dyn PredictiveModel>,
}

/// Runs the whole pipeline: load the bundle, split its groups, build
/// the batch sources, assemble the model and run directory, train, and
/// evaluate the held-out test subset once.
///
/// # Errors
/// Surfaces every component's errors unchanged; nothing is caught and
/// converted along the way.
pub fn run(bundle_path: &Path, config: &Value, base_dir: &Path) -> Result<RunOutcome> {
    let bundle = DatasetBundle::load(bundle_path)?;
    let settings = DataSettings::from_config(config)?;
    let ratios = SplitRatios::new(settings.test_size, settings.valid_size)?;

    let mut rng = generate_rng(settings.seed);
    let split = split_groups(bundle.dataset.num_groups(), &ratios, &mut rng);

    let batch_size = settings.batch_size;
    let train_source =
        BatchSource::from_subset(&bundle.dataset, &split.train, batch_size, BatchMode::Shuffled);
    let valid_source =
        BatchSource::from_subset(&bundle.dataset, &split.valid, batch_size, BatchMode::Sequential);
    let test_source =
        BatchSource::from_subset(&bundle.dataset, &split.test, batch_size, BatchMode::Sequential);

    let assembled = setup_model(
        config,
        &bundle.in_names,
        &bundle.out_names,
        base_dir,
        &mut rng,
    )?;

    let (mut model, summary) = train_model(
        assembled.model,
        &assembled.config,
        train_source,
        valid_source,
        &assembled.run_dir,
        rng,
    )?;

    let loss_fn = build_loss(&TrainSettings::from_config(&assembled.config)?.loss)?;
    let test_loss = evaluate(&mut *model, &loss_fn, &test_source);
    log::info!("test loss for '{}': {test_loss:.6}", assembled.name);

    Ok(RunOutcome {
        name: assembled.name,
        run_dir: assembled.run_dir,
        summary,
        test_loss,
        model,
    })
}
