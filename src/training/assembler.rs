use std::{
    env, fs,
    path::{Path, PathBuf},
};

use rand::Rng;
use serde_json::{Map, Value, json};

use crate::configs::{jsonize, write_config};
use crate::error::{Result, TrainErr};
use crate::model::{PredictiveModel, construct_model};

/// The conventional location runs land in when no base directory is
/// given.
pub fn default_base_dir() -> PathBuf {
    env::temp_dir().join("models")
}

/// Canonical run name: the output names joined by `-`, suffixed with
/// the aggregation mode.
pub fn run_name(out_names: &[String], onsetwise: bool) -> String {
    let mode = if onsetwise { "onsetwise" } else { "notewise" };
    format!("{}-{mode}", out_names.join("-"))
}

/// Everything the assembler produces for one run.
pub struct AssembledRun {
    pub model: Box<dyn PredictiveModel>,
    pub config: Value,
    pub name: String,
    pub run_dir: PathBuf,
}

/// Materializes a run from a configuration template and the dataset's
/// feature name lists.
///
/// The template is never mutated: a resolved copy receives the feature
/// names and sizes under `model.args`, is normalized with [`jsonize`],
/// and is persisted as `<run_dir>/config.json`, the source of truth
/// for reproducing the run. The run directory is created idempotently.
///
/// # Errors
/// Returns `MissingKey` if the template lacks `onsetwise` or `model`,
/// `InvalidConfig` if `out_names` is empty (no run name can be
/// derived), `UnknownArchitecture` from the model factory, and `Io`
/// for directory or file failures.
pub fn setup_model<R: Rng>(
    template: &Value,
    in_names: &[String],
    out_names: &[String],
    base_dir: &Path,
    rng: &mut R,
) -> Result<AssembledRun> {
    if out_names.is_empty() {
        return Err(TrainErr::InvalidConfig(
            "output names must not be empty".into(),
        ));
    }

    let onsetwise = template
        .get("onsetwise")
        .and_then(Value::as_bool)
        .ok_or(TrainErr::MissingKey { key: "onsetwise" })?;
    let name = run_name(out_names, onsetwise);

    let mut resolved = template.clone();
    let model_cfg = resolved
        .get_mut("model")
        .and_then(Value::as_object_mut)
        .ok_or(TrainErr::MissingKey { key: "model" })?;
    let args = model_cfg
        .entry("args")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| TrainErr::InvalidConfig("model.args must be a mapping".into()))?;

    args.insert("input_names".into(), json!(in_names));
    args.insert("input_size".into(), json!(in_names.len()));
    args.insert("output_names".into(), json!(out_names));
    args.insert("output_size".into(), json!(out_names.len()));

    let resolved = jsonize(&resolved);

    let run_dir = base_dir.join(&name);
    fs::create_dir_all(&run_dir)?;
    write_config(&run_dir.join("config.json"), &resolved)?;
    log::info!("run '{name}' prepared in {}", run_dir.display());

    let model = construct_model(&resolved["model"], rng)?;

    Ok(AssembledRun {
        model,
        config: resolved,
        name,
        run_dir,
    })
}
