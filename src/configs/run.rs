use std::{fs, num::NonZeroUsize, path::Path};

use serde_json::{Map, Value};

use crate::error::{Result, TrainErr};

/// Reads a run configuration template from a JSON file.
///
/// # Errors
/// Returns `Io` if the file cannot be read, `Json` if it is not valid
/// JSON.
pub fn load_config(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// The `train_args` entries the data-preparation stage consumes:
/// batch size, split fractions, and the run seed.
#[derive(Debug, Clone, Copy)]
pub struct DataSettings {
    pub batch_size: NonZeroUsize,
    pub test_size: f64,
    pub valid_size: f64,
    pub seed: Option<u64>,
}

impl DataSettings {
    /// Extracts the data-stage settings from a run configuration.
    ///
    /// # Errors
    /// Returns `MissingKey` if `train_args` is absent,
    /// `MissingRequiredArg` if the batch size is absent, and
    /// `InvalidConfig` if it is zero.
    pub fn from_config(config: &Value) -> Result<Self> {
        let t = config
            .get("train_args")
            .ok_or(TrainErr::MissingKey { key: "train_args" })?;

        let raw = t.get("batch_size").and_then(Value::as_u64).ok_or(
            TrainErr::MissingRequiredArg {
                key: "train_args.batch_size",
            },
        )?;
        let batch_size = NonZeroUsize::new(raw as usize)
            .ok_or_else(|| TrainErr::InvalidConfig("batch_size must be greater than zero".into()))?;

        Ok(Self {
            batch_size,
            test_size: t["test_size"].as_f64().unwrap_or(0.2),
            valid_size: t["valid_size"].as_f64().unwrap_or(0.2),
            seed: t["seed"].as_u64(),
        })
    }
}

/// The `train_args` entries the orchestrator consumes: the optimizer
/// descriptor, the loss tag, and the epoch-loop settings forwarded to
/// the trainer.
#[derive(Debug, Clone)]
pub struct TrainSettings {
    pub epochs: usize,
    pub early_stopping: usize,
    pub checkpoint_every: usize,
    pub optimizer_name: String,
    pub optimizer_args: Value,
    pub loss: String,
}

impl TrainSettings {
    /// Extracts the orchestration settings from a run configuration.
    ///
    /// The optimizer descriptor is a `[name, args]` pair; `args` may be
    /// omitted. Epoch-loop settings fall back to defaults when absent.
    ///
    /// # Errors
    /// Returns `MissingKey` if `train_args` is absent,
    /// `MissingRequiredArg` if the optimizer descriptor is absent, and
    /// `InvalidConfig` if the descriptor is malformed.
    pub fn from_config(config: &Value) -> Result<Self> {
        let t = config
            .get("train_args")
            .ok_or(TrainErr::MissingKey { key: "train_args" })?;

        let descriptor = t
            .get("optimizer")
            .ok_or(TrainErr::MissingRequiredArg {
                key: "train_args.optimizer",
            })?;
        let (optimizer_name, optimizer_args) = parse_descriptor(descriptor)?;

        Ok(Self {
            epochs: t["epochs"].as_u64().unwrap_or(100) as usize,
            early_stopping: t["early_stopping"].as_u64().unwrap_or(0) as usize,
            checkpoint_every: t["checkpoint_every"].as_u64().unwrap_or(0) as usize,
            optimizer_name,
            optimizer_args,
            loss: t["loss"].as_str().unwrap_or("mse").to_string(),
        })
    }
}

fn parse_descriptor(descriptor: &Value) -> Result<(String, Value)> {
    let parts = descriptor.as_array().ok_or_else(|| {
        TrainErr::InvalidConfig("optimizer descriptor must be a [name, args] pair".into())
    })?;

    let name = parts
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| {
            TrainErr::InvalidConfig("optimizer descriptor must start with a name".into())
        })?
        .to_string();

    let args = match parts.get(1) {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(args @ Value::Object(_)) => args.clone(),
        Some(_) => {
            return Err(TrainErr::InvalidConfig(
                "optimizer args must be a mapping".into(),
            ));
        }
    };

    Ok((name, args))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn data_settings_require_batch_size() {
        let config = json!({ "train_args": {} });
        let err = DataSettings::from_config(&config).unwrap_err();
        assert!(matches!(
            err,
            TrainErr::MissingRequiredArg {
                key: "train_args.batch_size",
            }
        ));
    }

    #[test]
    fn data_settings_defaults() {
        let config = json!({ "train_args": { "batch_size": 8 } });
        let settings = DataSettings::from_config(&config).unwrap();

        assert_eq!(settings.batch_size.get(), 8);
        assert_eq!(settings.test_size, 0.2);
        assert_eq!(settings.valid_size, 0.2);
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn train_settings_read_descriptor_and_defaults() {
        let config = json!({
            "train_args": {
                "batch_size": 8,
                "epochs": 5,
                "optimizer": ["adam", { "lr": 0.001 }],
            }
        });
        let settings = TrainSettings::from_config(&config).unwrap();

        assert_eq!(settings.epochs, 5);
        assert_eq!(settings.early_stopping, 0);
        assert_eq!(settings.optimizer_name, "adam");
        assert_eq!(settings.optimizer_args["lr"].as_f64(), Some(0.001));
        assert_eq!(settings.loss, "mse");
    }

    #[test]
    fn train_settings_accept_descriptor_without_args() {
        let config = json!({
            "train_args": { "optimizer": ["gradient_descent"] }
        });
        let settings = TrainSettings::from_config(&config).unwrap();

        assert_eq!(settings.optimizer_name, "gradient_descent");
        assert!(settings.optimizer_args.as_object().unwrap().is_empty());
    }

    #[test]
    fn train_settings_reject_malformed_descriptor() {
        let config = json!({
            "train_args": { "optimizer": "adam" }
        });
        assert!(matches!(
            TrainSettings::from_config(&config),
            Err(TrainErr::InvalidConfig(_))
        ));
    }
}
