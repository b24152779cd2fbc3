use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use super::dataset::GroupedDataset;
use crate::error::{Result, TrainErr};

/// The persisted container a run starts from: the grouped dataset plus
/// the ordered input/output feature name lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetBundle {
    pub dataset: GroupedDataset,
    pub in_names: Vec<String>,
    pub out_names: Vec<String>,
}

impl DatasetBundle {
    /// Creates a bundle, checking that the name lists match the
    /// dataset's instance widths.
    ///
    /// # Errors
    /// Returns `SizeMismatch` if a name list disagrees with its width.
    pub fn new(
        dataset: GroupedDataset,
        in_names: Vec<String>,
        out_names: Vec<String>,
    ) -> Result<Self> {
        let bundle = Self {
            dataset,
            in_names,
            out_names,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Reads and decodes a bundle file.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, `Bundle` if it cannot
    /// be decoded, `SizeMismatch` if the decoded content is inconsistent.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let bundle: Self = bincode::deserialize(&bytes)?;
        bundle.validate()?;
        log::info!(
            "loaded bundle '{}': {} groups, {} instances, {} -> {} features",
            path.display(),
            bundle.dataset.num_groups(),
            bundle.dataset.num_instances(),
            bundle.in_names.len(),
            bundle.out_names.len(),
        );
        Ok(bundle)
    }

    /// Encodes and writes the bundle.
    ///
    /// # Errors
    /// Returns `Bundle` if encoding fails, `Io` if the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self)?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.in_names.len() != self.dataset.x_size() {
            return Err(TrainErr::SizeMismatch {
                what: "in_names",
                got: self.in_names.len(),
                expected: self.dataset.x_size(),
            });
        }
        if self.out_names.len() != self.dataset.y_size() {
            return Err(TrainErr::SizeMismatch {
                what: "out_names",
                got: self.out_names.len(),
                expected: self.dataset.y_size(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    #[test]
    fn new_rejects_wrong_name_widths() {
        let ds = GroupedDataset::new(2, 1);
        let err = DatasetBundle::new(ds, names("x", 3), names("y", 1)).unwrap_err();
        assert!(matches!(
            err,
            TrainErr::SizeMismatch {
                what: "in_names",
                got: 3,
                expected: 2,
            }
        ));
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut ds = GroupedDataset::new(2, 1);
        ds.push_group("a", vec![0.0, 1.0, 2.0, 3.0], vec![10.0, 11.0]);
        let bundle = DatasetBundle::new(ds, names("x", 2), names("y", 1)).unwrap();

        let path = std::env::temp_dir().join(format!(
            "expressive_training_bundle_{}.bundle",
            std::process::id()
        ));
        bundle.save(&path).unwrap();
        let loaded = DatasetBundle::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, bundle);
    }
}
