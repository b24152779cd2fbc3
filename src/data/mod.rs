pub mod bundle;
pub mod dataset;
pub mod loader;
pub mod split;

pub use bundle::DatasetBundle;
pub use dataset::{Group, GroupedDataset};
pub use loader::{BatchMode, BatchSource, Batches};
pub use split::{SplitAssignment, SplitRatios, split_groups};
