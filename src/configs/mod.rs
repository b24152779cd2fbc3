pub mod jsonize;
pub mod run;

pub use jsonize::{jsonize, read_config, write_config};
pub use run::{DataSettings, TrainSettings, load_config};
