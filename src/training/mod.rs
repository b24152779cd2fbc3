pub mod assembler;
pub mod orchestrator;
pub mod trainer;

pub use assembler::{AssembledRun, default_base_dir, run_name, setup_model};
pub use orchestrator::train_model;
pub use trainer::{SupervisedTrainer, TrainingSummary, evaluate};
