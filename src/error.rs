use std::{error::Error, fmt, io};

/// The result type used across the crate.
pub type Result<T> = std::result::Result<T, TrainErr>;

/// All errors that can occur while preparing or orchestrating a run.
#[derive(Debug)]
pub enum TrainErr {
    /// Malformed configuration value, caught before any work starts.
    InvalidConfig(String),
    /// A key the configuration template must carry is absent.
    MissingKey { key: &'static str },
    /// A required entry of `train_args` is absent.
    MissingRequiredArg { key: &'static str },
    /// The optimizer descriptor names something outside the registry.
    UnknownOptimizer { name: String },
    /// The model configuration names an architecture outside the registry.
    UnknownArchitecture { name: String },
    /// Two buffers that must agree in length do not.
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// An underlying I/O error.
    Io(io::Error),
    /// Configuration JSON could not be read or written.
    Json(serde_json::Error),
    /// The dataset bundle could not be decoded or encoded.
    Bundle(bincode::Error),
}

impl fmt::Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            TrainErr::MissingKey { key } => write!(f, "missing config key: {key}"),
            TrainErr::MissingRequiredArg { key } => {
                write!(f, "missing required training arg: {key}")
            }
            TrainErr::UnknownOptimizer { name } => write!(f, "unknown optimizer: {name}"),
            TrainErr::UnknownArchitecture { name } => write!(f, "unknown architecture: {name}"),
            TrainErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(f, "size mismatch for {what}: got {got}, expected {expected}"),
            TrainErr::Io(e) => write!(f, "io error: {e}"),
            TrainErr::Json(e) => write!(f, "json error: {e}"),
            TrainErr::Bundle(e) => write!(f, "bundle error: {e}"),
        }
    }
}

impl Error for TrainErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainErr::Io(e) => Some(e),
            TrainErr::Json(e) => Some(e),
            TrainErr::Bundle(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TrainErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for TrainErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<bincode::Error> for TrainErr {
    fn from(value: bincode::Error) -> Self {
        Self::Bundle(value)
    }
}
