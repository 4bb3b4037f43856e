// Error taxonomy for dataset construction and manipulation

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatasetError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    // -- input shape --
    #[error("Empty input: no signals were supplied")]
    EmptyInput,

    #[error("Duplicate signal name: '{0}'")]
    DuplicateName(String),

    #[error("Signal '{name}': invalid value {value} at sample {index}")]
    InvalidValues {
        name: String,
        index: usize,
        value: f64,
    },

    #[error("Signal '{name}': sampling period {period} is not a positive finite number")]
    InvalidSamplingPeriod { name: String, period: f64 },

    #[error("Signal '{name}': time unit '{found}' differs from '{expected}'")]
    InconsistentTimeUnit {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Malformed table: {0}")]
    MalformedTable(String),

    // -- construction --
    #[error("No INPUT signals in dataset")]
    NoInputSignals,

    #[error("No OUTPUT signals in dataset")]
    NoOutputSignals,

    #[error("Signals share no common time interval (latest start {start}, earliest end {end})")]
    EmptyIntersection { start: f64, end: f64 },

    #[error("Signal '{name}': extent {extent} is shorter than the target period {target}")]
    UnresamplableSignal {
        name: String,
        extent: f64,
        target: f64,
    },

    // -- manipulation --
    #[error("Signal not found: '{0}'")]
    UnknownSignal(String),

    #[error("Signal '{name}': cutoff {cutoff} must lie in (0, {nyquist}) (Nyquist)")]
    InvalidCutoff {
        name: String,
        cutoff: f64,
        nyquist: f64,
    },

    #[error("Operation left the dataset without samples")]
    EmptyDataset,
}
