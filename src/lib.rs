//! Build time-aligned, uniformly sampled datasets from measurement logs so
//! that a real process and a candidate model can be compared on the same
//! grid.
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use sigalign::{Dataset, DatasetConfig, Group, NanMethod, Signal};
//!
//! let u = Signal::new("throttle", vec![0.0, 0.5, 1.0, 1.0], "%", 0.5, "s");
//! let y = Signal::new("speed", vec![0.0, 0.2, 0.4, 0.7, 0.9, 1.0, 1.1], "m/s", 0.25, "s");
//! let roles = BTreeMap::from([
//!     ("throttle".to_string(), Group::Input),
//!     ("speed".to_string(), Group::Output),
//! ]);
//!
//! let ds = Dataset::from_signals("run-1", vec![u, y], &roles, &DatasetConfig::default())?;
//! let centred = ds.remove_means().replace_nans(NanMethod::Interpolate)?;
//! let values = centred.get_dataset_values();
//! # Ok::<(), sigalign::DatasetError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod utils;

// Re-export main types
pub use config::DatasetConfig;
pub use data::compare::{compare_datasets, datasets_match, DiffReport, Divergence, StructuralDiff, Tolerance};
pub use data::coverage::{Coverage, SignalCoverage};
pub use data::dataset::{Dataset, DatasetValues};
pub use data::manipulation::NanMethod;
pub use data::model::{Column, ColumnId, Group, Signal, Table};
pub use data::sampling::{fix_sampling_periods, Interpolation};
pub use data::validation::{dataframe_validation, signals_validation};
pub use error::{DatasetError, Result};
