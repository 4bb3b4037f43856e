use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// Signal – one logged or simulated time series
// ---------------------------------------------------------------------------

/// A named, uniformly sampled time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub values: Vec<f64>,
    /// Physical unit label; opaque to the engine.
    pub signal_unit: String,
    /// Time between consecutive samples, in `time_unit`.
    pub sampling_period: f64,
    pub time_unit: String,
    /// Timestamp of the first sample.
    #[serde(default)]
    pub start_time: f64,
}

impl Signal {
    pub fn new(
        name: impl Into<String>,
        values: Vec<f64>,
        signal_unit: impl Into<String>,
        sampling_period: f64,
        time_unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            values,
            signal_unit: signal_unit.into(),
            sampling_period,
            time_unit: time_unit.into(),
            start_time: 0.0,
        }
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Duration covered by the samples, `(len - 1) * sampling_period`.
    pub fn extent(&self) -> f64 {
        self.values.len().saturating_sub(1) as f64 * self.sampling_period
    }

    /// Timestamp of the last sample.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.extent()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Group – INPUT / OUTPUT partition of the columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Group {
    Input,
    Output,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::Input => write!(f, "INPUT"),
            Group::Output => write!(f, "OUTPUT"),
        }
    }
}

impl FromStr for Group {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INPUT" => Ok(Group::Input),
            "OUTPUT" => Ok(Group::Output),
            other => Err(DatasetError::MalformedTable(format!(
                "unknown group label '{other}' (expected INPUT or OUTPUT)"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the rectangular, column-major storage behind a Dataset
// ---------------------------------------------------------------------------

/// Identity of a column: (group, name, unit).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnId {
    pub group: Group,
    pub name: String,
    pub unit: String,
}

impl ColumnId {
    pub fn new(group: Group, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            group,
            name: name.into(),
            unit: unit.into(),
        }
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} [{}]", self.group, self.name, self.unit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    /// One value per row of the table; `NaN` marks a missing sample.
    pub values: Vec<f64>,
}

/// Time-indexed table with labelled columns.
///
/// This is both the external tabular input accepted by
/// [`Dataset::from_table`](super::dataset::Dataset::from_table) and the
/// internal storage of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub time_unit: String,
    /// Row index (timestamps).
    pub time: Vec<f64>,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(time_unit: impl Into<String>, time: Vec<f64>) -> Self {
        Self {
            time_unit: time_unit.into(),
            time,
            columns: Vec::new(),
        }
    }

    /// Builder-style column append.
    pub fn with_column(mut self, id: ColumnId, values: Vec<f64>) -> Self {
        self.columns.push(Column { id, values });
        self
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id.name == name)
    }

    /// Columns of one group, in table order.
    pub fn group(&self, group: Group) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(move |c| c.id.group == group)
    }

    /// Keep only the rows whose index satisfies `keep`.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        let mask = keep.iter().copied();
        self.time = self
            .time
            .iter()
            .zip(mask.clone())
            .filter_map(|(t, k)| k.then_some(*t))
            .collect();
        for col in &mut self.columns {
            col.values = col
                .values
                .iter()
                .zip(mask.clone())
                .filter_map(|(v, k)| k.then_some(*v))
                .collect();
        }
    }

    /// Stable reorder: INPUT columns first, then OUTPUT.
    pub(crate) fn sort_groups(&mut self) {
        self.columns.sort_by_key(|c| c.id.group);
    }
}
