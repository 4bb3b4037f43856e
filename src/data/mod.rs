/// Data layer: signal model, validation, alignment, and derived operations.
///
/// Architecture:
/// ```text
///  Vec<Signal>                 .parquet / .json / .csv
///        │                              │
///        ▼                              ▼
///   ┌────────────┐               ┌──────────┐
///   │ validation │               │  loader   │  parse file → Table
///   └────────────┘               └──────────┘
///        │                              │
///        ▼                              ▼
///   ┌──────────┐                 ┌────────────┐
///   │ sampling  │  common period │ validation │  dataframe checks
///   └──────────┘                 └────────────┘
///        │                              │
///        └──────────────┬───────────────┘
///                       ▼
///                ┌─────────────┐
///                │   Dataset    │  aligned INPUT/OUTPUT table + coverage
///                └─────────────┘
///                       │
///        ┌──────────────┼────────────────┐
///        ▼              ▼                ▼
///  ┌──────────────┐ ┌──────────┐   ┌──────────┐
///  │ manipulation │ │ coverage │   │ compare   │
///  │  (+ filter)  │ └──────────┘   └──────────┘
///  └──────────────┘
/// ```

pub mod compare;
pub mod coverage;
pub mod dataset;
pub mod filter;
pub mod loader;
pub mod manipulation;
pub mod model;
pub mod sampling;
pub mod validation;
