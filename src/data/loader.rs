use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, Float32Array, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;

use super::model::{Column, ColumnId, Group, Table};

/// Name of the index column in Parquet files.
pub const TIME_COLUMN: &str = "time";
/// Field-metadata keys used to label Parquet columns.
pub const META_GROUP: &str = "group";
pub const META_UNIT: &str = "unit";
pub const META_TIME_UNIT: &str = "time_unit";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – `time` column plus one float column per signal, labelled
///   through field metadata (recommended)
/// * `.json`    – `{ "time_unit", "time": [...], "columns": [...] }`
/// * `.csv`     – three header rows (group / name / unit), then data rows
///
/// The result is not validated; pass it to
/// [`Dataset::from_table`](super::dataset::Dataset::from_table).
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (`null` marks a missing sample):
///
/// ```json
/// {
///   "time_unit": "s",
///   "time": [0.0, 0.1, 0.2],
///   "columns": [
///     { "group": "INPUT",  "name": "u1", "unit": "V",   "values": [1.0, 1.1, 1.2] },
///     { "group": "OUTPUT", "name": "y1", "unit": "rpm", "values": [0.0, null, 3.5] }
///   ]
/// }
/// ```
#[derive(Deserialize)]
struct TableRecord {
    time_unit: String,
    time: Vec<f64>,
    columns: Vec<ColumnRecord>,
}

#[derive(Deserialize)]
struct ColumnRecord {
    group: String,
    name: String,
    #[serde(default)]
    unit: String,
    values: Vec<Option<f64>>,
}

fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub fn parse_json(text: &str) -> Result<Table> {
    let record: TableRecord = serde_json::from_str(text).context("parsing JSON table")?;

    let columns = record
        .columns
        .into_iter()
        .map(|c| {
            let group: Group = c
                .group
                .parse()
                .with_context(|| format!("column '{}'", c.name))?;
            Ok(Column {
                id: ColumnId::new(group, c.name, c.unit),
                values: c.values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Table {
        time_unit: record.time_unit,
        time: record.time,
        columns,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout – a two-level column label spread over three header rows,
/// the first column holding the time index:
///
/// ```text
/// time,INPUT,INPUT,OUTPUT
/// s,u1,u2,y1
/// ,V,A,rpm
/// 0.0,1.0,0.5,12.0
/// 0.1,1.1,,12.5
/// ```
///
/// The time unit sits under the `time` label.  Empty cells are missing
/// samples.
fn load_csv(path: &Path) -> Result<Table> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context("opening CSV")?;
    read_csv(reader)
}

pub fn parse_csv(text: &str) -> Result<Table> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes());
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Table> {
    let mut records = reader.records();
    let mut header = |what: &str| -> Result<csv::StringRecord> {
        records
            .next()
            .with_context(|| format!("CSV missing {what} header row"))?
            .with_context(|| format!("reading CSV {what} header row"))
    };
    let groups = header("group")?;
    let names = header("name")?;
    let units = header("unit")?;

    let time_unit = names.get(0).unwrap_or("").trim().to_string();
    let mut columns = Vec::with_capacity(groups.len().saturating_sub(1));
    for idx in 1..groups.len() {
        let name = names.get(idx).unwrap_or("").trim();
        let group: Group = groups
            .get(idx)
            .unwrap_or("")
            .parse()
            .with_context(|| format!("CSV column {idx} ('{name}')"))?;
        let unit = units.get(idx).unwrap_or("").trim();
        columns.push(Column {
            id: ColumnId::new(group, name, unit),
            values: Vec::new(),
        });
    }

    let mut time = Vec::new();
    for (row_no, result) in records.enumerate() {
        let record = result.with_context(|| format!("CSV data row {row_no}"))?;
        let t = record.get(0).unwrap_or("").trim();
        time.push(
            t.parse::<f64>()
                .with_context(|| format!("Row {row_no}: '{t}' is not a timestamp"))?,
        );
        for (idx, col) in columns.iter_mut().enumerate() {
            let cell = record.get(idx + 1).unwrap_or("").trim();
            col.values.push(parse_sample(cell, row_no, &col.id.name)?);
        }
    }

    Ok(Table {
        time_unit,
        time,
        columns,
    })
}

fn parse_sample(cell: &str, row: usize, col: &str) -> Result<f64> {
    if cell.is_empty() {
        return Ok(f64::NAN);
    }
    cell.parse::<f64>()
        .with_context(|| format!("Row {row}, '{col}': '{cell}' is not a number"))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding a table.
///
/// Expected schema:
/// - `time`: Float64, field metadata `time_unit`
/// - every other column: Float64 or Float32, field metadata `group`
///   (`INPUT` / `OUTPUT`) and optionally `unit`; nulls are missing samples
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let time_idx = schema
        .index_of(TIME_COLUMN)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{TIME_COLUMN}' column"))?;
    let mut table = empty_table(&schema, time_idx)?;

    let reader = builder.build().context("building parquet reader")?;
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        table
            .time
            .extend(extract_f64(batch.column(time_idx)).context("reading time column")?);
        let data_cols = (0..batch.num_columns()).filter(|i| *i != time_idx);
        for (col, idx) in table.columns.iter_mut().zip(data_cols) {
            let values = extract_f64(batch.column(idx))
                .with_context(|| format!("reading column '{}'", col.id.name))?;
            col.values.extend(values);
        }
    }

    Ok(table)
}

/// Table skeleton (labels, no rows) from the file schema.
fn empty_table(schema: &Schema, time_idx: usize) -> Result<Table> {
    let time_unit = schema
        .field(time_idx)
        .metadata()
        .get(META_TIME_UNIT)
        .cloned()
        .unwrap_or_default();

    let columns = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_idx)
        .map(|(_, field)| {
            let meta = field.metadata();
            let group: Group = meta
                .get(META_GROUP)
                .with_context(|| format!("column '{}' has no group label", field.name()))?
                .parse()
                .with_context(|| format!("column '{}'", field.name()))?;
            let unit = meta.get(META_UNIT).cloned().unwrap_or_default();
            Ok(Column {
                id: ColumnId::new(group, field.name().clone(), unit),
                values: Vec::new(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Table {
        time_unit,
        time: Vec::new(),
        columns,
    })
}

// -- Arrow helpers --

/// Float column → `Vec<f64>`, nulls become `NaN`.
fn extract_f64(col: &ArrayRef) -> Result<Vec<f64>> {
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!("expected Float64 or Float32 column, got {:?}", col.data_type())
    }
}

/// Arrow form of a table, following the Parquet layout read by
/// [`load_file`].  Missing samples are written as nulls.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(TIME_COLUMN, DataType::Float64, false).with_metadata(
        HashMap::from([(META_TIME_UNIT.to_string(), table.time_unit.clone())]),
    )];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(Float64Array::from(table.time.clone()))];

    for col in &table.columns {
        fields.push(
            Field::new(col.id.name.as_str(), DataType::Float64, true).with_metadata(HashMap::from(
                [
                    (META_GROUP.to_string(), col.id.group.to_string()),
                    (META_UNIT.to_string(), col.id.unit.clone()),
                ],
            )),
        );
        let values: Float64Array = col
            .values
            .iter()
            .map(|v| (!v.is_nan()).then_some(*v))
            .collect();
        arrays.push(Arc::new(values));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("building record batch")
}
