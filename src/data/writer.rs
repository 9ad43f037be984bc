use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::loader::{delimiter_byte, extension, format_for_extension, COLUMNS};
use super::model::{ObservationRecord, ObservationTable};
use crate::config::TableFormat;
use crate::error::TableResult;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Save `table` to `path` in the format implied by its extension
/// (the same mapping `load_file` uses).
pub fn save_file(table: &ObservationTable, path: &Path) -> TableResult<()> {
    let ext = extension(path);
    match format_for_extension(&ext)? {
        TableFormat::Delimited => {
            let delimiter = delimiter_byte(None, &ext)?;
            let file = File::create(path)?;
            write_delimited(table, BufWriter::new(file), delimiter)?;
        }
        TableFormat::Json => {
            let mut out = BufWriter::new(File::create(path)?);
            write_json(table, &mut out)?;
            out.flush()?;
        }
        TableFormat::Parquet => write_parquet(table, path)?,
    }
    log::info!("wrote {} observations to {}", table.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Header row, then one row per record in table order. Floats use Rust's
/// shortest round-trip representation so reloading reproduces every value.
pub fn write_delimited<W: Write>(
    table: &ObservationTable,
    writer: W,
    delimiter: u8,
) -> TableResult<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    out.write_record(COLUMNS)?;
    for rec in table.records() {
        out.write_record([
            rec.band.token().to_string(),
            rec.log10_frequency_hz.to_string(),
            rec.log10_luminosity_erg_s.to_string(),
            rec.source_citation.clone(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

pub fn write_json<W: Write>(table: &ObservationTable, writer: W) -> TableResult<()> {
    serde_json::to_writer_pretty(writer, table.records())?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Arrow schema shared by the Parquet writer and loader.
pub fn arrow_schema() -> Schema {
    Schema::new(vec![
        Field::new(COLUMNS[0], DataType::Utf8, false),
        Field::new(COLUMNS[1], DataType::Float64, false),
        Field::new(COLUMNS[2], DataType::Float64, false),
        Field::new(COLUMNS[3], DataType::Utf8, false),
    ])
}

/// Build one Arrow record batch from `records`, keeping their order.
pub fn record_batch<'a, I>(records: I) -> TableResult<RecordBatch>
where
    I: IntoIterator<Item = &'a ObservationRecord>,
{
    let records: Vec<&ObservationRecord> = records.into_iter().collect();

    let band_array = StringArray::from(
        records.iter().map(|r| r.band.token()).collect::<Vec<_>>(),
    );
    let freq_array = Float64Array::from(
        records.iter().map(|r| r.log10_frequency_hz).collect::<Vec<_>>(),
    );
    let lum_array = Float64Array::from(
        records
            .iter()
            .map(|r| r.log10_luminosity_erg_s)
            .collect::<Vec<_>>(),
    );
    let cite_array = StringArray::from(
        records
            .iter()
            .map(|r| r.source_citation.as_str())
            .collect::<Vec<_>>(),
    );

    let batch = RecordBatch::try_new(
        Arc::new(arrow_schema()),
        vec![
            Arc::new(band_array),
            Arc::new(freq_array),
            Arc::new(lum_array),
            Arc::new(cite_array),
        ],
    )?;
    Ok(batch)
}

pub fn write_parquet(table: &ObservationTable, path: &Path) -> TableResult<()> {
    let batch = record_batch(table.records())?;
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
