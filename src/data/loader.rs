use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use arrow::array::{Array, Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{Band, ObservationRecord, ObservationTable};
use crate::config::{LoadOptions, TableFormat};
use crate::error::{TableError, TableResult};

/// Column names shared by every tabular format, in persisted order.
pub const COLUMNS: [&str; 4] = [
    "band",
    "log10_frequency_hz",
    "log10_luminosity_erg_s",
    "source_citation",
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an observation table from a file. Dispatch by extension unless
/// `options.format` forces one.
///
/// Supported formats:
/// * `.tsv` / `.txt` / `.dat` – tab-delimited text with a header row
/// * `.csv`                   – comma-delimited text with a header row
/// * `.json`                  – `[{ "band": ..., "log10_frequency_hz": ..., ... }, ...]`
/// * `.parquet` / `.pq`       – one Utf8/Float64 column per field
pub fn load_file(path: &Path, options: &LoadOptions) -> TableResult<ObservationTable> {
    let ext = extension(path);
    let format = match options.format {
        Some(f) => f,
        None => format_for_extension(&ext)?,
    };
    log::debug!("loading {} as {format:?}", path.display());

    let table = match format {
        TableFormat::Delimited => {
            let delimiter = delimiter_byte(options.delimiter, &ext)?;
            let file = File::open(path)?;
            load_delimited(BufReader::new(file), delimiter, options)?
        }
        TableFormat::Json => load_json(BufReader::new(File::open(path)?), options)?,
        TableFormat::Parquet => load_parquet(path, options)?,
    };

    log::info!(
        "loaded {} observations ({} citations) from {}",
        table.len(),
        table.citations_used().len(),
        path.display()
    );
    Ok(table)
}

pub(crate) fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

pub(crate) fn format_for_extension(ext: &str) -> TableResult<TableFormat> {
    match ext {
        "tsv" | "txt" | "dat" | "csv" => Ok(TableFormat::Delimited),
        "json" => Ok(TableFormat::Json),
        "parquet" | "pq" => Ok(TableFormat::Parquet),
        other => Err(TableError::UnsupportedFormat(format!(
            "unrecognised file extension '.{other}'"
        ))),
    }
}

/// Delimiter for delimited text: explicit choice first, then comma for
/// `.csv`, tab for everything else.
pub(crate) fn delimiter_byte(explicit: Option<char>, ext: &str) -> TableResult<u8> {
    match explicit {
        Some(c) if c.is_ascii() => Ok(c as u8),
        Some(c) => Err(TableError::UnsupportedFormat(format!(
            "delimiter {c:?} is not a single ASCII character"
        ))),
        None if ext == "csv" => Ok(b','),
        None => Ok(b'\t'),
    }
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Delimited layout: a header row naming the four columns (any order), then
/// one row per observation. Lines starting with `#` are comments. Fields are
/// trimmed; citations containing the delimiter must be quoted.
///
/// ```text
/// band	log10_frequency_hz	log10_luminosity_erg_s	source_citation
/// radio	9.133539	31.7166	Falcke H. et al., 1998, ApJ, 499, 731
/// ```
pub fn load_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    options: &LoadOptions,
) -> TableResult<ObservationTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();

    let mut idx = [0usize; 4];
    for (slot, name) in idx.iter_mut().zip(COLUMNS) {
        *slot = headers.iter().position(|h| h == name).ok_or_else(|| {
            TableError::malformed(
                0,
                None,
                format!("header is missing the '{name}' column"),
            )
        })?;
    }
    let [band_idx, freq_idx, lum_idx, cite_idx] = idx;

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = result.map_err(|e| row_error(row, e))?;
        let line = record.position().map(|p| p.line());

        if record.len() != headers.len() {
            return Err(TableError::malformed(
                row,
                line,
                format!(
                    "expected {} fields, found {}",
                    headers.len(),
                    record.len()
                ),
            ));
        }

        let field = |j: usize| record.get(j).unwrap_or("");
        let rec = ObservationRecord {
            band: parse_band(field(band_idx), row, line)?,
            log10_frequency_hz: parse_f64(field(freq_idx), COLUMNS[1], row, line)?,
            log10_luminosity_erg_s: parse_f64(field(lum_idx), COLUMNS[2], row, line)?,
            source_citation: field(cite_idx).to_string(),
        };
        rec.validate(row, line, options)?;
        records.push(rec);
    }

    log::debug!("parsed {} delimited rows", records.len());
    Ok(ObservationTable::from_validated(records))
}

/// A row the CSV reader cannot decode (bad UTF-8, broken quoting) is a
/// malformed row; only I/O failures stay `Csv` errors.
fn row_error(row: usize, err: csv::Error) -> TableError {
    if err.is_io_error() {
        return TableError::Csv(err);
    }
    let line = err.position().map(|p| p.line());
    TableError::malformed(row, line, err.to_string())
}

fn parse_band(s: &str, row: usize, line: Option<u64>) -> TableResult<Band> {
    s.parse::<Band>()
        .map_err(|e| TableError::malformed(row, line, e.to_string()))
}

fn parse_f64(s: &str, col: &str, row: usize, line: Option<u64>) -> TableResult<f64> {
    if s.is_empty() {
        return Err(TableError::malformed(row, line, format!("{col} is empty")));
    }
    s.parse::<f64>()
        .map_err(|_| TableError::malformed(row, line, format!("{col}: '{s}' is not a number")))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct JsonRow {
    band: String,
    log10_frequency_hz: f64,
    log10_luminosity_erg_s: f64,
    source_citation: String,
}

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   {
///     "band": "radio",
///     "log10_frequency_hz": 9.133539,
///     "log10_luminosity_erg_s": 31.7166,
///     "source_citation": "Falcke H. et al., 1998, ApJ, 499, 731"
///   }
/// ]
/// ```
pub fn load_json<R: Read>(reader: R, options: &LoadOptions) -> TableResult<ObservationTable> {
    let root: JsonValue = serde_json::from_reader(reader)?;
    let rows = match root {
        JsonValue::Array(rows) => rows,
        _ => {
            return Err(TableError::malformed(
                0,
                None,
                "expected a top-level JSON array",
            ))
        }
    };

    let mut records = Vec::with_capacity(rows.len());
    for (i, value) in rows.into_iter().enumerate() {
        let row = i + 1;
        let raw: JsonRow = serde_json::from_value(value)
            .map_err(|e| TableError::malformed(row, None, e.to_string()))?;
        let rec = ObservationRecord {
            band: parse_band(&raw.band, row, None)?,
            log10_frequency_hz: raw.log10_frequency_hz,
            log10_luminosity_erg_s: raw.log10_luminosity_erg_s,
            source_citation: raw.source_citation.trim().to_string(),
        };
        rec.validate(row, None, options)?;
        records.push(rec);
    }

    Ok(ObservationTable::from_validated(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet table.
///
/// Expected schema:
/// - `band`, `source_citation`: Utf8
/// - `log10_frequency_hz`, `log10_luminosity_erg_s`: Float64
///
/// Extra columns are ignored. A null in any of the four is a malformed row.
pub fn load_parquet(path: &Path, options: &LoadOptions) -> TableResult<ObservationTable> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let bands = string_column(&batch, COLUMNS[0])?;
        let freqs = f64_column(&batch, COLUMNS[1])?;
        let lums = f64_column(&batch, COLUMNS[2])?;
        let cites = string_column(&batch, COLUMNS[3])?;

        for i in 0..batch.num_rows() {
            let row = records.len() + 1;
            if bands.is_null(i) || freqs.is_null(i) || lums.is_null(i) || cites.is_null(i) {
                return Err(TableError::malformed(row, None, "null field"));
            }
            let rec = ObservationRecord {
                band: parse_band(bands.value(i), row, None)?,
                log10_frequency_hz: freqs.value(i),
                log10_luminosity_erg_s: lums.value(i),
                source_citation: cites.value(i).trim().to_string(),
            };
            rec.validate(row, None, options)?;
            records.push(rec);
        }
    }

    Ok(ObservationTable::from_validated(records))
}

// -- Parquet / Arrow helpers --

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> TableResult<&'a StringArray> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| TableError::malformed(0, None, format!("missing '{name}' column")))?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            TableError::malformed(
                0,
                None,
                format!(
                    "column '{name}' is {:?}, expected Utf8",
                    batch.column(idx).data_type()
                ),
            )
        })
}

fn f64_column<'a>(batch: &'a RecordBatch, name: &str) -> TableResult<&'a Float64Array> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| TableError::malformed(0, None, format!("missing '{name}' column")))?;
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| {
            TableError::malformed(
                0,
                None,
                format!(
                    "column '{name}' is {:?}, expected Float64",
                    batch.column(idx).data_type()
                ),
            )
        })
}

// ---------------------------------------------------------------------------
// Legacy split-table loader
// ---------------------------------------------------------------------------

/// File stem used by the legacy layout for each band.
fn legacy_stem(band: Band) -> &'static str {
    match band {
        Band::Radio => "radio",
        Band::NirIr => "IR",
        Band::XRay => "xray",
    }
}

/// Path of a legacy per-band column file, e.g.
/// `sgr_a_observations_radio_frequency.txt`.
pub fn legacy_file(dir: &Path, band: Band, quantity: &str) -> std::path::PathBuf {
    dir.join(format!(
        "sgr_a_observations_{}_{quantity}.txt",
        legacy_stem(band)
    ))
}

/// Load the legacy layout: for each band, a `_frequency` and a `_luminosity`
/// file of whitespace-separated log10 values, paired by position. Bands with
/// neither file are skipped. Records are ordered radio, NIR/IR, X-ray.
pub fn load_split_tables(dir: &Path, options: &LoadOptions) -> TableResult<ObservationTable> {
    let mut records = Vec::new();

    for band in Band::ALL {
        let freq_path = legacy_file(dir, band, "frequency");
        let lum_path = legacy_file(dir, band, "luminosity");

        let (freqs, lums) = match (freq_path.exists(), lum_path.exists()) {
            (false, false) => {
                log::warn!("no legacy {} tables in {}, skipping band", band, dir.display());
                continue;
            }
            (true, true) => (read_columns(&freq_path)?, read_columns(&lum_path)?),
            (true, false) => {
                return Err(TableError::malformed(
                    0,
                    None,
                    format!("{} has no matching luminosity file", freq_path.display()),
                ))
            }
            (false, true) => {
                return Err(TableError::malformed(
                    0,
                    None,
                    format!("{} has no matching frequency file", lum_path.display()),
                ))
            }
        };

        if freqs.len() != lums.len() {
            return Err(TableError::malformed(
                records.len() + freqs.len().min(lums.len()) + 1,
                None,
                format!(
                    "{band}: {} frequencies but {} luminosities",
                    freqs.len(),
                    lums.len()
                ),
            ));
        }

        let citation = options.legacy_citation(band).trim().to_string();
        for ((f, line), (l, _)) in freqs.into_iter().zip(lums) {
            let rec = ObservationRecord {
                band,
                log10_frequency_hz: f,
                log10_luminosity_erg_s: l,
                source_citation: citation.clone(),
            };
            rec.validate(records.len() + 1, Some(line), options)?;
            records.push(rec);
        }
    }

    log::info!(
        "imported {} legacy observations from {}",
        records.len(),
        dir.display()
    );
    Ok(ObservationTable::from_validated(records))
}

/// Read whitespace-separated numbers (numpy `loadtxt` style), returning each
/// value with its 1-based source line.
fn read_columns(path: &Path) -> TableResult<Vec<(f64, u64)>> {
    let text = std::fs::read_to_string(path)?;
    let mut values = Vec::new();
    for (ln, raw) in text.lines().enumerate() {
        let line = (ln + 1) as u64;
        let data = raw.split('#').next().unwrap_or("");
        for tok in data.split_whitespace() {
            let v = tok.parse::<f64>().map_err(|_| {
                TableError::malformed(
                    values.len() + 1,
                    Some(line),
                    format!("{}: '{tok}' is not a number", path.display()),
                )
            })?;
            values.push((v, line));
        }
    }
    Ok(values)
}
