use std::path::Path;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use serde_json::json;

use sgra_observations::data::writer::record_batch;
use sgra_observations::{
    load_file, load_split_tables, save_file, Band, LoadOptions, ObservationRecord,
    ObservationTable,
};

use crate::cli::{Cli, Commands};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(cli: Cli) -> Result<()> {
    let options = match &cli.config {
        Some(path) => LoadOptions::from_json_file(path)
            .with_context(|| format!("reading options from {}", path.display()))?,
        None => LoadOptions::default(),
    };

    let load = || {
        load_file(&cli.table, &options)
            .with_context(|| format!("loading {}", cli.table.display()))
    };

    match &cli.command {
        Commands::Validate => validate(&load()?, cli.json),
        Commands::List { band } => list(&load()?, *band, cli.json),
        Commands::Citations => citations(&load()?, cli.json),
        Commands::Summary => summary(&load()?, cli.json),
        Commands::Convert { output } => convert(&load()?, output, cli.json),
        Commands::ImportLegacy { dir, output } => import_legacy(dir, output, &options, cli.json),
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn validate(table: &ObservationTable, as_json: bool) -> Result<()> {
    if as_json {
        print_json(&json!({
            "valid": true,
            "records": table.len(),
            "citations": table.citations_used().len(),
        }))
    } else {
        println!(
            "table valid: {} records, {} citations",
            table.len(),
            table.citations_used().len()
        );
        Ok(())
    }
}

fn list(table: &ObservationTable, band: Option<Band>, as_json: bool) -> Result<()> {
    let records: Vec<&ObservationRecord> = match band {
        Some(b) => table.records_for_band(b).collect(),
        None => table.records().iter().collect(),
    };

    if as_json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("no records");
        return Ok(());
    }
    let batch = record_batch(records).context("building record batch")?;
    println!("{}", pretty_format_batches(&[batch])?);
    Ok(())
}

fn citations(table: &ObservationTable, as_json: bool) -> Result<()> {
    if as_json {
        return print_json(table.citations_used());
    }
    for citation in table.citations_used() {
        println!("{citation}");
    }
    Ok(())
}

fn summary(table: &ObservationTable, as_json: bool) -> Result<()> {
    if as_json {
        let bands: Vec<_> = Band::ALL
            .iter()
            .map(|&band| {
                json!({
                    "band": band,
                    "records": table.band_counts().get(&band).copied().unwrap_or(0),
                    "envelope": table.band_envelope(band),
                })
            })
            .collect();
        return print_json(&bands);
    }

    for band in Band::ALL {
        let count = table.band_counts().get(&band).copied().unwrap_or(0);
        match table.band_envelope(band) {
            Some(env) => println!(
                "{:<7} {:>3}  log10 nu [{:.3}, {:.3}]  log10 L [{:.3}, {:.3}]",
                band.label(),
                count,
                env.min_log10_frequency_hz,
                env.max_log10_frequency_hz,
                env.min_log10_luminosity_erg_s,
                env.max_log10_luminosity_erg_s,
            ),
            None => println!("{:<7} {:>3}", band.label(), count),
        }
    }
    Ok(())
}

fn convert(table: &ObservationTable, output: &Path, as_json: bool) -> Result<()> {
    save_file(table, output).with_context(|| format!("writing {}", output.display()))?;
    report_written(table.len(), output, as_json)
}

fn import_legacy(dir: &Path, output: &Path, options: &LoadOptions, as_json: bool) -> Result<()> {
    let table = load_split_tables(dir, options)
        .with_context(|| format!("importing legacy tables from {}", dir.display()))?;
    save_file(&table, output).with_context(|| format!("writing {}", output.display()))?;
    report_written(table.len(), output, as_json)
}

// -- helpers --

fn report_written(records: usize, output: &Path, as_json: bool) -> Result<()> {
    if as_json {
        print_json(&json!({ "records": records, "output": output }))
    } else {
        println!("wrote {records} records to {}", output.display());
        Ok(())
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
