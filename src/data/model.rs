use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::LoadOptions;
use crate::data::filter::{BandRecords, Selection};
use crate::error::{TableError, TableResult};

/// Photon frequency of 1 keV in Hz (E / h).
pub const KEV_IN_HZ: f64 = 2.417_989_242e17;

/// Speed of light in micrometres per second.
pub const SPEED_OF_LIGHT_UM_S: f64 = 2.997_924_58e14;

// ---------------------------------------------------------------------------
// Band – spectral category of an observation
// ---------------------------------------------------------------------------

/// The three spectral bands the reference table covers.
///
/// Ordered from low to high frequency so `BTreeMap<Band, _>` iterates in
/// spectral order.
///
/// Serialized as the persisted token; deserialized through [`FromStr`], so
/// config files and tables accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Band {
    #[serde(rename = "radio")]
    Radio,
    #[serde(rename = "nir_ir")]
    NirIr,
    #[serde(rename = "xray")]
    XRay,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Radio, Band::NirIr, Band::XRay];

    /// Token used in persisted tables.
    pub fn token(self) -> &'static str {
        match self {
            Band::Radio => "radio",
            Band::NirIr => "nir_ir",
            Band::XRay => "xray",
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Band::Radio => "radio",
            Band::NirIr => "NIR/IR",
            Band::XRay => "X-ray",
        }
    }

    /// Documented log10 frequency range (Hz) of the band, lower bound first.
    ///
    /// * radio: 1.36 GHz – 235.6 GHz
    /// * NIR/IR: 30 µm – 1 µm
    /// * X-ray: 2 keV – 10 keV
    pub fn log10_frequency_bounds(self) -> (f64, f64) {
        match self {
            Band::Radio => (1.36e9_f64.log10(), 235.6e9_f64.log10()),
            Band::NirIr => (
                (SPEED_OF_LIGHT_UM_S / 30.0).log10(),
                (SPEED_OF_LIGHT_UM_S / 1.0).log10(),
            ),
            Band::XRay => ((2.0 * KEV_IN_HZ).log10(), (10.0 * KEV_IN_HZ).log10()),
        }
    }

    /// Whether `log10_frequency_hz` lies inside the band, allowing `tolerance_dex`
    /// slack on either side.
    pub fn contains(self, log10_frequency_hz: f64, tolerance_dex: f64) -> bool {
        let (lo, hi) = self.log10_frequency_bounds();
        log10_frequency_hz >= lo - tolerance_dex && log10_frequency_hz <= hi + tolerance_dex
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBand(pub String);

impl fmt::Display for UnknownBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown band '{}' (expected radio, nir_ir or xray)",
            self.0
        )
    }
}

impl std::error::Error for UnknownBand {}

impl FromStr for Band {
    type Err = UnknownBand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "radio" => Ok(Band::Radio),
            "nir_ir" | "nir/ir" | "nir-ir" | "nir" | "ir" => Ok(Band::NirIr),
            "xray" | "x-ray" | "x_ray" => Ok(Band::XRay),
            _ => Err(UnknownBand(s.to_string())),
        }
    }
}

impl TryFrom<String> for Band {
    type Error = UnknownBand;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---------------------------------------------------------------------------
// ObservationRecord – one tabulated point
// ---------------------------------------------------------------------------

/// A single observed (frequency, luminosity) point with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub band: Band,
    /// log10 of the photon frequency in Hz.
    pub log10_frequency_hz: f64,
    /// log10 of the luminosity (ν Lν) in erg/s.
    pub log10_luminosity_erg_s: f64,
    pub source_citation: String,
}

impl ObservationRecord {
    pub fn frequency_hz(&self) -> f64 {
        10f64.powf(self.log10_frequency_hz)
    }

    pub fn luminosity_erg_s(&self) -> f64 {
        10f64.powf(self.log10_luminosity_erg_s)
    }

    /// Check the record invariants. `row` is only used for error reporting.
    pub(crate) fn validate(
        &self,
        row: usize,
        line: Option<u64>,
        options: &LoadOptions,
    ) -> TableResult<()> {
        if !self.log10_frequency_hz.is_finite() {
            return Err(TableError::malformed(
                row,
                line,
                format!("log10_frequency_hz {} is not finite", self.log10_frequency_hz),
            ));
        }
        if !self.log10_luminosity_erg_s.is_finite() {
            return Err(TableError::malformed(
                row,
                line,
                format!(
                    "log10_luminosity_erg_s {} is not finite",
                    self.log10_luminosity_erg_s
                ),
            ));
        }
        if self.source_citation.trim().is_empty() {
            return Err(TableError::malformed(row, line, "source_citation is empty"));
        }
        if !self
            .band
            .contains(self.log10_frequency_hz, options.bound_tolerance_dex)
        {
            let (min, max) = self.band.log10_frequency_bounds();
            return Err(TableError::RangeViolation {
                row,
                band: self.band,
                value: self.log10_frequency_hz,
                min,
                max,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BandEnvelope – extent of one band's observations
// ---------------------------------------------------------------------------

/// Bounding box of a band's points in log10 space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandEnvelope {
    pub min_log10_frequency_hz: f64,
    pub max_log10_frequency_hz: f64,
    pub min_log10_luminosity_erg_s: f64,
    pub max_log10_luminosity_erg_s: f64,
}

// ---------------------------------------------------------------------------
// ObservationTable – the complete validated dataset
// ---------------------------------------------------------------------------

/// The validated, read-only observation table.
///
/// Record order is file order, which mirrors citation order in the source
/// tables. Fields are private: once built the table cannot be mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    records: Vec<ObservationRecord>,
    citations: BTreeSet<String>,
    band_counts: BTreeMap<Band, usize>,
}

impl ObservationTable {
    /// Validate `records` in order and build the table. The first invalid
    /// record aborts construction. Citations are stored trimmed, the form
    /// every loader produces.
    pub fn try_from_records(
        mut records: Vec<ObservationRecord>,
        options: &LoadOptions,
    ) -> TableResult<Self> {
        for (i, rec) in records.iter_mut().enumerate() {
            rec.source_citation = rec.source_citation.trim().to_string();
            rec.validate(i + 1, None, options)?;
        }
        Ok(Self::from_validated(records))
    }

    /// Build indices from records that already passed validation.
    pub(crate) fn from_validated(records: Vec<ObservationRecord>) -> Self {
        let mut citations = BTreeSet::new();
        let mut band_counts = BTreeMap::new();
        for rec in &records {
            citations.insert(rec.source_citation.clone());
            *band_counts.entry(rec.band).or_insert(0) += 1;
        }
        ObservationTable {
            records,
            citations,
            band_counts,
        }
    }

    /// Load a table from `path`, dispatching on the file extension.
    pub fn load(path: impl AsRef<std::path::Path>) -> TableResult<Self> {
        crate::data::loader::load_file(path.as_ref(), &LoadOptions::default())
    }

    /// All records in file order.
    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records of one band, in file order. Cloning the iterator forks it at
    /// its current position; calling this again starts over from the top.
    pub fn records_for_band(&self, band: Band) -> BandRecords<'_> {
        BandRecords::new(&self.records, band)
    }

    /// Distinct citations present in the table.
    pub fn citations_used(&self) -> &BTreeSet<String> {
        &self.citations
    }

    /// Record count per band; bands without records are absent.
    pub fn band_counts(&self) -> &BTreeMap<Band, usize> {
        &self.band_counts
    }

    /// Extent of a band's points, or `None` when the band has no records.
    pub fn band_envelope(&self, band: Band) -> Option<BandEnvelope> {
        self.records_for_band(band).fold(None, |env, rec| {
            let f = rec.log10_frequency_hz;
            let l = rec.log10_luminosity_erg_s;
            Some(match env {
                None => BandEnvelope {
                    min_log10_frequency_hz: f,
                    max_log10_frequency_hz: f,
                    min_log10_luminosity_erg_s: l,
                    max_log10_luminosity_erg_s: l,
                },
                Some(e) => BandEnvelope {
                    min_log10_frequency_hz: e.min_log10_frequency_hz.min(f),
                    max_log10_frequency_hz: e.max_log10_frequency_hz.max(f),
                    min_log10_luminosity_erg_s: e.min_log10_luminosity_erg_s.min(l),
                    max_log10_luminosity_erg_s: e.max_log10_luminosity_erg_s.max(l),
                },
            })
        })
    }

    /// Indices of records passing `selection`, in file order.
    pub fn filter(&self, selection: &Selection) -> Vec<usize> {
        crate::data::filter::filtered_indices(self, selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(band: Band, f: f64, l: f64) -> ObservationRecord {
        ObservationRecord {
            band,
            log10_frequency_hz: f,
            log10_luminosity_erg_s: l,
            source_citation: "Test et al. 2020".to_string(),
        }
    }

    #[test]
    fn band_bounds_match_documented_ranges() {
        let (lo, hi) = Band::Radio.log10_frequency_bounds();
        assert!((lo - 9.133_539).abs() < 1e-6);
        assert!((hi - 11.372_175).abs() < 1e-6);

        let (lo, hi) = Band::XRay.log10_frequency_bounds();
        assert!((lo - 17.684_484).abs() < 1e-6);
        assert!((hi - 18.383_454).abs() < 1e-6);

        let (lo, hi) = Band::NirIr.log10_frequency_bounds();
        assert!((lo - 12.999_699).abs() < 1e-6);
        assert!((hi - 14.476_821).abs() < 1e-6);
    }

    #[test]
    fn band_parses_aliases() {
        assert_eq!("radio".parse::<Band>(), Ok(Band::Radio));
        assert_eq!("NIR/IR".parse::<Band>(), Ok(Band::NirIr));
        assert_eq!(" ir ".parse::<Band>(), Ok(Band::NirIr));
        assert_eq!("X-ray".parse::<Band>(), Ok(Band::XRay));
        assert_eq!("xray".parse::<Band>(), Ok(Band::XRay));
        assert!("gamma".parse::<Band>().is_err());
    }

    #[test]
    fn band_deserializes_like_from_str() {
        let bands: Vec<Band> =
            serde_json::from_str(r#"["X-RAY", "NIR", "nir-ir", "Radio", "xray"]"#).unwrap();
        assert_eq!(
            bands,
            vec![Band::XRay, Band::NirIr, Band::NirIr, Band::Radio, Band::XRay]
        );
        assert!(serde_json::from_str::<Band>(r#""gamma""#).is_err());
        assert_eq!(serde_json::to_string(&Band::NirIr).unwrap(), r#""nir_ir""#);
    }

    #[test]
    fn band_display_and_token_differ() {
        assert_eq!(Band::NirIr.to_string(), "NIR/IR");
        assert_eq!(Band::NirIr.token(), "nir_ir");
        assert_eq!(Band::XRay.token().parse::<Band>(), Ok(Band::XRay));
    }

    #[test]
    fn linear_values() {
        let r = rec(Band::Radio, 10.0, 33.0);
        assert!((r.frequency_hz() - 1e10).abs() < 1.0);
        assert!((r.luminosity_erg_s() / 1e33 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn try_from_records_rejects_out_of_band_frequency() {
        let records = vec![rec(Band::Radio, 10.0, 33.0), rec(Band::XRay, 17.0, 33.0)];
        let err = ObservationTable::try_from_records(records, &LoadOptions::default())
            .unwrap_err();
        match err {
            TableError::RangeViolation { row, band, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(band, Band::XRay);
                assert_eq!(value, 17.0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rounded_band_edges_need_explicit_tolerance() {
        let records = vec![rec(Band::Radio, 9.1335, 31.7)];
        let err = ObservationTable::try_from_records(records.clone(), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, TableError::RangeViolation { row: 1, band: Band::Radio, .. }));

        let lenient = LoadOptions {
            bound_tolerance_dex: 5e-4,
            ..LoadOptions::default()
        };
        assert!(ObservationTable::try_from_records(records, &lenient).is_ok());
    }

    #[test]
    fn default_bounds_are_exact() {
        for band in Band::ALL {
            let (lo, hi) = band.log10_frequency_bounds();
            let records = vec![rec(band, lo, 33.0), rec(band, hi, 33.0)];
            assert!(ObservationTable::try_from_records(records, &LoadOptions::default()).is_ok());

            for outside in [lo - 1e-4, hi + 1e-4] {
                let records = vec![rec(band, outside, 33.0)];
                let err = ObservationTable::try_from_records(records, &LoadOptions::default())
                    .unwrap_err();
                assert!(matches!(err, TableError::RangeViolation { .. }), "{band} {outside}");
            }
        }
    }

    #[test]
    fn citations_are_stored_trimmed() {
        let mut padded = rec(Band::Radio, 10.0, 33.0);
        padded.source_citation = " Falcke 1998\t".to_string();
        let table =
            ObservationTable::try_from_records(vec![padded], &LoadOptions::default()).unwrap();
        assert_eq!(table.records()[0].source_citation, "Falcke 1998");
        assert!(table.citations_used().contains("Falcke 1998"));
    }

    #[test]
    fn non_finite_values_are_malformed() {
        let records = vec![rec(Band::Radio, f64::NAN, 31.7)];
        let err = ObservationTable::try_from_records(records, &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, TableError::MalformedRecord { row: 1, .. }));
    }

    #[test]
    fn envelope_and_counts() {
        let table = ObservationTable::try_from_records(
            vec![
                rec(Band::XRay, 17.7, 33.0),
                rec(Band::Radio, 10.0, 33.1),
                rec(Band::XRay, 18.38, 33.4),
            ],
            &LoadOptions::default(),
        )
        .unwrap();

        assert_eq!(table.band_counts().get(&Band::XRay), Some(&2));
        assert_eq!(table.band_counts().get(&Band::NirIr), None);
        assert_eq!(table.band_envelope(Band::NirIr), None);

        let env = table.band_envelope(Band::XRay).unwrap();
        assert_eq!(env.min_log10_frequency_hz, 17.7);
        assert_eq!(env.max_log10_frequency_hz, 18.38);
        assert_eq!(env.min_log10_luminosity_erg_s, 33.0);
        assert_eq!(env.max_log10_luminosity_erg_s, 33.4);
        assert_eq!(table.citations_used().len(), 1);
    }
}
