use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::model::Band;
use crate::error::TableResult;

/// Slack, in dex, allowed on either side of a band's frequency bounds.
/// Zero: the documented ranges are enforced exactly unless a caller opts in.
pub const DEFAULT_BOUND_TOLERANCE_DEX: f64 = 0.0;

/// Persisted table formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Delimited text; the delimiter comes from [`LoadOptions::delimiter`] or
    /// the file extension.
    Delimited,
    Json,
    Parquet,
}

/// Loader configuration. Every field has a default, so a partial JSON file
/// such as `{ "bound_tolerance_dex": 5e-4 }` is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Opt-in slack for tables that round band-edge values, e.g. `5e-4`
    /// admits edges tabulated to four decimals.
    pub bound_tolerance_dex: f64,

    /// Force a format instead of guessing from the extension.
    pub format: Option<TableFormat>,

    /// Field delimiter for delimited text, overriding the extension default.
    pub delimiter: Option<char>,

    /// Citation attached to every point of a band when importing the legacy
    /// split layout, which carries no provenance of its own.
    pub legacy_citations: BTreeMap<Band, String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        let legacy_citations = BTreeMap::from([
            (
                Band::Radio,
                "Falcke H. et al., 1998, ApJ, 499, 731".to_string(),
            ),
            (
                Band::NirIr,
                "Genzel R. et al., 2003, Nature, 425, 934".to_string(),
            ),
            (
                Band::XRay,
                "Baganoff F. K. et al., 2003, ApJ, 591, 891".to_string(),
            ),
        ]);
        Self {
            bound_tolerance_dex: DEFAULT_BOUND_TOLERANCE_DEX,
            format: None,
            delimiter: None,
            legacy_citations,
        }
    }
}

impl LoadOptions {
    /// Read options from a JSON file.
    pub fn from_json_file(path: &Path) -> TableResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let options = serde_json::from_str(&text)?;
        log::debug!("loaded options from {}", path.display());
        Ok(options)
    }

    /// Citation for a legacy band, falling back to a generic label.
    pub fn legacy_citation(&self, band: Band) -> String {
        self.legacy_citations
            .get(&band)
            .cloned()
            .unwrap_or_else(|| format!("unattributed {} observations", band.label()))
    }
}
