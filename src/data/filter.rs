use std::collections::BTreeSet;
use std::iter::FusedIterator;

use super::model::{Band, ObservationRecord, ObservationTable};

// ---------------------------------------------------------------------------
// BandRecords – lazy per-band view
// ---------------------------------------------------------------------------

/// Iterator over the records of one band, in file order.
///
/// Borrowing the table keeps it alive and unmodified for as long as the
/// iterator exists. A clone continues independently from the same position.
#[derive(Debug, Clone)]
pub struct BandRecords<'a> {
    inner: std::slice::Iter<'a, ObservationRecord>,
    band: Band,
}

impl<'a> BandRecords<'a> {
    pub(crate) fn new(records: &'a [ObservationRecord], band: Band) -> Self {
        BandRecords {
            inner: records.iter(),
            band,
        }
    }
}

impl<'a> Iterator for BandRecords<'a> {
    type Item = &'a ObservationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let band = self.band;
        self.inner.find(|rec| rec.band == band)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

impl FusedIterator for BandRecords<'_> {}

// ---------------------------------------------------------------------------
// Selection: which bands and citations to keep
// ---------------------------------------------------------------------------

/// Record selection.
///
/// * `bands` empty → every band passes
/// * `citations` is `None` → every citation passes
/// * `citations` is `Some(empty)` → nothing passes
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub bands: BTreeSet<Band>,
    pub citations: Option<BTreeSet<String>>,
}

impl Selection {
    pub fn band(band: Band) -> Self {
        Selection {
            bands: BTreeSet::from([band]),
            citations: None,
        }
    }

    pub fn matches(&self, rec: &ObservationRecord) -> bool {
        if !self.bands.is_empty() && !self.bands.contains(&rec.band) {
            return false;
        }
        match &self.citations {
            Some(selected) => selected.contains(&rec.source_citation),
            None => true,
        }
    }
}

/// Return indices of records that pass `selection`.
pub fn filtered_indices(table: &ObservationTable, selection: &Selection) -> Vec<usize> {
    table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}
