//! Validated reference table of Sgr A* radio, NIR/IR and X-ray observations,
//! tabulated as log10 frequency (Hz) against log10 luminosity (erg/s), for
//! overlaying on modelled pulsar / accretion-disk emission spectra.

pub mod config;
pub mod data;
pub mod error;

pub use config::{LoadOptions, TableFormat};
pub use data::filter::{BandRecords, Selection};
pub use data::loader::{load_file, load_split_tables};
pub use data::model::{Band, BandEnvelope, ObservationRecord, ObservationTable};
pub use data::writer::save_file;
pub use error::{TableError, TableResult};
