/// Data layer: core types, loading, writing and filtering.
///
/// Architecture:
/// ```text
///  .tsv / .csv / .json / .parquet      legacy *_frequency.txt + *_luminosity.txt
///        │                                      │
///        ▼                                      ▼
///   ┌──────────┐                       ┌──────────────────┐
///   │  loader   │  parse + validate     │ load_split_tables │
///   └──────────┘                       └──────────────────┘
///        │                                      │
///        ▼                                      ▼
///   ┌──────────────────┐
///   │ ObservationTable  │  Vec<ObservationRecord>, citation + band index
///   └──────────────────┘
///        │                    │
///        ▼                    ▼
///   ┌──────────┐        ┌──────────┐
///   │  filter   │        │  writer   │  round-trip / format conversion
///   └──────────┘        └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
