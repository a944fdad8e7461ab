//! Ingestion core for social-media analytics exports.
//!
//! Takes the ZIP archives produced by the YouTube Studio, Meta Business Suite
//! and TikTok Studio export tools and turns them into one normalized
//! aggregate per platform:
//! - `coerce` / `tabular`: tolerant number, duration, date and CSV reading
//! - `audience`: the multi-section Instagram audience file
//! - `normalize`: per-report normalizers
//! - `importer`: archive routing and diagnostics
//! - `filter` / `compare` / `export`: views derived from an aggregate

pub mod audience;
pub mod coerce;
pub mod compare;
pub mod error;
pub mod export;
pub mod filter;
pub mod importer;
pub mod model;
pub mod normalize;
pub mod tabular;

pub use compare::{best_performer, ComparisonField, PlatformComparison};
pub use error::{IngestError, Result};
pub use export::{export_file_name, ExportDocument};
pub use filter::{filter_aggregate, filter_aggregate_at, DateRange};
pub use importer::{import_archive, FileOutcome, ImportDiagnostics, Imported};
pub use model::{Aggregate, Network};
