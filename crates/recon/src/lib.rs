//! `bomflow-recon` — Component demand reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded demand and BOM rows, returns
//! component demand, summaries and an inconsistency report as named tables.
//! No file, database or CLI dependencies.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod inconsistency;
pub mod join;
pub mod loader;
pub mod model;
pub mod pivot;
pub mod summary;
pub mod table;

pub use config::PipelineConfig;
pub use engine::{run, run_tables};
pub use error::ReconError;
pub use loader::{BomSource, FallbackBomSource, MockBomSource, TableBomSource};
pub use model::{BomRecord, DemandRecord, DemandReport};
pub use table::{CellValue, NamedTable, RawTable};
