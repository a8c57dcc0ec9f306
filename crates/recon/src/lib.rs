//! `shiftrev-recon`: staffing/collections reconciliation engine.
//!
//! Attributes billed revenue to the shift that produced it: derives a
//! provider/date identity key from both ledgers, classifies shifts, joins in
//! two passes and rolls the matches up into a monthly per-facility report.
//!
//! Engine crate: receives pre-loaded tables, returns typed results. CSV
//! loaders and report writers live here too; file handling is the caller's.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod facility;
pub mod identity;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod report;
pub mod source;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{ReconInput, ReconResult};
