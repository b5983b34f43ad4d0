//! Profile types and export/import formats

pub mod export;
mod types;

pub use export::{ExportError, ProfileExport, ValidatedImport, ValidationFailure};
pub use types::*;
