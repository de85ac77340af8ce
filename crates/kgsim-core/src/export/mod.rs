//! Export of comparison state to external formats.

mod csv;

pub use csv::{render_csv, suggested_filename, CsvExport};
