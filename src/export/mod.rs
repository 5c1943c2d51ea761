mod options;
mod pipeline;
mod sinks;

pub use options::{CsvOptions, ExportFormat, ExportOptions, ExportReport};
pub use pipeline::{export_file, export_to_writer};
