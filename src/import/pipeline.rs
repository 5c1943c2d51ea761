use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::engine::Engine;

use super::bson::import_bson;
use super::csv::import_csv;
use super::detect::detect_format;
use super::ndjson::import_ndjson;
use super::options::{ImportFormat, ImportOptions, ImportReport};

/// Import data from a file path into the target collection.
///
/// # Errors
/// Returns I/O errors on read failures, parse errors (wrapped as `InvalidData`),
/// and writer errors for sidecar files when enabled.
pub fn import_file<P: AsRef<Path>>(
    engine: &Engine,
    path: P,
    opts: &ImportOptions,
) -> io::Result<ImportReport> {
    log::info!("import: path={}, collection={}", path.as_ref().display(), opts.collection);
    let file = File::open(&path)?;
    let mut reader = BufReader::new(file);
    let format = match opts.format {
        ImportFormat::Auto => detect_format(&mut reader, path.as_ref())?,
        other => other,
    };
    import_from_reader(engine, reader, format, opts)
}

/// Import data from an arbitrary reader.
///
/// # Errors
/// Returns I/O errors on read failures and parse errors (`InvalidData`).
pub fn import_from_reader<R: Read>(
    engine: &Engine,
    reader: R,
    format: ImportFormat,
    opts: &ImportOptions,
) -> io::Result<ImportReport> {
    let collection = engine
        .get_collection(&opts.collection)
        .unwrap_or_else(|| engine.create_collection(opts.collection.clone()));
    let mut report = ImportReport::default();
    match format {
        ImportFormat::Ndjson => import_ndjson(&collection, reader, opts, &mut report)?,
        ImportFormat::Csv => import_csv(&collection, reader, opts, &mut report)?,
        ImportFormat::Bson => import_bson(&collection, reader, opts, &mut report)?,
        ImportFormat::Auto => unreachable!(),
    }
    Ok(report)
}
