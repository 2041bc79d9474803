//! Cut-list exports.
//!
//! The table export is CSV with the header `Start(sec),End(sec),Transcript`,
//! one row per cut in list order, times printed with one decimal. The JSON
//! export is an array of records with the same three keys. An archive is
//! described by [`archive_manifest`]: the table first, then each present
//! frame artifact under `frames/`, in cut order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::configuration::FrameImageFormat;
use crate::cut::Cutlist;
use crate::error::CutlistError;
use crate::sampler::FrameArtifacts;

/// File name of the table export inside a session workspace.
pub const CSV_FILE_NAME: &str = "cutlist.csv";

/// File name of the JSON export inside a session workspace.
pub const JSON_FILE_NAME: &str = "cutlist.json";

/// Directory holding frame artifacts, both on disk and inside archives.
pub const FRAMES_DIR: &str = "frames";

pub(crate) const FRAME_FILE_PREFIX: &str = "frame_";

const CSV_HEADER: &str = "Start(sec),End(sec),Transcript";

/// Artifact file name for cut `index`, e.g. `frame_3.jpg`.
pub fn frame_file_name(index: usize, format: FrameImageFormat) -> String {
    format!("{FRAME_FILE_PREFIX}{index}.{}", format.extension())
}

/// Write the cut list as CSV.
///
/// Transcripts containing commas, quotes, or line breaks are quoted with
/// embedded quotes doubled.
pub fn write_csv<W: Write>(writer: &mut W, cutlist: &Cutlist) -> Result<(), CutlistError> {
    writeln!(writer, "{CSV_HEADER}")?;
    for cut in cutlist {
        writeln!(
            writer,
            "{:.1},{:.1},{}",
            cut.start,
            cut.end,
            escape_csv_field(&cut.label)
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the cut list as a pretty-printed JSON array.
pub fn write_json<W: Write>(writer: &mut W, cutlist: &Cutlist) -> Result<(), CutlistError> {
    serde_json::to_writer_pretty(&mut *writer, cutlist)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write the CSV export to `path`, replacing any existing file.
///
/// # Errors
///
/// [`CutlistError::Storage`] if the file cannot be created or written.
pub fn save_csv(path: &Path, cutlist: &Cutlist) -> Result<(), CutlistError> {
    let file = File::create(path).map_err(|error| CutlistError::storage(path, error))?;
    write_csv(&mut BufWriter::new(file), cutlist)
        .map_err(|error| CutlistError::storage(path, error))
}

/// Write the JSON export to `path`, replacing any existing file.
///
/// # Errors
///
/// [`CutlistError::Storage`] if the file cannot be created or written.
pub fn save_json(path: &Path, cutlist: &Cutlist) -> Result<(), CutlistError> {
    let file = File::create(path).map_err(|error| CutlistError::storage(path, error))?;
    write_json(&mut BufWriter::new(file), cutlist)
        .map_err(|error| CutlistError::storage(path, error))
}

/// One file to place in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File on disk.
    pub source: PathBuf,
    /// Name inside the archive.
    pub name: String,
}

/// Ordered archive contents: `csv_path` as `cutlist.csv`, then each present
/// frame as `frames/<file>` in cut order. Absent frames are skipped.
pub fn archive_manifest(csv_path: &Path, artifacts: &FrameArtifacts) -> Vec<ArchiveEntry> {
    let mut entries = vec![ArchiveEntry {
        source: csv_path.to_path_buf(),
        name: CSV_FILE_NAME.to_string(),
    }];

    entries.extend(artifacts.iter().flatten().filter_map(|path| {
        let file_name = path.file_name()?.to_string_lossy();
        Some(ArchiveEntry {
            source: path.clone(),
            name: format!("{FRAMES_DIR}/{file_name}"),
        })
    }));

    entries
}

fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
