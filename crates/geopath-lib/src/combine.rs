//! Merge per-region-pair distribution TSVs
//!
//! Every input must be named `*.<src_cloud>.<src_region>.<dst_cloud>.<dst_region>.by_*`
//! (or the three-token variant); the region pair is prepended to each row.

use crate::filename::detect_cloud_regions;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Columns every input TSV must carry, in output order
pub const REQUIRED_COLUMNS: [&str; 4] = ["count", "hop_count", "distance_km", "route"];

/// Region pair columns prepended to the output
pub const REGION_COLUMNS: [&str; 4] = ["src_cloud", "src_region", "dst_cloud", "dst_region"];

#[derive(Debug, Error)]
pub enum CombineError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Required column '{column}' is missing in '{path}'")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Cannot detect cloud regions from filename '{0}'")]
    UnrecognizedFilename(PathBuf),

    #[error("Failed to process TSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Concatenate distribution TSVs, tagging each row with its region pair
///
/// Values are copied verbatim. Returns the number of data rows written.
pub fn combine_tsvs<P: AsRef<Path>>(inputs: &[P], writer: impl Write) -> Result<usize, CombineError> {
    let mut out = csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer);
    out.write_record(REGION_COLUMNS.iter().chain(REQUIRED_COLUMNS.iter()))?;

    let mut rows = 0;
    for input in inputs {
        let path = input.as_ref();
        info!(path = %path.display(), "Processing distribution file");

        let pair = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(detect_cloud_regions)
            .ok_or_else(|| CombineError::UnrecognizedFilename(path.to_path_buf()))?;

        let file = File::open(path).map_err(|source| CombineError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new().delimiter(b'\t').from_reader(file);

        let headers = reader.headers()?.clone();
        let positions = REQUIRED_COLUMNS
            .iter()
            .map(|column| {
                headers
                    .iter()
                    .position(|h| h == *column)
                    .ok_or_else(|| CombineError::MissingColumn {
                        column: column.to_string(),
                        path: path.to_path_buf(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for record in reader.records() {
            let record = record?;
            let regions = [
                pair.src_cloud.as_str(),
                pair.src_region.as_str(),
                pair.dst_cloud.as_str(),
                pair.dst_region.as_str(),
            ];
            let values = positions.iter().map(|&i| record.get(i).unwrap_or(""));
            out.write_record(regions.into_iter().chain(values))?;
            rows += 1;
        }
    }

    out.flush()?;
    info!(inputs = inputs.len(), rows, "Combined distribution files");
    Ok(rows)
}
