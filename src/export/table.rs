//! Sample matrices as CSV tables.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use dzt::structs::dataset::{Dataset, SampleMatrix};

/// Writes one matrix: an empty cell then the column indices, followed by one
/// row per sample led by its row index.
pub fn write_matrix<W: Write>(data: &SampleMatrix, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(data.ncols() + 1);
    header.push(String::new());
    header.extend((0..data.ncols()).map(|c| c.to_string()));
    csv.write_record(&header)?;

    for (i, row) in data.rows().into_iter().enumerate() {
        let mut record = Vec::with_capacity(data.ncols() + 1);
        record.push(i.to_string());
        record.extend(row.iter().map(|v| v.to_string()));
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// File names for a dataset's tables: `path` itself for a single channel,
/// otherwise `<stem>(<n>).csv` per channel.
pub fn table_paths(path: &Path, channels: usize) -> Vec<PathBuf> {
    if channels <= 1 {
        return vec![path.to_path_buf()];
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (1..=channels)
        .map(|n| path.with_file_name(format!("{stem}({n}).csv")))
        .collect()
}

/// Writes every channel of `dataset` and returns the files created.
pub fn write_tables(dataset: &Dataset, path: &Path) -> Result<Vec<PathBuf>> {
    let paths = table_paths(path, dataset.channel_count());
    for (channel, target) in dataset.channels().iter().zip(&paths) {
        let file = std::fs::File::create(target)
            .with_context(|| format!("Failed to create {}", target.display()))?;
        write_matrix(&channel.data, std::io::BufWriter::new(file))?;
        log::debug!("Wrote {}x{} table to {}", channel.samples(), channel.traces(), target.display());
    }
    Ok(paths)
}
