use std::path::PathBuf;
use std::thread;

use anyhow::{Result, anyhow};
use log::{info, warn};

use crate::filter::pipeline::{ActiveFilterSet, Pipeline};
use crate::process::decode::{DecodeOptions, Decoder};
use crate::structs::dataset::Dataset;
use crate::utils::errors::WorkerError;
use crate::utils::worker::{panic_message, run_blocking};

/// Opened surveys, their working copies and the filters to apply.
///
/// Loading and filtering each run as a single blocking unit of work. Within
/// a unit, datasets are handled on separate threads; they share nothing.
#[derive(Debug, Default)]
pub struct Session {
    decoder: Decoder,
    originals: Vec<Dataset>,
    working: Vec<Dataset>,
    filters: ActiveFilterSet,
}

/// Outcome of [`Session::load`].
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
    pub warnings: usize,
}

impl Session {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            decoder: Decoder::new(options),
            ..Default::default()
        }
    }

    /// Decodes `paths` and appends the results. A file that fails to decode
    /// is reported in the returned [`LoadReport`] and does not affect the
    /// others.
    pub fn load(&mut self, paths: Vec<PathBuf>) -> Result<LoadReport> {
        let decoder = self.decoder.clone();

        let results = run_blocking("dzt-load", move || {
            let decoder = &decoder;
            thread::scope(|scope| {
                let handles: Vec<_> = paths
                    .iter()
                    .map(|path| (path, scope.spawn(move || decoder.read_path(path))))
                    .collect();

                handles
                    .into_iter()
                    .map(|(path, handle)| {
                        let result = handle.join().unwrap_or_else(|payload| {
                            Err(anyhow!(WorkerError::Panicked {
                                name: path.display().to_string(),
                                message: panic_message(payload.as_ref()),
                            }))
                        });
                        (path.clone(), result)
                    })
                    .collect::<Vec<_>>()
            })
        })?;

        let mut report = LoadReport::default();
        for (path, result) in results {
            match result {
                Ok(decoded) => {
                    report.warnings += decoded.warnings.len();
                    self.originals.push(decoded.dataset.clone());
                    self.working.push(decoded.dataset);
                    report.loaded.push(path);
                }
                Err(err) => {
                    warn!("Skipping {}: {err:#}", path.display());
                    report.failed.push((path, err));
                }
            }
        }

        info!(
            "Loaded {} file(s), {} failed",
            report.loaded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Current working datasets, with all applied filters.
    pub fn datasets(&self) -> &[Dataset] {
        &self.working
    }

    /// Datasets as decoded, before any filtering.
    pub fn originals(&self) -> &[Dataset] {
        &self.originals
    }

    pub fn filters(&self) -> &ActiveFilterSet {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut ActiveFilterSet {
        &mut self.filters
    }

    /// Runs the active filters over every working dataset.
    ///
    /// Filters compound: a second call filters the already filtered data.
    /// If any dataset fails, no working dataset is replaced.
    pub fn apply_filters(&mut self) -> Result<()> {
        if self.filters.is_empty() || self.working.is_empty() {
            return Ok(());
        }

        let working = self.working.clone();
        let filters = self.filters.clone();

        let results = run_blocking("dzt-filter", move || {
            thread::scope(|scope| {
                let handles: Vec<_> = working
                    .into_iter()
                    .map(|dataset| {
                        let label = dataset.label();
                        let filters = &filters;
                        (label, scope.spawn(move || Pipeline::apply(dataset, filters)))
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|(label, handle)| {
                        handle.join().unwrap_or_else(|payload| {
                            Err(anyhow!(WorkerError::Panicked {
                                name: label,
                                message: panic_message(payload.as_ref()),
                            }))
                        })
                    })
                    .collect::<Result<Vec<_>>>()
            })
        })??;

        self.working = results;
        info!(
            "Applied {} filter(s) to {} dataset(s)",
            self.filters.len(),
            self.working.len()
        );
        Ok(())
    }

    /// Restores the decoded datasets and clears the active filters.
    pub fn reset(&mut self) {
        self.working = self.originals.clone();
        self.filters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::background::remove_background;
    use crate::filter::spec::FilterSpec;
    use crate::process::encode::Encoder;
    use crate::structs::dataset::Channel;
    use crate::structs::header::ChannelHeader;
    use ndarray::Array2;

    fn write_survey(name: &str, rows: usize, cols: usize) -> Result<PathBuf> {
        let header = ChannelHeader {
            samples: rows as i16,
            range: 60.0,
            ..Default::default()
        };
        let data = Array2::from_shape_fn((rows, cols), |(r, c)| ((r * 31 + c * 17) % 97) as f64);
        let ds = Dataset::new(vec![Channel::new(header, data)], vec![])?;

        let path = std::env::temp_dir().join(format!("dzt-session-{}-{name}.DZT", std::process::id()));
        std::fs::write(&path, Encoder::default().encode(&ds)?)?;
        Ok(path)
    }

    #[test]
    fn load_skips_unreadable_files() -> Result<()> {
        let a = write_survey("load-a", 16, 8)?;
        let b = write_survey("load-b", 32, 4)?;
        let missing = std::env::temp_dir().join("dzt-session-missing.DZT");

        let mut session = Session::default();
        let report = session.load(vec![a.clone(), missing.clone(), b.clone()])?;

        assert_eq!(report.loaded, vec![a.clone(), b.clone()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, missing);
        assert_eq!(session.datasets().len(), 2);
        assert_eq!(session.datasets()[1].channels()[0].data.dim(), (32, 4));

        std::fs::remove_file(a)?;
        std::fs::remove_file(b)?;
        Ok(())
    }

    #[test]
    fn filters_compound_and_reset_restores() -> Result<()> {
        let path = write_survey("compound", 20, 10)?;
        let mut session = Session::default();
        session.load(vec![path.clone()])?;
        let original = session.originals()[0].channels()[0].data.clone();

        session
            .filters_mut()
            .insert("bgr:window=3".parse::<FilterSpec>()?);
        session.apply_filters()?;
        session.apply_filters()?;

        let twice = remove_background(remove_background(original.clone(), 3), 3);
        let filtered = &session.datasets()[0].channels()[0].data;
        assert!(
            filtered
                .iter()
                .zip(twice.iter())
                .all(|(a, b)| (a - b).abs() < 1e-9)
        );

        session.reset();
        assert!(session.filters().is_empty());
        assert_eq!(session.datasets()[0].channels()[0].data, original);

        std::fs::remove_file(path)?;
        Ok(())
    }

    #[test]
    fn failed_filter_keeps_working_data() -> Result<()> {
        let path = write_survey("failing", 8, 4)?;
        let mut session = Session::default();
        session.load(vec![path.clone()])?;

        session
            .filters_mut()
            .insert("bandpass:freqmin=1000,freqmax=100000".parse::<FilterSpec>()?);
        assert!(session.apply_filters().is_err());
        assert_eq!(session.datasets(), session.originals());

        std::fs::remove_file(path)?;
        Ok(())
    }
}
