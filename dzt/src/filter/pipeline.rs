use anyhow::{Result, bail};
use log::{debug, info, warn};

use crate::filter::background::remove_background;
use crate::filter::bandpass::triangular_bandpass;
use crate::filter::spec::{FilterKind, FilterSpec};
use crate::filter::spectrum::frequency_transform;
use crate::filter::wavelet::wavelet_coefficients;
use crate::structs::dataset::{Channel, Dataset, Domain};
use crate::utils::errors::FilterError;

/// Filters to run, in the order they were first added.
///
/// Holds at most one entry per [`FilterKind`]. Inserting a kind that is
/// already present replaces its parameters without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveFilterSet {
    specs: Vec<FilterSpec>,
}

impl ActiveFilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a filter, returning the spec it replaced.
    pub fn insert(&mut self, spec: FilterSpec) -> Option<FilterSpec> {
        match self.specs.iter_mut().find(|s| s.kind() == spec.kind()) {
            Some(slot) => Some(std::mem::replace(slot, spec)),
            None => {
                self.specs.push(spec);
                None
            }
        }
    }

    pub fn get(&self, kind: FilterKind) -> Option<&FilterSpec> {
        self.specs.iter().find(|s| s.kind() == kind)
    }

    pub fn remove(&mut self, kind: FilterKind) -> Option<FilterSpec> {
        let index = self.specs.iter().position(|s| s.kind() == kind)?;
        Some(self.specs.remove(index))
    }

    pub fn clear(&mut self) {
        self.specs.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl FromIterator<FilterSpec> for ActiveFilterSet {
    fn from_iter<T: IntoIterator<Item = FilterSpec>>(iter: T) -> Self {
        let mut set = Self::new();
        iter.into_iter().for_each(|spec| {
            set.insert(spec);
        });
        set
    }
}

impl<'a> IntoIterator for &'a ActiveFilterSet {
    type Item = &'a FilterSpec;
    type IntoIter = std::slice::Iter<'a, FilterSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Runs an [`ActiveFilterSet`] over a dataset.
pub struct Pipeline;

impl Pipeline {
    /// Applies every filter in order to every channel. Each stage sees the
    /// output of the previous one.
    pub fn apply(mut dataset: Dataset, filters: &ActiveFilterSet) -> Result<Dataset> {
        let label = dataset.label();

        for spec in filters {
            info!("{label}: {}", spec.kind());
            for (i, channel) in dataset.channels_mut().iter_mut().enumerate() {
                apply_stage(&label, i, channel, spec)?;
            }
        }

        Ok(dataset)
    }
}

fn apply_stage(label: &str, index: usize, channel: &mut Channel, spec: &FilterSpec) -> Result<()> {
    if channel.domain != Domain::Time {
        bail!(FilterError::DomainMismatch {
            filter: spec.kind().alias(),
            channel: index,
        });
    }

    match spec {
        FilterSpec::BackgroundRemoval { window } => {
            channel.data = remove_background(std::mem::take(&mut channel.data), *window);
        }
        FilterSpec::TriangularBandpass {
            freqmin,
            freqmax,
            zerophase,
        } => {
            let Some(fs) = channel.header.sampling_frequency() else {
                bail!(FilterError::MissingSamplingFrequency {
                    channel: index,
                    range: channel.header.range,
                });
            };
            debug!("{label} channel {index}: sampling frequency {fs:.0} Hz");
            channel.data = triangular_bandpass(&channel.data, fs, *freqmin, *freqmax, *zerophase)?;
        }
        FilterSpec::FrequencyTransform => {
            channel.data = frequency_transform(&channel.data);
            channel.domain = Domain::Frequency;
        }
        FilterSpec::Wavelet { family } => match wavelet_coefficients(&channel.data, family) {
            Ok(coefficients) => {
                info!("{label} channel {index}: {family} coefficients, {coefficients}");
            }
            Err(err) => match err.downcast_ref::<FilterError>() {
                Some(FilterError::UnsupportedWavelet(_)) => {
                    warn!("{label} channel {index}: {err}, data left unchanged");
                }
                _ => return Err(err),
            },
        },
    }

    debug!(
        "{label} channel {index}: {} done, {}x{}",
        spec.kind().alias(),
        channel.data.nrows(),
        channel.data.ncols()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::header::ChannelHeader;
    use ndarray::Array2;

    fn dataset(rows: usize, cols: usize, zeros: &[i16]) -> Result<Dataset> {
        let channels = zeros
            .iter()
            .enumerate()
            .map(|(c, &zero)| {
                let header = ChannelHeader {
                    samples: zero + rows as i16,
                    zero,
                    range: 50.0,
                    nchan: zeros.len() as i16,
                    ..Default::default()
                };
                let data = Array2::from_shape_fn((rows, cols), |(r, t)| {
                    ((r as f64) * 0.37 + c as f64).sin() * 1000.0 + ((r * 7 + t * 13) % 29) as f64
                });
                Channel::new(header, data)
            })
            .collect();
        Dataset::new(channels, vec![])
    }

    fn spec(text: &str) -> FilterSpec {
        text.parse().unwrap()
    }

    #[test]
    fn set_keeps_first_insertion_position() {
        let mut set = ActiveFilterSet::new();
        assert!(set.insert(spec("bgr")).is_none());
        assert!(set.insert(spec("bandpass:freqmin=70,freqmax=130")).is_none());
        assert!(set.insert(spec("wavelet:family=db2")).is_none());

        let replaced = set.insert(spec("bgr:window=9"));
        assert_eq!(replaced, Some(spec("bgr:window=0")));

        let kinds: Vec<_> = set.iter().map(FilterSpec::kind).collect();
        assert_eq!(
            kinds,
            vec![
                FilterKind::BackgroundRemoval,
                FilterKind::TriangularBandpass,
                FilterKind::Wavelet
            ]
        );
        assert_eq!(
            set.get(FilterKind::BackgroundRemoval),
            Some(&spec("bgr:window=9"))
        );

        assert!(set.remove(FilterKind::TriangularBandpass).is_some());
        assert!(set.remove(FilterKind::TriangularBandpass).is_none());
        assert_eq!(set.len(), 2);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn background_then_bandpass_end_to_end() -> Result<()> {
        let ds = dataset(512, 1000, &[10, 0])?;
        let filters: ActiveFilterSet = [spec("bgr:window=0"), spec("bandpass:freqmin=70,freqmax=130")]
            .into_iter()
            .collect();

        let out = Pipeline::apply(ds, &filters)?;
        assert_eq!(out.channel_count(), 2);
        for channel in out.channels() {
            assert_eq!(channel.data.dim(), (512, 1000));
            assert!(channel.data.iter().all(|v| v.is_finite()));
        }
        Ok(())
    }

    #[test]
    fn stages_compose_in_order() -> Result<()> {
        let filters: ActiveFilterSet = [spec("bgr:window=5"), spec("fft")].into_iter().collect();
        let ds = dataset(40, 12, &[0])?;
        let expected = frequency_transform(&remove_background(ds.channels()[0].data.clone(), 5));

        let out = Pipeline::apply(ds, &filters)?;
        assert_eq!(out.channels()[0].data, expected);
        Ok(())
    }

    #[test]
    fn fft_is_terminal() -> Result<()> {
        let filters: ActiveFilterSet = [spec("fft")].into_iter().collect();
        let out = Pipeline::apply(dataset(16, 10, &[0, 0])?, &filters)?;
        for channel in out.channels() {
            assert_eq!(channel.domain, Domain::Frequency);
            assert_eq!(channel.data.dim(), (16, 6));
        }

        let chained: ActiveFilterSet = [spec("fft"), spec("bgr")].into_iter().collect();
        let err = Pipeline::apply(dataset(16, 10, &[0])?, &chained).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FilterError>(),
            Some(&FilterError::DomainMismatch {
                filter: "bgr",
                channel: 0
            })
        );
        Ok(())
    }

    #[test]
    fn wavelet_leaves_data_unchanged() -> Result<()> {
        for family in ["db2", "mexh", "coif3"] {
            let ds = dataset(24, 6, &[0])?;
            let before = ds.clone();
            let filters: ActiveFilterSet =
                [spec(&format!("wavelet:family={family}"))].into_iter().collect();
            assert_eq!(Pipeline::apply(ds, &filters)?, before);
        }
        Ok(())
    }

    #[test]
    fn bandpass_needs_sampling_frequency() -> Result<()> {
        let mut ds = dataset(16, 4, &[0])?;
        ds.channels_mut()[0].header.range = 0.0;
        let filters: ActiveFilterSet = [spec("bandpass:freqmin=70,freqmax=130")]
            .into_iter()
            .collect();
        let err = Pipeline::apply(ds, &filters).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FilterError>(),
            Some(FilterError::MissingSamplingFrequency { channel: 0, .. })
        ));
        Ok(())
    }

    #[test]
    fn empty_set_is_identity() -> Result<()> {
        let ds = dataset(8, 3, &[0])?;
        assert_eq!(Pipeline::apply(ds.clone(), &ActiveFilterSet::new())?, ds);
        Ok(())
    }
}
