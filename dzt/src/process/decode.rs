use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use log::{debug, info, trace};
use ndarray::Array2;

use crate::log_or_err;
use crate::structs::antenna::{self, FrequencySource};
use crate::structs::dataset::{Channel, Dataset};
use crate::structs::header::{ChannelHeader, HEADER_SIZE, payload_offset};
use crate::utils::errors::DecodeError;

/// Caller overrides applied while decoding.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Per-channel time-zero rows, replacing `rh_zero`. Channels past the
    /// end of the list keep their header value.
    pub zero: Vec<usize>,
    /// Per-channel antenna frequency in MHz, used when the antenna model is
    /// not in the built-in table.
    pub antenna_freq: Vec<f64>,
    pub fail_level: log::Level,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            zero: Vec::new(),
            antenna_freq: Vec::new(),
            fail_level: log::Level::Error,
        }
    }
}

/// Reads DZT containers into [`Dataset`]s.
///
/// The inverse of [`Encoder`](crate::process::encode::Encoder), extended to
/// the 8- and 16-bit sample formats written by field units.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    options: DecodeOptions,
}

/// A decoded container plus the recoverable problems met on the way.
#[derive(Debug)]
pub struct Decoded {
    pub dataset: Dataset,
    pub warnings: Vec<DecodeError>,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// Sets the failure level for validation errors.
    ///
    /// - `log::Level::Error`: Only fail on Error level messages (default)
    /// - `log::Level::Warn`: Fail on Warning level and above (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.options.fail_level = level;
    }

    pub fn read_path(&self, path: &Path) -> Result<Decoded> {
        let bytes = fs::read(path).map_err(|source| DecodeError::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("Read {} bytes from {}", bytes.len(), path.display());

        let mut decoded = self.read_bytes(&bytes)?;
        decoded.dataset.source = Some(path.to_path_buf());
        Ok(decoded)
    }

    pub fn read_bytes(&self, bytes: &[u8]) -> Result<Decoded> {
        let mut warnings = Vec::new();

        if bytes.len() < HEADER_SIZE {
            bail!(DecodeError::Truncated {
                needed: HEADER_SIZE,
                available: bytes.len(),
            });
        }

        let first = ChannelHeader::read(&bytes[..HEADER_SIZE])?;
        if first.nchan < 1 {
            bail!(DecodeError::InvalidChannelCount(first.nchan));
        }
        let nchan = first.nchan as usize;

        let headers_end = nchan * HEADER_SIZE;
        if bytes.len() < headers_end {
            bail!(DecodeError::Truncated {
                needed: headers_end,
                available: bytes.len(),
            });
        }

        let sample_size = match first.bits {
            8 => 1,
            16 => 2,
            32 => 4,
            bits => bail!(DecodeError::UnsupportedBitDepth(bits)),
        };

        let mut headers = Vec::with_capacity(nchan);
        for (i, block) in bytes[..headers_end].chunks_exact(HEADER_SIZE).enumerate() {
            let header = ChannelHeader::read(block)?;
            if header.samples < 1 {
                bail!(DecodeError::InvalidSampleCount {
                    channel: i,
                    samples: header.samples,
                });
            }
            if header.nchan != first.nchan {
                self.warn(
                    &mut warnings,
                    DecodeError::ChannelCountMismatch {
                        channel: i,
                        expected: first.nchan,
                        found: header.nchan,
                    },
                )?;
            }
            headers.push(header);
        }

        let data_offset = payload_offset(first.data, nchan);
        if bytes.len() < data_offset {
            bail!(DecodeError::Truncated {
                needed: data_offset,
                available: bytes.len(),
            });
        }

        let extra = bytes[headers_end..data_offset].to_vec();
        let payload = &bytes[data_offset..];

        let trace_samples: usize = headers.iter().map(|h| h.samples as usize).sum();
        let trace_bytes = trace_samples * sample_size;
        let traces = payload.len() / trace_bytes;
        let leftover = payload.len() % trace_bytes;
        if leftover != 0 {
            self.warn(&mut warnings, DecodeError::PartialTrace(leftover))?;
        }

        trace!(
            "Layout: {nchan} channel(s), {} extra bytes, data at {data_offset}, {traces} traces of {trace_samples} x {}-bit samples",
            extra.len(),
            first.bits
        );

        let sample_at = |index: usize| -> f64 {
            let at = index * sample_size;
            match sample_size {
                1 => payload[at] as f64,
                2 => u16::from_le_bytes([payload[at], payload[at + 1]]) as f64,
                _ => i32::from_le_bytes([
                    payload[at],
                    payload[at + 1],
                    payload[at + 2],
                    payload[at + 3],
                ]) as f64,
            }
        };

        let mut channels = Vec::with_capacity(nchan);
        let mut channel_start = 0;
        for (i, mut header) in headers.into_iter().enumerate() {
            let samples = header.samples as usize;
            let zero = match self.options.zero.get(i) {
                Some(&zero) => {
                    header.zero = zero.min(samples) as i16;
                    zero.min(samples)
                }
                None => (header.zero.max(0) as usize).min(samples),
            };

            let data = Array2::from_shape_fn((samples - zero, traces), |(row, col)| {
                sample_at(col * trace_samples + channel_start + zero + row)
            });
            channel_start += samples;

            let antenna_mhz = self.resolve_antenna(i, &header, &mut warnings)?;

            debug!(
                "Channel {i}: {} x {traces}, zero {zero}, antenna \"{}\"",
                samples - zero,
                header.antenna_name()
            );

            let mut channel = Channel::new(header, data);
            channel.antenna_mhz = antenna_mhz;
            channels.push(channel);
        }

        let dataset = Dataset::new(channels, extra)?;
        info!(
            "Decoded {} channel(s), {} traces, {}-bit samples",
            dataset.channel_count(),
            dataset.traces(),
            first.bits
        );

        Ok(Decoded { dataset, warnings })
    }

    fn resolve_antenna(
        &self,
        channel: usize,
        header: &ChannelHeader,
        warnings: &mut Vec<DecodeError>,
    ) -> Result<Option<f64>> {
        let name = header.antenna_name();
        if name.is_empty() {
            return Ok(self.options.antenna_freq.get(channel).copied());
        }

        let user = self.options.antenna_freq.get(channel).copied();
        match antenna::resolve(&name, user) {
            Some((freq, FrequencySource::Known)) => Ok(Some(freq)),
            Some((freq, source)) => {
                self.warn(
                    warnings,
                    DecodeError::UnknownAntenna {
                        channel,
                        name,
                        frequency_mhz: freq,
                        origin: source.as_str(),
                    },
                )?;
                Ok(Some(freq))
            }
            None => {
                self.warn(warnings, DecodeError::UnresolvedAntenna { channel, name })?;
                Ok(None)
            }
        }
    }

    fn warn(&self, warnings: &mut Vec<DecodeError>, err: DecodeError) -> Result<()> {
        log_or_err!(self.options, log::Level::Warn, err);
        warnings.push(err);
        Ok(())
    }
}
