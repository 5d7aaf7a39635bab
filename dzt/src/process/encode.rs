use std::io::Write;

use anyhow::{Result, bail};
use chrono::{Local, NaiveDateTime};
use log::{debug, info};

use crate::log_or_err;
use crate::structs::dataset::{Dataset, Domain};
use crate::structs::date::PackedDate;
use crate::structs::header::{HEADER_SIZE, payload_offset};
use crate::utils::errors::EncodeError;

/// Serializes a [`Dataset`] into the DZT container layout.
///
/// Output is always 32-bit: one header block per channel, the dataset's
/// extra block, then every trace as the concatenation of each channel's
/// zero-padded column, rounded to `i32`.
#[derive(Debug, Clone)]
pub struct Encoder {
    modified: Option<NaiveDateTime>,
    fail_level: log::Level,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            modified: None,
            fail_level: log::Level::Error,
        }
    }
}

/// What an encode call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSummary {
    pub channels: usize,
    pub traces: usize,
    pub header_bytes: usize,
    pub payload_bytes: usize,
    /// Set when more than one channel was written. Such files have not been
    /// checked against other DZT readers.
    pub unverified_multichannel: bool,
}

impl Encoder {
    /// Uses a fixed modification date instead of the current local time.
    pub fn with_modified(mut self, modified: NaiveDateTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Sets the failure level for validation errors.
    ///
    /// - `log::Level::Error`: Only fail on Error level messages (default)
    /// - `log::Level::Warn`: Fail on Warning level and above (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    pub fn encode(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(dataset, &mut buf)?;
        Ok(buf)
    }

    pub fn write<W: Write>(&self, dataset: &Dataset, mut writer: W) -> Result<EncodeSummary> {
        let channels = dataset.channels();
        let traces = dataset.traces();

        for (i, channel) in channels.iter().enumerate() {
            if channel.domain == Domain::Frequency {
                bail!(EncodeError::FrequencyDomain { channel: i });
            }

            let zero = channel.zero_offset();
            let rows = channel.samples();
            if zero + rows != channel.header.samples.max(0) as usize {
                log_or_err!(
                    self,
                    log::Level::Warn,
                    EncodeError::SampleCountMismatch {
                        channel: i,
                        zero,
                        rows,
                        declared: channel.header.samples,
                    }
                );
            }
        }

        let nchan = channels.len();
        let nchan_field = i16::try_from(nchan)?;
        for (i, channel) in channels.iter().enumerate() {
            if channel.header.nchan != nchan_field {
                log_or_err!(
                    self,
                    log::Level::Warn,
                    EncodeError::ChannelCountMismatch {
                        channel: i,
                        declared: channel.header.nchan,
                        actual: nchan,
                    }
                );
            }
        }
        let Some(first) = channels.first() else {
            bail!(EncodeError::NoChannels);
        };
        let data_field = self.data_field(first.header.data, nchan, dataset.extra.len())?;

        let unverified_multichannel = nchan > 1;
        if unverified_multichannel {
            log_or_err!(
                self,
                log::Level::Warn,
                EncodeError::UnverifiedMultiChannel(nchan)
            );
        }

        let modified = match &self.modified {
            Some(dt) => PackedDate::from_datetime(dt)?,
            None => PackedDate::from_datetime(&Local::now().naive_local())?,
        };

        for channel in channels {
            let mut header = channel.header.clone();
            header.nchan = nchan_field;
            if let Some(data) = data_field {
                header.data = data;
            }
            writer.write_all(&header.to_block(modified)?)?;
        }
        writer.write_all(&dataset.extra)?;
        let header_bytes = channels.len() * HEADER_SIZE + dataset.extra.len();

        debug!(
            "Wrote {} header blocks and {} extra bytes, modified {modified}",
            channels.len(),
            dataset.extra.len()
        );

        let trace_len: usize = channels.iter().map(|c| c.zero_offset() + c.samples()).sum();
        let mut trace = Vec::with_capacity(trace_len * 4);

        for col in 0..traces {
            trace.clear();
            for channel in channels {
                for _ in 0..channel.zero_offset() {
                    trace.extend_from_slice(&0i32.to_le_bytes());
                }
                for &value in channel.data.column(col) {
                    trace.extend_from_slice(&to_sample(value).to_le_bytes());
                }
            }
            writer.write_all(&trace)?;
        }
        writer.flush()?;

        let payload_bytes = traces * trace_len * 4;
        info!(
            "Encoded {} channel(s) x {traces} traces ({} bytes)",
            channels.len(),
            header_bytes + payload_bytes
        );

        Ok(EncodeSummary {
            channels: channels.len(),
            traces,
            header_bytes,
            payload_bytes,
            unverified_multichannel,
        })
    }

    /// Returns a replacement `rh_data` when the declared one would not lead a
    /// reader past the extra block to the payload.
    fn data_field(&self, declared: i16, nchan: usize, extra: usize) -> Result<Option<i16>> {
        let payload_at = nchan * HEADER_SIZE + extra;
        if payload_offset(declared, nchan) == payload_at {
            return Ok(None);
        }

        let corrected = match i16::try_from(payload_at / HEADER_SIZE) {
            Ok(units) if payload_at % HEADER_SIZE == 0 && units < HEADER_SIZE as i16 => units,
            _ => bail!(EncodeError::UnalignedExtra(extra)),
        };
        log_or_err!(
            self,
            log::Level::Warn,
            EncodeError::DataOffsetMismatch {
                declared,
                extra,
                corrected,
            }
        );
        Ok(Some(corrected))
    }
}

/// Rounds half to even and saturates; NaN becomes 0.
#[inline]
fn to_sample(value: f64) -> i32 {
    value.round_ties_even() as i32
}
