//! In-memory survey: channels with their headers and sample matrices.

use std::fmt::Display;
use std::path::PathBuf;

use anyhow::{Result, bail, ensure};
use ndarray::Array2;

use crate::structs::header::ChannelHeader;
use crate::utils::errors::EncodeError;

/// Rows are time samples, columns are traces.
pub type SampleMatrix = Array2<f64>;

/// What the values of a channel's matrix represent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Domain {
    #[default]
    Time,
    Frequency,
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Domain::Time => write!(f, "time"),
            Domain::Frequency => write!(f, "frequency"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub header: ChannelHeader,
    pub data: SampleMatrix,
    pub domain: Domain,
    /// Antenna center frequency in MHz, when known or estimated.
    pub antenna_mhz: Option<f64>,
}

impl Channel {
    pub fn new(header: ChannelHeader, data: SampleMatrix) -> Self {
        Self {
            header,
            data,
            domain: Domain::Time,
            antenna_mhz: None,
        }
    }

    pub fn samples(&self) -> usize {
        self.data.nrows()
    }

    pub fn traces(&self) -> usize {
        self.data.ncols()
    }

    /// Rows removed from the top of the trace on decode.
    pub fn zero_offset(&self) -> usize {
        self.header.zero.max(0) as usize
    }
}

/// A decoded survey.
///
/// All channels share the trace count. The `extra` block sits between the
/// last channel header and the sample payload and is carried verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    channels: Vec<Channel>,
    pub extra: Vec<u8>,
    pub source: Option<PathBuf>,
}

impl Dataset {
    pub fn new(channels: Vec<Channel>, extra: Vec<u8>) -> Result<Self> {
        if channels.is_empty() {
            bail!(EncodeError::NoChannels);
        }

        let traces = channels[0].traces();
        for (i, channel) in channels.iter().enumerate().skip(1) {
            ensure!(
                channel.traces() == traces,
                EncodeError::TraceCountMismatch {
                    channel: i,
                    expected: traces,
                    found: channel.traces(),
                }
            );
        }

        Ok(Self {
            channels,
            extra,
            source: None,
        })
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn traces(&self) -> usize {
        self.channels.first().map_or(0, Channel::traces)
    }

    /// A short name for log messages.
    pub fn label(&self) -> String {
        self.source
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<memory>".to_string())
    }
}
