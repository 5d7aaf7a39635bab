use std::path::PathBuf;

/// Logs `$err` at `$level`, or returns it when `$level` reaches the
/// configured `fail_level` of `$state`.
#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DateError {
    #[error("Year {0} cannot be packed (supported range is 1980-2107)")]
    YearOutOfRange(i32),

    #[error("Packed date {0:#010X} is not a valid calendar date")]
    InvalidDate(u32),
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("Cannot read {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File is truncated: {needed} bytes of header required, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(i16),

    #[error("Invalid sample count on channel {channel}: {samples}")]
    InvalidSampleCount { channel: usize, samples: i16 },

    #[error("Unsupported sample bit depth: {0}")]
    UnsupportedBitDepth(i16),

    #[error("Channel {channel} declares {found} channels, channel 0 declares {expected}")]
    ChannelCountMismatch {
        channel: usize,
        expected: i16,
        found: i16,
    },

    #[error(
        "Unknown antenna \"{name}\" on channel {channel}, using {frequency_mhz} MHz ({origin})"
    )]
    UnknownAntenna {
        channel: usize,
        name: String,
        frequency_mhz: f64,
        origin: &'static str,
    },

    #[error("Unknown antenna \"{name}\" on channel {channel}, frequency unavailable")]
    UnresolvedAntenna { channel: usize, name: String },

    #[error("Discarding {0} trailing bytes that do not form a complete trace")]
    PartialTrace(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("Dataset has no channels")]
    NoChannels,

    #[error("Block serialized to {actual} bytes, expected {expected}")]
    BlockSize { expected: usize, actual: usize },

    #[error("Channel {channel} holds frequency-domain data and cannot be written as samples")]
    FrequencyDomain { channel: usize },

    #[error("Channel {channel} has {found} traces, channel 0 has {expected}")]
    TraceCountMismatch {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error(
        "Channel {channel}: zero offset {zero} + {rows} rows does not match the declared {declared} samples"
    )]
    SampleCountMismatch {
        channel: usize,
        zero: usize,
        rows: usize,
        declared: i16,
    },

    #[error(
        "Writing {0} channels: multi-channel DZT output has not been verified against other readers"
    )]
    UnverifiedMultiChannel(usize),

    #[error("Channel {channel} declares {declared} channels, writing {actual}")]
    ChannelCountMismatch {
        channel: usize,
        declared: i16,
        actual: usize,
    },

    #[error(
        "rh_data {declared} does not place the payload after {extra} extra bytes, writing {corrected}"
    )]
    DataOffsetMismatch {
        declared: i16,
        extra: usize,
        corrected: i16,
    },

    #[error("Extra block of {0} bytes cannot be addressed by rh_data (needs a multiple of 1024)")]
    UnalignedExtra(usize),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ParamError {
    #[error("Unknown filter \"{0}\"")]
    UnknownFilter(String),

    #[error("{filter}: missing parameter \"{param}\"")]
    Missing { filter: String, param: String },

    #[error("{filter}: parameter \"{param}\" is not a number: \"{value}\"")]
    NotNumeric {
        filter: String,
        param: String,
        value: String,
    },

    #[error("{filter}: parameter \"{param}\" must not be negative: \"{value}\"")]
    Negative {
        filter: String,
        param: String,
        value: String,
    },

    #[error("{filter}: parameter \"{param}\" is not a boolean: \"{value}\"")]
    NotBoolean {
        filter: String,
        param: String,
        value: String,
    },

    #[error("{filter}: unknown parameter \"{param}\"")]
    Unknown { filter: String, param: String },

    #[error("{filter}: malformed parameter \"{text}\", expected key=value")]
    Malformed { filter: String, text: String },
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum BandpassError {
    #[error("Sampling frequency must be positive, got {0} Hz")]
    InvalidSamplingFrequency(f64),

    #[error("Cutoffs must satisfy 0 < low < high < {nyquist} Hz, got {low} and {high} Hz")]
    InvalidCutoff { low: f64, high: f64, nyquist: f64 },
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    #[error("{filter} requires time-domain input, channel {channel} holds frequency-domain data")]
    DomainMismatch {
        filter: &'static str,
        channel: usize,
    },

    #[error("Channel {channel} has no usable sampling frequency (range = {range} ns)")]
    MissingSamplingFrequency { channel: usize, range: f32 },

    #[error("Wavelet family \"{0}\" is not implemented")]
    UnsupportedWavelet(String),
}

#[derive(thiserror::Error, Debug)]
pub enum WorkerError {
    #[error("Worker \"{name}\" panicked: {message}")]
    Panicked { name: String, message: String },

    #[error("Failed to spawn worker \"{name}\": {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
