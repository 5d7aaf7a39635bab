use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use dzt::filter::spec::FilterSpec;
use dzt::process::decode::DecodeOptions;

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = env!("DZTOOL_LONG_VERSION"),
    about        = "Tools for inspecting, filtering and converting GSSI DZT radar files",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress spinners during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn fail_level(&self) -> log::Level {
        if self.strict {
            log::Level::Warn
        } else {
            log::Level::Error
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print header information for a DZT file.
    Info(InfoArgs),

    /// Filter DZT files and write the result.
    Process(ProcessArgs),

    /// List the available filters and their parameters.
    Filters,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Antenna frequency in MHz for a channel whose antenna is not recognized
    /// (repeat once per channel).
    #[arg(long, value_name = "MHZ")]
    pub antenna_freq: Vec<f64>,

    /// Time-zero sample offset, replacing the header value (repeat once per
    /// channel).
    #[arg(long, value_name = "SAMPLES")]
    pub zero: Vec<usize>,
}

impl DecodeArgs {
    pub fn to_options(&self, fail_level: log::Level) -> DecodeOptions {
        DecodeOptions {
            zero: self.zero.clone(),
            antenna_freq: self.antenna_freq.clone(),
            fail_level,
        }
    }
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input DZT file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Print the full header in a structured format instead of a summary.
    #[arg(long, value_enum)]
    pub header_format: Option<HeaderFormat>,

    #[command(flatten)]
    pub decode: DecodeArgs,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input DZT files.
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Filter to apply, e.g. "bgr:window=5" or "bandpass:freqmin=70,freqmax=130"
    /// (repeat to chain; applied in the order given).
    #[arg(long, value_name = "SPEC")]
    pub filter: Vec<FilterSpec>,

    /// YAML processing profile with a list of filters, applied before --filter.
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Dzt)]
    pub format: OutputFormat,

    /// Output file, or output directory when several inputs are given.
    #[arg(long, value_name = "PATH")]
    pub output_path: Option<PathBuf>,

    #[command(flatten)]
    pub decode: DecodeArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum HeaderFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// DZT container with 32-bit samples.
    Dzt,
    /// One CSV table per channel.
    Csv,
    /// Grayscale radargram image.
    Png,
    /// Header fields as JSON.
    Json,
    /// Header fields as YAML.
    Yaml,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Dzt => "DZT",
            OutputFormat::Csv => "csv",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}
