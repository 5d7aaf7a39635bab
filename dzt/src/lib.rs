//! Reader, writer and filters for GSSI DZT ground-penetrating-radar files.
//!
//! ## Technical Overview
//!
//! A DZT file holds one 1024-byte header per channel, an optional block of
//! extra bytes, then the samples trace by trace. Each trace stores every
//! channel's samples back to back, so a file with two channels of 512
//! samples has 1024 samples per trace.
//!
//! ### Header
//!
//! - Typed fields: sample count, bit depth, time range, channel count,
//!   permittivity, survey geometry and two packed dates
//! - Opaque regions: antenna and name blocks, the info area and GPS
//!   references, kept byte-for-byte
//!
//! ### Samples
//!
//! Field units write 8-, 16- or 32-bit samples. The encoder always writes
//! 32-bit signed integers, rounding half to even.
//!
//! ## Quick Start
//!
//! 1. Decode a file with [`process::decode::Decoder`]
//! 2. Build an [`filter::pipeline::ActiveFilterSet`] and run it with
//!    [`filter::pipeline::Pipeline`]
//! 3. Write the result with [`process::encode::Encoder`]
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dzt::filter::pipeline::{ActiveFilterSet, Pipeline};
//! use dzt::process::{decode::Decoder, encode::Encoder};
//!
//! let decoded = Decoder::default().read_path(Path::new("FILE____001.DZT"))?;
//! for warning in &decoded.warnings {
//!     eprintln!("{warning}");
//! }
//!
//! let mut filters = ActiveFilterSet::new();
//! filters.insert("bgr:window=0".parse()?);
//! filters.insert("bandpass:freqmin=70,freqmax=130".parse()?);
//!
//! let filtered = Pipeline::apply(decoded.dataset, &filters)?;
//! let bytes = Encoder::default().encode(&filtered)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Filters and the ordered pipeline that applies them.
///
/// - **Background removal** ([`filter::background`]): row-mean subtraction
/// - **Bandpass** ([`filter::bandpass`]): triangular FIR down each trace
/// - **Spectrum** ([`filter::spectrum`]): 2-D Fourier transform
/// - **Wavelets** ([`filter::wavelet`]): per-trace DWT/CWT coefficients
/// - **Specs** ([`filter::spec`]): filter names and parameters
pub mod filter;

/// Decoding, encoding and batch orchestration.
pub mod process;

/// Data structures representing DZT components.
///
/// - **Headers** ([`structs::header`]): per-channel header blocks
/// - **Dates** ([`structs::date`]): packed date fields
/// - **Antennas** ([`structs::antenna`]): model to frequency table
/// - **Datasets** ([`structs::dataset`]): channels and sample matrices
pub mod structs;

/// Supporting infrastructure.
///
/// - **Byte I/O** ([`utils::bytes`]): little-endian block serialization
/// - **Error Handling** ([`utils::errors`]): error types
/// - **Workers** ([`utils::worker`]): blocking worker threads
pub mod utils;
