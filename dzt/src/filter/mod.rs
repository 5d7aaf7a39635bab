//! Signal processing on channel sample matrices.
//!
//! Each transform takes one channel's matrix and returns the next one; the
//! [`pipeline`] runs a user-ordered set of them over whole datasets.

pub mod background;
pub mod bandpass;
pub mod pipeline;
pub mod spec;
pub mod spectrum;
pub mod wavelet;
