//! Data structures representing DZT container components.
//!
//! Contains the per-channel header block, the packed date fields it embeds,
//! the antenna frequency table, and the in-memory dataset that decoding
//! produces and the filter pipeline transforms.

pub mod antenna;
pub mod dataset;
pub mod date;
pub mod header;
