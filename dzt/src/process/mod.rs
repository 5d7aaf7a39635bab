/// Container decoding.
///
/// Provides the [`Decoder`](decode::Decoder), which reads a DZT file into a
/// [`Dataset`](crate::structs::dataset::Dataset) and reports recoverable
/// problems as warnings.
pub mod decode;

/// Container encoding.
///
/// Provides the [`Encoder`](encode::Encoder), which writes a dataset back
/// as 32-bit DZT.
pub mod encode;

/// Batch orchestration.
///
/// Provides the [`Session`](session::Session), which loads files and runs
/// the active filters as blocking worker units and keeps the decoded
/// originals for reset.
pub mod session;
