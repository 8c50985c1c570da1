//! The trade stream codec.
//!
//! Compression is two passes over the CSV source. The first pass runs the
//! predictor, reduces every field of every trade to a residual, counts
//! residual frequencies, and writes a header of nine canonical Huffman
//! tables. The second pass re-runs an identical predictor and emits each
//! trade as nine variable-length bit codes. Decompression reads the header,
//! rebuilds the nine tables from the (symbol, length) records, and replays
//! the same predictor while decoding, so the forecasts it adds back match
//! the ones the encoder subtracted bit for bit.
//!
//! All fixed-width header integers are little-endian two's-complement;
//! compressed files are not portable to machines that disagree on that.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod stats_collector;
mod wire;

pub use decoder::Decoder;
pub use encoder::{Encoder, HeaderSizes};
pub use error::CodecError;
pub use stats_collector::StatsCollector;
