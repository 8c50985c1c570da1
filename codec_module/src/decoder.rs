//! Single-pass decompression back to the original CSV bytes.
//!
//! The header is read byte-aligned: the trade count, then nine tables of
//! (symbol, prefix length) records from which the canonical codes are
//! rebuilt and inverted. The payload is then consumed bit by bit; a prefix
//! is extended until it matches exactly one table entry, which always
//! happens for an intact stream because canonical prefix codes are complete.
//! Predicted fields are reconstructed by adding the replayed forecasts back
//! onto the decoded residuals.

use std::collections::HashMap;
use std::io::{Read, Write};

use bits_module::BitReader;
use huffman_module::{SymbolLength, canonical_code_map};
use trade_module::Trade;

use crate::error::CodecError;
use crate::stats_collector::StatsCollector;
use crate::wire::{self, WireSymbol};

/// Decode-side table: canonical bit sequences back to symbols.
struct DecodeTable<S> {
    prefixes: HashMap<Vec<u8>, S>,
    max_prefix_length: usize,
}

impl<S: WireSymbol> DecodeTable<S> {
    /// Reads one table's (symbol, length) records from the header and
    /// rebuilds the canonical mapping, inverted for decoding.
    fn read<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let table_size = wire::read_u32(reader)?;
        let mut records = Vec::with_capacity(table_size as usize);
        for _ in 0..table_size {
            let symbol = S::read_symbol(reader)?;
            let prefix_length = wire::read_u32(reader)?;
            records.push(SymbolLength { symbol, prefix_length });
        }

        let mut prefixes = HashMap::with_capacity(records.len());
        let mut max_prefix_length = 0;
        for (symbol, prefix) in canonical_code_map(records) {
            max_prefix_length = max_prefix_length.max(prefix.len());
            prefixes.insert(prefix, symbol);
        }
        Ok(DecodeTable { prefixes, max_prefix_length })
    }

    /// Pulls bits until the accumulated prefix matches a code.
    ///
    /// A single-entry table matches on the empty prefix and consumes no
    /// bits. A prefix that outgrows every code in the table, or a payload
    /// that ends mid-prefix, means the stream is corrupt.
    fn decode_symbol<R: Read>(&self, bits: &mut BitReader<R>) -> Result<S, CodecError> {
        let mut prefix = Vec::new();
        loop {
            if let Some(symbol) = self.prefixes.get(&prefix) {
                return Ok(symbol.clone());
            }
            if prefix.len() >= self.max_prefix_length {
                return Err(CodecError::CorruptStream("bit prefix matches no code in its table"));
            }
            match bits.read_bit().map_err(CodecError::InputRead)? {
                Some(bit) => prefix.push(bit),
                None => return Err(CodecError::CorruptStream("payload ended before all trades")),
            }
        }
    }
}

/// Decodes a compressed stream and writes the reconstructed CSV lines to
/// the output stream.
pub struct Decoder<R: Read, W: Write> {
    in_stream: R,
    out_stream: W,
}

impl<R: Read, W: Write> Decoder<R, W> {
    pub fn new(in_stream: R, out_stream: W) -> Self {
        Decoder { in_stream, out_stream }
    }

    /// Runs the whole decode. Returns the number of trades written.
    ///
    /// Bytes past the declared trade count are ignored; the trailing bits
    /// of the final payload byte are pad zeros.
    pub fn decode(mut self) -> Result<u64, CodecError> {
        let number_of_trades = wire::read_u64(&mut self.in_stream)?;

        let symbol_table: DecodeTable<String> = DecodeTable::read(&mut self.in_stream)?;
        let exchange_newline_table: DecodeTable<(u8, u8)> = DecodeTable::read(&mut self.in_stream)?;
        let side_table: DecodeTable<u8> = DecodeTable::read(&mut self.in_stream)?;
        let condition_table: DecodeTable<u8> = DecodeTable::read(&mut self.in_stream)?;
        let send_time_table: DecodeTable<i64> = DecodeTable::read(&mut self.in_stream)?;
        let receive_time_diff_table: DecodeTable<i64> = DecodeTable::read(&mut self.in_stream)?;
        let price_table: DecodeTable<i32> = DecodeTable::read(&mut self.in_stream)?;
        let price_overflow_table: DecodeTable<String> = DecodeTable::read(&mut self.in_stream)?;
        let quantity_table: DecodeTable<i32> = DecodeTable::read(&mut self.in_stream)?;

        let mut bits = BitReader::new(self.in_stream);
        let mut trade_stats = StatsCollector::new();
        for _ in 0..number_of_trades {
            // Field order is fixed: the symbol must be known before the
            // price and quantity forecasts, and the send time before the
            // receive time is rebuilt.
            let symbol = symbol_table.decode_symbol(&mut bits)?;
            let exchange_newline = exchange_newline_table.decode_symbol(&mut bits)?;
            let side = side_table.decode_symbol(&mut bits)?;
            let condition = condition_table.decode_symbol(&mut bits)?;

            let send_time = send_time_table
                .decode_symbol(&mut bits)?
                .wrapping_add(trade_stats.predict_send_time());
            let receive_time = receive_time_diff_table
                .decode_symbol(&mut bits)?
                .wrapping_add(send_time)
                .wrapping_add(trade_stats.predict_receive_time_diff());
            let price = price_table
                .decode_symbol(&mut bits)?
                .wrapping_add(trade_stats.predict_price(&symbol));
            let overflow_price_digits = price_overflow_table.decode_symbol(&mut bits)?;
            let quantity = quantity_table
                .decode_symbol(&mut bits)?
                .wrapping_add(trade_stats.predict_quantity(&symbol));

            let trade = Trade {
                symbol,
                exchange_newline,
                side,
                condition,
                send_time,
                receive_time,
                price,
                overflow_price_digits,
                quantity,
            };
            self.out_stream
                .write_all(trade.to_csv().as_bytes())
                .map_err(CodecError::OutputWrite)?;
            trade_stats.add_trade(&trade);
        }

        self.out_stream.flush().map_err(CodecError::OutputWrite)?;
        Ok(number_of_trades)
    }
}
