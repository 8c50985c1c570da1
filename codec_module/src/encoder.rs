//! Two-pass compression of a CSV trade capture.
//!
//! A value cannot be Huffman-coded until the code tables exist, and the
//! tables depend on every residual in the file, so the source is read twice.
//! `encode_header` makes the first pass: it runs the predictor, counts the
//! nine residual frequency maps, builds the canonical tables, and writes the
//! header. `encode_trades` makes the second pass with a fresh predictor and
//! streams the payload bits, flushing to the output whenever a megabyte of
//! bytes is fully packed.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use bits_module::BitPacker;
use huffman_module::{canonical_code_map, code_lengths};
use trade_module::CsvTradeSource;

use crate::error::CodecError;
use crate::stats_collector::StatsCollector;
use crate::wire::WireSymbol;

/// Flush the packed payload once this many bytes are complete.
const FLUSH_SIZE: usize = 1_048_576;

/// Size in bytes of each per-field table within the written header.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderSizes {
    pub symbol: usize,
    pub exchange_newline: usize,
    pub side: usize,
    pub condition: usize,
    pub send_time: usize,
    pub receive_time_diff: usize,
    pub price: usize,
    pub price_overflow: usize,
    pub quantity: usize,
}

/// The nine encode-side code tables, kept between the two passes.
struct EncodeTables {
    symbol: IndexMap<String, Vec<u8>>,
    exchange_newline: IndexMap<(u8, u8), Vec<u8>>,
    side: IndexMap<u8, Vec<u8>>,
    condition: IndexMap<u8, Vec<u8>>,
    send_time: IndexMap<i64, Vec<u8>>,
    receive_time_diff: IndexMap<i64, Vec<u8>>,
    price: IndexMap<i32, Vec<u8>>,
    price_overflow: IndexMap<String, Vec<u8>>,
    quantity: IndexMap<i32, Vec<u8>>,
}

pub struct Encoder {
    input_path: PathBuf,
    out_stream: BufWriter<File>,
    tables: Option<EncodeTables>,
    header_sizes: HeaderSizes,
    num_trades: u64,
}

impl Encoder {
    /// Creates (truncating) the output file. The input is opened once per
    /// pass, so it must be a regular file rather than a pipe.
    pub fn new(input_path: &Path, output_path: &Path) -> Result<Self, CodecError> {
        let out_file = File::create(output_path).map_err(CodecError::OutputWrite)?;
        Ok(Encoder {
            input_path: input_path.to_path_buf(),
            out_stream: BufWriter::new(out_file),
            tables: None,
            header_sizes: HeaderSizes::default(),
            num_trades: 0,
        })
    }

    /// First pass: builds the nine canonical tables and writes the header.
    ///
    /// Returns the header size in bytes. A source with zero trades writes
    /// nothing at all, leaving the output empty.
    pub fn encode_header(&mut self) -> Result<usize, CodecError> {
        let mut symbol_count: IndexMap<String, u64> = IndexMap::new();
        let mut exchange_newline_count: IndexMap<(u8, u8), u64> = IndexMap::new();
        let mut side_count: IndexMap<u8, u64> = IndexMap::new();
        let mut condition_count: IndexMap<u8, u64> = IndexMap::new();
        let mut send_time_count: IndexMap<i64, u64> = IndexMap::new();
        let mut receive_time_diff_count: IndexMap<i64, u64> = IndexMap::new();
        let mut price_count: IndexMap<i32, u64> = IndexMap::new();
        let mut price_overflow_count: IndexMap<String, u64> = IndexMap::new();
        let mut quantity_count: IndexMap<i32, u64> = IndexMap::new();

        let mut num_trades = 0u64;
        let mut trade_stats = StatsCollector::new();
        for trade in self.open_source()? {
            let trade = trade?;

            *symbol_count.entry(trade.symbol.clone()).or_insert(0) += 1;
            *exchange_newline_count.entry(trade.exchange_newline).or_insert(0) += 1;
            *side_count.entry(trade.side).or_insert(0) += 1;
            *condition_count.entry(trade.condition).or_insert(0) += 1;
            *send_time_count
                .entry(trade.send_time.wrapping_sub(trade_stats.predict_send_time()))
                .or_insert(0) += 1;
            let receive_time_diff = trade.receive_time.wrapping_sub(trade.send_time);
            *receive_time_diff_count
                .entry(receive_time_diff.wrapping_sub(trade_stats.predict_receive_time_diff()))
                .or_insert(0) += 1;
            *price_count
                .entry(trade.price.wrapping_sub(trade_stats.predict_price(&trade.symbol)))
                .or_insert(0) += 1;
            *price_overflow_count.entry(trade.overflow_price_digits.clone()).or_insert(0) += 1;
            *quantity_count
                .entry(trade.quantity.wrapping_sub(trade_stats.predict_quantity(&trade.symbol)))
                .or_insert(0) += 1;

            num_trades += 1;
            trade_stats.add_trade(&trade);
        }

        self.num_trades = num_trades;
        if num_trades == 0 {
            return Ok(0);
        }

        let mut header_data = Vec::new();
        header_data.extend_from_slice(&num_trades.to_le_bytes());

        let symbol = encode_table(&symbol_count, &mut header_data, &mut self.header_sizes.symbol);
        let exchange_newline = encode_table(
            &exchange_newline_count,
            &mut header_data,
            &mut self.header_sizes.exchange_newline,
        );
        let side = encode_table(&side_count, &mut header_data, &mut self.header_sizes.side);
        let condition =
            encode_table(&condition_count, &mut header_data, &mut self.header_sizes.condition);
        let send_time =
            encode_table(&send_time_count, &mut header_data, &mut self.header_sizes.send_time);
        let receive_time_diff = encode_table(
            &receive_time_diff_count,
            &mut header_data,
            &mut self.header_sizes.receive_time_diff,
        );
        let price = encode_table(&price_count, &mut header_data, &mut self.header_sizes.price);
        let price_overflow = encode_table(
            &price_overflow_count,
            &mut header_data,
            &mut self.header_sizes.price_overflow,
        );
        let quantity =
            encode_table(&quantity_count, &mut header_data, &mut self.header_sizes.quantity);

        self.tables = Some(EncodeTables {
            symbol,
            exchange_newline,
            side,
            condition,
            send_time,
            receive_time_diff,
            price,
            price_overflow,
            quantity,
        });

        self.out_stream.write_all(&header_data).map_err(CodecError::OutputWrite)?;
        Ok(header_data.len())
    }

    /// Second pass: re-reads the source with a fresh predictor and writes
    /// every trade's nine codes through the bit packer.
    pub fn encode_trades(&mut self) -> Result<(), CodecError> {
        // encode_header stores tables only when the source had trades.
        let Some(tables) = &self.tables else {
            return Ok(());
        };

        let mut converter = BitPacker::new();
        let mut trade_stats = StatsCollector::new();
        for trade in self.open_source()? {
            let trade = trade?;

            converter.write_bits(&tables.symbol[&trade.symbol]);
            converter.write_bits(&tables.exchange_newline[&trade.exchange_newline]);
            converter.write_bits(&tables.side[&trade.side]);
            converter.write_bits(&tables.condition[&trade.condition]);
            converter.write_bits(
                &tables.send_time[&trade.send_time.wrapping_sub(trade_stats.predict_send_time())],
            );
            let receive_time_diff = trade.receive_time.wrapping_sub(trade.send_time);
            converter.write_bits(
                &tables.receive_time_diff
                    [&receive_time_diff.wrapping_sub(trade_stats.predict_receive_time_diff())],
            );
            converter.write_bits(
                &tables.price
                    [&trade.price.wrapping_sub(trade_stats.predict_price(&trade.symbol))],
            );
            converter.write_bits(&tables.price_overflow[&trade.overflow_price_digits]);
            converter.write_bits(
                &tables.quantity
                    [&trade.quantity.wrapping_sub(trade_stats.predict_quantity(&trade.symbol))],
            );

            if converter.fully_packed_bytes() >= FLUSH_SIZE {
                self.out_stream
                    .write_all(&converter.take_packed_bytes())
                    .map_err(CodecError::OutputWrite)?;
            }

            trade_stats.add_trade(&trade);
        }

        // The final byte may be partially filled; its low bits are pad zeros.
        self.out_stream.write_all(converter.as_bytes()).map_err(CodecError::OutputWrite)?;
        self.out_stream.flush().map_err(CodecError::OutputWrite)?;
        Ok(())
    }

    /// Trades counted by the header pass.
    pub fn num_trades(&self) -> u64 {
        self.num_trades
    }

    /// Per-table header sizes, for the compression report.
    pub fn header_sizes(&self) -> HeaderSizes {
        self.header_sizes
    }

    fn open_source(&self) -> Result<CsvTradeSource<BufReader<File>>, CodecError> {
        let file = File::open(&self.input_path).map_err(CodecError::InputRead)?;
        Ok(CsvTradeSource::new(BufReader::new(file)))
    }
}

/// Builds one canonical table from its residual counts and appends its
/// header serialization to `out`: a `u32` entry count, then each symbol
/// followed by its `u32` prefix length, in ascending symbol order.
fn encode_table<S: WireSymbol>(
    counts: &IndexMap<S, u64>,
    out: &mut Vec<u8>,
    size: &mut usize,
) -> IndexMap<S, Vec<u8>> {
    let start = out.len();
    let codes = canonical_code_map(code_lengths(counts));

    out.extend_from_slice(&(codes.len() as u32).to_le_bytes());
    let mut entries: Vec<(&S, &Vec<u8>)> = codes.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (symbol, prefix) in entries {
        symbol.write_symbol(out);
        out.extend_from_slice(&(prefix.len() as u32).to_le_bytes());
    }

    *size = out.len() - start;
    codes
}
