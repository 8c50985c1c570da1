//! Parsing CSV lines into trades, and a lazy source over a buffered reader.

use std::error::Error;
use std::fmt;
use std::io::{self, BufRead};

use crate::Trade;

/// Why a single CSV line failed to parse.
#[derive(Debug)]
pub enum ParseError {
    /// The line did not split into the expected number of comma fields.
    FieldCount { expected: usize, found: usize },
    /// A single-byte field (exchange, side, condition) was empty.
    EmptyField(&'static str),
    /// A numeric field failed to parse or was out of range.
    InvalidNumber { field: &'static str, value: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::FieldCount { expected, found } => {
                write!(f, "expected {} comma-separated fields, found {}", expected, found)
            }
            ParseError::EmptyField(field) => write!(f, "field '{}' is empty", field),
            ParseError::InvalidNumber { field, value } => {
                write!(f, "field '{}' is not a valid number: '{}'", field, value)
            }
        }
    }
}

impl Error for ParseError {}

/// An error raised while iterating a CSV trade source.
#[derive(Debug)]
pub enum SourceError {
    /// The underlying reader failed.
    Io(io::Error),
    /// A line could not be parsed into a trade.
    Malformed { line_number: u64, reason: String },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(e) => write!(f, "failed to read trade source: {}", e),
            SourceError::Malformed { line_number, reason } => {
                write!(f, "line {}: {}", line_number, reason)
            }
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SourceError::Io(e) => Some(e),
            SourceError::Malformed { .. } => None,
        }
    }
}

/// Parses one CSV line (without its terminator) into a trade.
///
/// `line_ending` is the newline marker observed for this line, `b'\n'` or
/// `b'\r'`, and is stored in the trade so re-serialization can reproduce it.
pub fn parse_trade(line: &str, line_ending: u8) -> Result<Trade, ParseError> {
    let tokens: Vec<&str> = line.split(',').collect();
    if tokens.len() != 8 {
        return Err(ParseError::FieldCount { expected: 8, found: tokens.len() });
    }

    let (price, overflow_price_digits) = parse_price(tokens[6])?;

    Ok(Trade {
        symbol: tokens[0].to_string(),
        exchange_newline: (first_byte(tokens[1], "exchange")?, line_ending),
        side: first_byte(tokens[2], "side")?,
        condition: first_byte(tokens[3], "condition")?,
        send_time: parse_number(tokens[4], "send_time")?,
        receive_time: parse_number(tokens[5], "receive_time")?,
        price,
        overflow_price_digits,
        quantity: parse_number(tokens[7], "quantity")?,
    })
}

fn first_byte(token: &str, field: &'static str) -> Result<u8, ParseError> {
    token.bytes().next().ok_or(ParseError::EmptyField(field))
}

fn parse_number<T: std::str::FromStr>(token: &str, field: &'static str) -> Result<T, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidNumber { field, value: token.to_string() })
}

/// Splits a price token into the times-100 magnitude and the overflow text.
///
/// The magnitude keeps the integer digits plus exactly two decimal digits,
/// zero-filled when the token has fewer. The overflow string gets a leading
/// '-' when the token is negative, then every decimal digit past the second
/// (`"-3.1415"` gives magnitude 314 and overflow `"-15"`).
fn parse_price(token: &str) -> Result<(i32, String), ParseError> {
    let bytes = token.as_bytes();
    let mut digits = String::new();

    let mut index = 0;
    while index < bytes.len() && bytes[index] != b'.' {
        digits.push(bytes[index] as char);
        index += 1;
    }
    index += 1; // skip the '.'
    for _ in 0..2 {
        if index < bytes.len() {
            digits.push(bytes[index] as char);
            index += 1;
        } else {
            digits.push('0');
        }
    }

    let invalid = || ParseError::InvalidNumber { field: "price", value: token.to_string() };
    let value: i64 = digits.parse().map_err(|_| invalid())?;
    let price = i32::try_from(value.unsigned_abs()).map_err(|_| invalid())?;

    let mut overflow = String::new();
    if bytes.first() == Some(&b'-') {
        overflow.push('-');
    }
    if let Some(dot) = token.find('.') {
        let rest = dot + 3;
        if rest < token.len() {
            overflow.push_str(&token[rest..]);
        }
    }

    Ok((price, overflow))
}

/// Lazily yields trades from a CSV reader, one per non-blank line.
///
/// Each line's ending is captured before trimming so that CR/LF selection
/// survives the round trip; blank lines are skipped.
#[derive(Debug)]
pub struct CsvTradeSource<R: BufRead> {
    reader: R,
    line_number: u64,
    raw_line: Vec<u8>,
}

impl<R: BufRead> CsvTradeSource<R> {
    pub fn new(reader: R) -> Self {
        CsvTradeSource { reader, line_number: 0, raw_line: Vec::new() }
    }
}

impl<R: BufRead> Iterator for CsvTradeSource<R> {
    type Item = Result<Trade, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.raw_line.clear();
            match self.reader.read_until(b'\n', &mut self.raw_line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(SourceError::Io(e))),
            }
            self.line_number += 1;

            let mut line = self.raw_line.as_slice();
            if line.ends_with(b"\n") {
                line = &line[..line.len() - 1];
            }
            let line_ending = if line.ends_with(b"\r") { b'\r' } else { b'\n' };

            let malformed = |reason: String| SourceError::Malformed {
                line_number: self.line_number,
                reason,
            };

            let line = match std::str::from_utf8(line) {
                Ok(text) => text.trim(),
                Err(_) => return Some(Err(malformed("line is not valid utf-8".to_string()))),
            };
            if line.is_empty() {
                continue;
            }

            return Some(parse_trade(line, line_ending).map_err(|e| malformed(e.to_string())));
        }
    }
}
