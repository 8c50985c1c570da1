//! The trade record and its CSV text form.
//!
//! A trade is one line of the capture:
//! `symbol,exchange,side,condition,send_time,receive_time,price,quantity`.
//! The price column is the awkward one. It is held as `price` (the value
//! times 100, truncated, magnitude only) plus `overflow_price_digits`, which
//! carries the sign as a leading '-' and any decimal digits past the second
//! (`"3.1415"` becomes price 314 with overflow `"15"`; `"-0.14"` becomes
//! price 14 with overflow `"-"`). Splitting it this way keeps the numeric
//! part in a small dense range while still reproducing the text verbatim.
//!
//! `exchange_newline` pairs the exchange byte with the line's newline marker
//! so that files mixing Unix and Windows endings survive a round trip: a
//! `'\r'` marker means the line is terminated with `"\r\n"`.

pub mod csv_source;

pub use csv_source::{CsvTradeSource, ParseError, SourceError, parse_trade};

/// A single trade event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    /// Instrument identifier, e.g. `GEM8-GEU8`.
    pub symbol: String,
    /// The exchange byte paired with this line's newline marker
    /// (`b'\n'` or `b'\r'`).
    pub exchange_newline: (u8, u8),
    /// Event type, e.g. B/b/A/a/T.
    pub side: u8,
    /// Quote or trade condition code.
    pub condition: u8,
    /// When the event occurred on the exchange, milliseconds after midnight.
    pub send_time: i64,
    /// When the event was received, milliseconds after midnight.
    pub receive_time: i64,
    /// Price magnitude times 100, truncated toward zero.
    pub price: i32,
    /// Sign and decimal digits past the second, see the module docs.
    pub overflow_price_digits: String,
    /// Number of shares on the event.
    pub quantity: i32,
}

impl Trade {
    /// Renders the trade back to its CSV line, including the newline.
    ///
    /// The price text is rebuilt from `price` and `overflow_price_digits`:
    /// two zero-padded decimal digits plus the overflow digits, with
    /// trailing zeros stripped and the decimal point dropped when nothing
    /// remains behind it.
    pub fn to_csv(&self) -> String {
        let magnitude = self.price.unsigned_abs();
        let integer_part = magnitude / 100;

        let mut overflow = self.overflow_price_digits.as_str();
        let mut sign = "";
        if overflow.starts_with('-') {
            sign = "-";
            overflow = &overflow[1..];
        }

        let mut decimal_part = format!("{:02}", magnitude % 100);
        decimal_part.push_str(overflow);
        while decimal_part.ends_with('0') {
            decimal_part.pop();
        }

        let price_text = if decimal_part.is_empty() {
            format!("{}{}", sign, integer_part)
        } else {
            format!("{}{}.{}", sign, integer_part, decimal_part)
        };

        // Not the platform line ending: files can mix newline styles and
        // each line keeps its own.
        let newline = if self.exchange_newline.1 == b'\r' { "\r\n" } else { "\n" };

        format!(
            "{},{},{},{},{},{},{},{}{}",
            self.symbol,
            self.exchange_newline.0 as char,
            self.side as char,
            self.condition as char,
            self.send_time,
            self.receive_time,
            price_text,
            self.quantity,
            newline
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(price: i32, overflow: &str, newline: u8) -> Trade {
        Trade {
            symbol: "6AH8".to_string(),
            exchange_newline: (b'F', newline),
            side: b'B',
            condition: b'0',
            send_time: 60306043,
            receive_time: 60306043,
            price,
            overflow_price_digits: overflow.to_string(),
            quantity: 10,
        }
    }

    #[test]
    fn renders_negative_price_carried_by_overflow() {
        let mut t = trade(14, "-", b'\n');
        t.symbol = "GEM8-GEU8".to_string();
        t.side = b'A';
        t.send_time = 60303042;
        t.receive_time = 60303043;
        t.quantity = 115;
        assert_eq!(t.to_csv(), "GEM8-GEU8,F,A,0,60303042,60303043,-0.14,115\n");
    }

    #[test]
    fn renders_small_negative_with_overflow_digits() {
        assert_eq!(trade(4, "-", b'\n').to_csv(), "6AH8,F,B,0,60306043,60306043,-0.04,10\n");
        assert_eq!(trade(4, "-1", b'\n').to_csv(), "6AH8,F,B,0,60306043,60306043,-0.041,10\n");
    }

    #[test]
    fn strips_trailing_decimal_zeros() {
        assert_eq!(trade(90510, "", b'\n').to_csv(), "6AH8,F,B,0,60306043,60306043,905.1,10\n");
        assert_eq!(trade(135100, "", b'\n').to_csv(), "6AH8,F,B,0,60306043,60306043,1351,10\n");
    }

    #[test]
    fn keeps_overflow_digits_past_two_places() {
        assert_eq!(trade(90510, "1", b'\n').to_csv(), "6AH8,F,B,0,60306043,60306043,905.101,10\n");
        assert_eq!(trade(90500, "1", b'\n').to_csv(), "6AH8,F,B,0,60306043,60306043,905.001,10\n");
        assert_eq!(trade(0, "1", b'\n').to_csv(), "6AH8,F,B,0,60306043,60306043,0.001,10\n");
        assert_eq!(trade(314, "15", b'\n').to_csv(), "6AH8,F,B,0,60306043,60306043,3.1415,10\n");
    }

    #[test]
    fn carriage_return_marker_selects_crlf() {
        assert_eq!(trade(314, "15", b'\r').to_csv(), "6AH8,F,B,0,60306043,60306043,3.1415,10\r\n");
        assert_eq!(trade(135100, "", b'\r').to_csv(), "6AH8,F,B,0,60306043,60306043,1351,10\r\n");
    }
}
