//! End-to-end checks: a capture compressed and decompressed must come back
//! byte-identical, including newline styles and price text.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use codec_module::{CodecError, Decoder, Encoder};
use trade_module::Trade;

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("tradepack-test-{}-{}", std::process::id(), name));
    path
}

/// Compresses `input` from a file and decodes it straight back to bytes.
fn round_trip(name: &str, input: &[u8]) -> Vec<u8> {
    let input_path = temp_path(&format!("{}.csv", name));
    let compressed_path = temp_path(&format!("{}.bin", name));
    fs::write(&input_path, input).unwrap();

    let mut encoder = Encoder::new(&input_path, &compressed_path).unwrap();
    encoder.encode_header().unwrap();
    encoder.encode_trades().unwrap();
    drop(encoder);

    let mut restored = Vec::new();
    if fs::metadata(&compressed_path).unwrap().len() > 0 {
        let decoder = Decoder::new(File::open(&compressed_path).unwrap(), &mut restored);
        decoder.decode().unwrap();
    }

    let _ = fs::remove_file(&input_path);
    let _ = fs::remove_file(&compressed_path);
    restored
}

#[test]
fn round_trips_fixed_capture() {
    let input = "GEM8-GEU8,F,A,0,60303042,60303043,-0.14,115\n\
                 GEM8-GEU8,F,B,0,60303050,60303052,-0.14,20\r\n\
                 6AH8,F,B,0,60306043,60306043,905.1,10\n\
                 6AH8,F,T,1,60306100,60306105,905.101,12\n\
                 GE:BF Z8-H9-M9,G,A,0,60307000,60307003,-1.01,115\r\n\
                 6AH8,F,B,0,60315666,60315666,3.1415,20\r\n\
                 6AH8,F,B,0,60315700,60315704,0.001,7\n";
    assert_eq!(round_trip("fixed", input.as_bytes()), input.as_bytes());
}

#[test]
fn round_trips_single_trade_as_header_only_file() {
    let input = "GEM8-GEU8,F,A,0,60303042,60303043,-0.14,115\n";
    let input_path = temp_path("single.csv");
    let compressed_path = temp_path("single.bin");
    fs::write(&input_path, input).unwrap();

    let mut encoder = Encoder::new(&input_path, &compressed_path).unwrap();
    let header_size = encoder.encode_header().unwrap();
    encoder.encode_trades().unwrap();
    assert_eq!(encoder.num_trades(), 1);
    drop(encoder);

    // Every table has one entry, every code is zero bits: the file is
    // nothing but the header.
    assert_eq!(fs::metadata(&compressed_path).unwrap().len(), header_size as u64);

    let mut restored = Vec::new();
    Decoder::new(File::open(&compressed_path).unwrap(), &mut restored).decode().unwrap();
    assert_eq!(restored, input.as_bytes());

    let _ = fs::remove_file(&input_path);
    let _ = fs::remove_file(&compressed_path);
}

#[test]
fn round_trips_randomized_capture() {
    let mut rng = StdRng::seed_from_u64(0x7261646531);
    let symbols = ["GEM8-GEU8", "6AH8", "ESZ9", "GE:BF Z8-H9-M9", "ZNH0"];
    let overflows = ["", "", "", "-", "1", "15", "-15", "009"];
    let sides = [b'A', b'B', b'b', b'a', b'T'];

    let mut send_time = 60_000_000i64;
    let mut input = String::new();
    for _ in 0..500 {
        send_time += rng.random_range(0..2_000);
        let trade = Trade {
            symbol: symbols[rng.random_range(0..symbols.len())].to_string(),
            exchange_newline: (
                if rng.random::<bool>() { b'F' } else { b'G' },
                if rng.random::<bool>() { b'\n' } else { b'\r' },
            ),
            side: sides[rng.random_range(0..sides.len())],
            condition: b'0' + rng.random_range(0..3u8),
            send_time,
            receive_time: send_time + rng.random_range(0..50),
            price: rng.random_range(0..200_000),
            overflow_price_digits: overflows[rng.random_range(0..overflows.len())].to_string(),
            quantity: rng.random_range(1..1_000),
        };
        input.push_str(&trade.to_csv());
    }

    assert_eq!(round_trip("random", input.as_bytes()), input.as_bytes());
}

#[test]
fn zero_trade_source_writes_nothing() {
    assert_eq!(round_trip("empty", b""), b"");
    assert_eq!(round_trip("blank-lines", b"\n\r\n\n"), b"");
}

#[test]
fn bytes_past_the_declared_trades_are_ignored() {
    let input = "6AH8,F,B,0,60306043,60306043,905.1,10\n\
                 6AH8,F,B,0,60306050,60306055,905.2,11\n";
    let input_path = temp_path("trailing.csv");
    let compressed_path = temp_path("trailing.bin");
    fs::write(&input_path, input).unwrap();

    let mut encoder = Encoder::new(&input_path, &compressed_path).unwrap();
    encoder.encode_header().unwrap();
    encoder.encode_trades().unwrap();
    drop(encoder);

    let mut file = fs::OpenOptions::new().append(true).open(&compressed_path).unwrap();
    file.write_all(b"trailing junk").unwrap();
    drop(file);

    let mut restored = Vec::new();
    Decoder::new(File::open(&compressed_path).unwrap(), &mut restored).decode().unwrap();
    assert_eq!(restored, input.as_bytes());

    let _ = fs::remove_file(&input_path);
    let _ = fs::remove_file(&compressed_path);
}

#[test]
fn malformed_lines_are_fatal() {
    let input_path = temp_path("malformed.csv");
    let compressed_path = temp_path("malformed.bin");
    fs::write(&input_path, b"not,a,trade\n").unwrap();

    let mut encoder = Encoder::new(&input_path, &compressed_path).unwrap();
    assert!(matches!(encoder.encode_header(), Err(CodecError::MalformedCsv(_))));

    let _ = fs::remove_file(&input_path);
    let _ = fs::remove_file(&compressed_path);
}

#[test]
fn truncated_payload_is_corrupt() {
    let input = "6AH8,F,B,0,60306043,60306043,905.1,10\n\
                 GEM8,F,A,1,60306050,60306055,1.25,11\n\
                 6AH8,G,B,0,60306060,60306070,905.3,12\n";
    let input_path = temp_path("truncated.csv");
    let compressed_path = temp_path("truncated.bin");
    fs::write(&input_path, input).unwrap();

    let mut encoder = Encoder::new(&input_path, &compressed_path).unwrap();
    encoder.encode_header().unwrap();
    encoder.encode_trades().unwrap();
    drop(encoder);

    // Drop the payload (and the tail of the header) entirely.
    let compressed = fs::read(&compressed_path).unwrap();
    let truncated = &compressed[..compressed.len() / 2];

    let decoder = Decoder::new(truncated, Vec::new());
    assert!(matches!(decoder.decode(), Err(CodecError::CorruptStream(_))));

    let _ = fs::remove_file(&input_path);
    let _ = fs::remove_file(&compressed_path);
}
