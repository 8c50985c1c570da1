//! tradepack: compresses csv trade captures and restores them exactly.

use std::error::Error;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::process::ExitCode;

use codec_module::{CodecError, Decoder, Encoder};
use shared_files::stats::{CompressionStatsBuilder, OptionalStatsTimer};

mod cli_parse;

use cli_parse::CliArgs;

fn main() -> ExitCode {
    let args = match cli_parse::parse_args() {
        Ok(args) => args,
        Err(cli_parse::CliError::ClapError(error)) => error.exit(),
        Err(error) => {
            eprintln!("Error: {}", error);
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<(), Box<dyn Error>> {
    let input_size = fs::metadata(&args.input_file).map_err(CodecError::InputRead)?.len();
    if input_size == 0 {
        // An empty input maps to an empty output in both directions; no
        // header is ever written or expected.
        File::create(&args.output_file).map_err(CodecError::OutputWrite)?;
        return Ok(());
    }

    if args.decompress { decompress(args, input_size) } else { compress(args, input_size) }
}

fn compress(args: &CliArgs, input_size: u64) -> Result<(), Box<dyn Error>> {
    let mut timer = OptionalStatsTimer::new(args.stats);

    let mut encoder = Encoder::new(&args.input_file, &args.output_file)?;

    let section = timer.start_section("Header Pass");
    let header_size = encoder.encode_header()?;
    timer.add_section(section);

    let section = timer.start_section("Trade Pass");
    encoder.encode_trades()?;
    timer.add_section(section);

    let num_trades = encoder.num_trades();
    let header_sizes = encoder.header_sizes();
    drop(encoder);

    let output_size = fs::metadata(&args.output_file).map_err(CodecError::OutputWrite)?.len();

    println!("Compressed {} trades", num_trades);
    println!("Input Size (bytes): {}", input_size);
    println!("Output Size (bytes): {}", output_size);
    let compression = 100.0 - 100.0 * (output_size as f64 / input_size as f64);
    println!("Compression: {:.2}%", compression);

    if args.stats {
        println!("\tAll Header Data: {}", header_size);
        println!("\t\tSymbol Header: {}", header_sizes.symbol);
        println!("\t\tExchange/Newline Header: {}", header_sizes.exchange_newline);
        println!("\t\tSide Header: {}", header_sizes.side);
        println!("\t\tCondition Header: {}", header_sizes.condition);
        println!("\t\tSend Time Header: {}", header_sizes.send_time);
        println!("\t\tReceive Time Header: {}", header_sizes.receive_time_diff);
        println!("\t\tPrice Header: {}", header_sizes.price);
        println!("\t\tPrice Overflow Header: {}", header_sizes.price_overflow);
        println!("\t\tQuantity Header: {}", header_sizes.quantity);
        println!("\tPayload Data: {}", output_size as usize - header_size);

        let (duration, sections) = timer.end();
        let stats = CompressionStatsBuilder::new()
            .original_len(input_size as usize)
            .processed_len(output_size as usize)
            .header_len(header_size)
            .duration(duration)
            .is_compression(true)
            .sections(sections)
            .build()?;
        println!("{}", stats);
    }

    Ok(())
}

fn decompress(args: &CliArgs, input_size: u64) -> Result<(), Box<dyn Error>> {
    let mut timer = OptionalStatsTimer::new(args.stats);

    let in_file = File::open(&args.input_file).map_err(CodecError::InputRead)?;
    let out_file = File::create(&args.output_file).map_err(CodecError::OutputWrite)?;
    let decoder = Decoder::new(BufReader::new(in_file), BufWriter::new(out_file));

    let section = timer.start_section("Decode");
    let num_trades = decoder.decode()?;
    timer.add_section(section);

    println!("Decoded {} trades", num_trades);

    if args.stats {
        let output_size = fs::metadata(&args.output_file).map_err(CodecError::OutputWrite)?.len();
        let (duration, sections) = timer.end();
        let stats = CompressionStatsBuilder::new()
            .original_len(input_size as usize)
            .processed_len(output_size as usize)
            .duration(duration)
            .is_compression(false)
            .sections(sections)
            .build()?;
        println!("{}", stats);
    }

    Ok(())
}
