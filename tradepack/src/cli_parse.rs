use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// The command line argument structure for the trade compressor.
///
/// Compression is the default; `--decompress` selects the inverse
/// direction.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Trade Stream Compression Utility.",
    long_about = "A domain-specific lossless compressor for csv captures of financial trade \
                  records. Each field is reduced to a residual against an online predictor and \
                  coded with a per-field canonical Huffman table; decompression reproduces the \
                  original bytes exactly.",
    after_help = "
    EXAMPLES:
    # 1. Compress a capture
    tradepack trades.csv trades.tpk

    # 2. Restore the original csv
    tradepack --decompress trades.tpk restored.csv

    # 3. Compress with detailed statistics
    tradepack trades.csv trades.tpk -s
"
)]
pub struct CliArgs {
    /// The path to the input file.
    pub input_file: PathBuf,
    /// The path where the output file will be written.
    pub output_file: PathBuf,
    /// Decompresses the input file; compresses when not specified.
    #[arg(short, long)]
    pub decompress: bool,
    /// Enables statistics output, such as section timings and throughput.
    #[arg(short, long)]
    pub stats: bool,
}

impl CliArgs {
    /// Validates the command line arguments after parsing, specifically ensuring:
    /// 1. The input file exists and is a file.
    /// 2. The parent directory for the output file exists and is a directory.
    pub fn validate(&self) -> Result<(), CliError> {
        let in_path = &self.input_file;
        let out_path = &self.output_file;

        if !in_path.exists() {
            return Err(CliError::InputFileNotFound(in_path.clone()));
        }
        if !in_path.is_file() {
            return Err(CliError::InputNotFile(in_path.clone()));
        }

        if let Some(parent) = out_path.parent() {
            // A bare file name has an empty parent, which is the working
            // directory and always exists.
            if !parent.as_os_str().is_empty() {
                if !parent.exists() {
                    return Err(CliError::OutputParentDirNotFound(parent.to_path_buf()));
                }
                if !parent.is_dir() {
                    return Err(CliError::OutputParentNotDir(parent.to_path_buf()));
                }
            }
        }

        Ok(())
    }
}

/// Possible errors encountered during command line argument processing and
/// file validation.
#[derive(Debug)]
pub enum CliError {
    /// The specified input file could not be found.
    InputFileNotFound(PathBuf),
    /// The specified input path exists, but is not a file.
    InputNotFile(PathBuf),
    /// The parent directory for the output file does not exist.
    OutputParentDirNotFound(PathBuf),
    /// The parent path for the output file exists, but is not a directory.
    OutputParentNotDir(PathBuf),
    /// An error originating directly from the argument parsing library (clap).
    ClapError(clap::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InputFileNotFound(path) => {
                write!(f, "input file does not exist: {}", path.display())
            }
            CliError::InputNotFile(path) => {
                write!(f, "input path is not a file: {}", path.display())
            }
            CliError::OutputParentDirNotFound(path) => {
                write!(f, "the output directory does not exist: {}", path.display())
            }
            CliError::OutputParentNotDir(path) => {
                write!(
                    f,
                    "the parent path of the output file is not a directory: {}",
                    path.display()
                )
            }
            CliError::ClapError(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for CliError {}

/// Allows for seamless conversion of a `clap::Error` directly into a `CliError`.
impl From<clap::Error> for CliError {
    fn from(error: clap::Error) -> Self {
        CliError::ClapError(error)
    }
}

/// Parses the command line arguments and validates them.
pub fn parse_args() -> Result<CliArgs, CliError> {
    let args = CliArgs::try_parse()?;
    args.validate()?;
    Ok(args)
}
