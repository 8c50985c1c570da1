//! Error kinds surfaced by the codec. Nothing is retried; partial output is
//! not useful and callers should discard it on failure.

use std::error::Error;
use std::fmt;
use std::io;

use trade_module::SourceError;

#[derive(Debug)]
pub enum CodecError {
    /// The source file could not be opened or read.
    InputRead(io::Error),
    /// The destination could not be created or written.
    OutputWrite(io::Error),
    /// A CSV line did not yield a valid trade.
    MalformedCsv(String),
    /// The compressed stream does not decode: a table or payload runs past
    /// the end of the file, or a bit prefix matches no code.
    CorruptStream(&'static str),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InputRead(e) => write!(f, "failed to read the input file: {}", e),
            CodecError::OutputWrite(e) => write!(f, "failed to write the output file: {}", e),
            CodecError::MalformedCsv(reason) => write!(f, "malformed csv input: {}", reason),
            CodecError::CorruptStream(reason) => {
                write!(f, "corrupt compressed stream: {}", reason)
            }
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CodecError::InputRead(e) | CodecError::OutputWrite(e) => Some(e),
            CodecError::MalformedCsv(_) | CodecError::CorruptStream(_) => None,
        }
    }
}

impl From<SourceError> for CodecError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::Io(e) => CodecError::InputRead(e),
            malformed @ SourceError::Malformed { .. } => {
                CodecError::MalformedCsv(malformed.to_string())
            }
        }
    }
}
