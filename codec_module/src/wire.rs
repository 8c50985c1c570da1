//! Header serialization of table symbols.
//!
//! Each of the nine tables stores its symbols in the field's own encoding:
//! strings as raw bytes with a NUL terminator, the exchange/newline pair as
//! its two bytes, and fixed-width integers as little-endian two's-complement
//! of their declared width. `WireSymbol` is the seam that lets one table
//! reader/writer handle all of them.

use std::hash::Hash;
use std::io::{self, Read};

use crate::error::CodecError;

/// A symbol type that can appear in a header table.
pub trait WireSymbol: Clone + Eq + Ord + Hash {
    /// Appends this symbol's header bytes to `out`.
    fn write_symbol(&self, out: &mut Vec<u8>);

    /// Reads one symbol back from the header stream.
    fn read_symbol<R: Read>(reader: &mut R) -> Result<Self, CodecError>;
}

impl WireSymbol for String {
    fn write_symbol(&self, out: &mut Vec<u8>) {
        debug_assert!(!self.as_bytes().contains(&0), "table strings must not contain NUL");
        out.extend_from_slice(self.as_bytes());
        out.push(0);
    }

    fn read_symbol<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let mut bytes = Vec::new();
        loop {
            let [byte] = read_array(reader)?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        String::from_utf8(bytes)
            .map_err(|_| CodecError::CorruptStream("table string is not valid utf-8"))
    }
}

impl WireSymbol for (u8, u8) {
    fn write_symbol(&self, out: &mut Vec<u8>) {
        out.push(self.0);
        out.push(self.1);
    }

    fn read_symbol<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let [first, second] = read_array(reader)?;
        Ok((first, second))
    }
}

impl WireSymbol for u8 {
    fn write_symbol(&self, out: &mut Vec<u8>) {
        out.push(*self);
    }

    fn read_symbol<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        let [byte] = read_array(reader)?;
        Ok(byte)
    }
}

impl WireSymbol for i32 {
    fn write_symbol(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_symbol<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        Ok(i32::from_le_bytes(read_array(reader)?))
    }
}

impl WireSymbol for i64 {
    fn write_symbol(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_symbol<R: Read>(reader: &mut R) -> Result<Self, CodecError> {
        Ok(i64::from_le_bytes(read_array(reader)?))
    }
}

pub fn read_u32<R: Read>(reader: &mut R) -> Result<u32, CodecError> {
    Ok(u32::from_le_bytes(read_array(reader)?))
}

pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64, CodecError> {
    Ok(u64::from_le_bytes(read_array(reader)?))
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N], CodecError> {
    let mut bytes = [0u8; N];
    reader.read_exact(&mut bytes).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::CorruptStream("header ended before all tables were read")
        } else {
            CodecError::InputRead(e)
        }
    })?;
    Ok(bytes)
}
