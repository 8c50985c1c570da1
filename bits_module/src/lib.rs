//! Bit-level plumbing for the trade codec.
//!
//! `BitPacker` collects ordered bit sequences into a byte buffer, MSB-first
//! within each byte, so that prefix codes can be written out as a plain byte
//! stream. `BitReader` pulls bits back out of a reader in the same order,
//! refilling its buffer in 1 MiB chunks. `increment_bits` is the "next code"
//! step of canonical Huffman code assignment.

use std::io::{self, Read};

/// How many bytes `BitReader` pulls from its inner reader per refill.
const READ_CHUNK_SIZE: usize = 1_048_576;

/// Packs sequences of bits into bytes, first bit into the most significant
/// position of each byte.
///
/// The buffer always holds every bit appended so far; the final byte may be
/// only partially filled. Callers that stream output take the fully packed
/// bytes out periodically with [`BitPacker::take_packed_bytes`], which leaves
/// the partial byte in place.
#[derive(Debug, Default)]
pub struct BitPacker {
    bytes: Vec<u8>,
    bit_index: usize,
}

impl BitPacker {
    /// Creates an empty packer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single bit. Any non-zero value is treated as 1.
    pub fn write_bit(&mut self, bit: u8) {
        let byte_index = self.bit_index / 8;
        if byte_index == self.bytes.len() {
            self.bytes.push(0);
        }
        if bit != 0 {
            self.bytes[byte_index] |= 1 << (7 - (self.bit_index % 8));
        }
        self.bit_index += 1;
    }

    /// Appends a slice of bits (each element 0 or 1) in order.
    pub fn write_bits(&mut self, bits: &[u8]) {
        for &bit in bits {
            self.write_bit(bit);
        }
    }

    /// Number of bytes that are completely filled.
    pub fn fully_packed_bytes(&self) -> usize {
        self.bit_index / 8
    }

    /// Removes and returns every fully packed byte.
    ///
    /// A partially filled final byte stays behind, rebased so that its bits
    /// occupy the top positions of the first buffered byte.
    pub fn take_packed_bytes(&mut self) -> Vec<u8> {
        let full = self.bit_index / 8;
        self.bit_index %= 8;
        self.bytes.drain(..full).collect()
    }

    /// All buffered bytes, including a partially filled final byte whose
    /// unused low-order bits are zero.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Reads bits back from a byte stream in the order `BitPacker` wrote them.
///
/// The inner reader is consumed in `READ_CHUNK_SIZE` blocks; the cursor is
/// tracked in bits within the current block.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    bit_index: usize,
}

impl<R: Read> BitReader<R> {
    /// Wraps `reader`; nothing is read until the first `read_bit` call.
    pub fn new(reader: R) -> Self {
        BitReader {
            reader,
            buffer: Vec::new(),
            bit_index: 0,
        }
    }

    /// Returns the next bit as 0 or 1, or `None` once the stream is
    /// exhausted.
    pub fn read_bit(&mut self) -> io::Result<Option<u8>> {
        if self.bit_index / 8 >= self.buffer.len() && self.refill()? == 0 {
            return Ok(None);
        }
        let byte_index = self.bit_index / 8;
        let bit = (self.buffer[byte_index] >> (7 - (self.bit_index % 8))) & 1;
        self.bit_index += 1;
        Ok(Some(bit))
    }

    fn refill(&mut self) -> io::Result<usize> {
        self.buffer.resize(READ_CHUNK_SIZE, 0);
        self.bit_index = 0;
        let read = loop {
            match self.reader.read(&mut self.buffer) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        self.buffer.truncate(read);
        Ok(read)
    }
}

/// Adds one to a bit string interpreted as a big-endian binary integer.
///
/// A carry out of the top bit grows the string by prepending a 1. This is
/// the code-increment step of canonical Huffman assignment.
pub fn increment_bits(bits: &mut Vec<u8>) {
    for bit in bits.iter_mut().rev() {
        if *bit == 0 {
            *bit = 1;
            return;
        }
        *bit = 0;
    }
    bits.insert(0, 1);
}
