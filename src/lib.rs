//! Woven-mosaic thread grids.
//!
//! A raster image is reduced to a coarse grid of boolean thread crossings by
//! [`reduce::reduce`], stored in a bit-packed file by [`encoder::encode`] and
//! read back by [`decoder::decode`].
use std::convert::Infallible;
use std::fmt;

/// Error types
pub mod error;

/// Grid data model
pub mod grid;

/// Block reduction of pixel arrays
pub mod reduce;

/// Encoder module
pub mod encoder;

/// Decoder module
pub mod decoder;

/// Line oriented `0`/`1` text format
pub mod text;

/// Rasterizing grids
pub mod render;

/// File helpers
pub mod io;

pub use error::{FileError, MosaicError, Result};
pub use grid::{Channel, Mode, MosaicGrid};
pub use reduce::{PixelArray, ReduceConfig};

/// Trait used to read data bitwise.
///
/// For lazy people `ByteReader` is provided which implements this trait.
pub trait BitReader {
    /// look at the next (up to 16) bits of data
    ///
    /// Data is returned in the lower bits of the `u16`.
    fn peek(&self, bits: u8) -> Option<u16>;

    /// Consume the given amount of bits from the input.
    ///
    /// Must only be called after a successful `peek` of at least `bits`.
    fn consume(&mut self, bits: u8);

    /// Assert that the next bits matches the given pattern.
    ///
    /// If it does not match, the found pattern is returned if enough bits are aviable.
    /// Otherwise None is returned.
    fn expect(&mut self, bits: Bits) -> Result<(), Option<Bits>> {
        match self.peek(bits.len) {
            None => Err(None),
            Some(val) if val == bits.data => Ok(()),
            Some(val) => Err(Some(Bits { data: val, len: bits.len })),
        }
    }

    /// Peek and consume up to 16 bits.
    fn read(&mut self, bits: u8) -> Option<u16> {
        let val = self.peek(bits)?;
        self.consume(bits);
        Some(val)
    }

    /// Read a 32 bit big endian word.
    fn read_u32(&mut self) -> Option<u32> {
        let hi = self.read(16)? as u32;
        let lo = self.read(16)? as u32;
        Some(hi << 16 | lo)
    }
}

/// Trait to write data bitwise
///
/// The `VecWriter` struct is provided for convinience.
pub trait BitWriter {
    type Error;

    fn write(&mut self, bits: Bits) -> Result<(), Self::Error>;

    /// Write a 32 bit word, most significant half first.
    fn write_u32(&mut self, word: u32) -> Result<(), Self::Error> {
        self.write(Bits { data: (word >> 16) as u16, len: 16 })?;
        self.write(Bits { data: word as u16, len: 16 })
    }
}

pub struct VecWriter {
    data: Vec<u8>,
    partial: u32,
    len: u8,
}
impl BitWriter for VecWriter {
    type Error = Infallible;

    fn write(&mut self, bits: Bits) -> Result<(), Self::Error> {
        debug_assert!(bits.len <= 16);
        if bits.len == 0 {
            return Ok(());
        }
        let data = bits.data as u32 & ((1 << bits.len) - 1);
        self.partial |= data << (32 - self.len - bits.len);
        self.len += bits.len;
        while self.len >= 8 {
            self.data.push((self.partial >> 24) as u8);
            self.partial <<= 8;
            self.len -= 8;
        }
        Ok(())
    }
}
impl Default for VecWriter {
    fn default() -> Self {
        Self::new()
    }
}
impl VecWriter {
    pub fn new() -> Self {
        VecWriter {
            data: Vec::new(),
            partial: 0,
            len: 0,
        }
    }
    // with capacity of `n` bits.
    pub fn with_capacity(n: usize) -> Self {
        VecWriter {
            data: Vec::with_capacity(n.div_ceil(8)),
            partial: 0,
            len: 0,
        }
    }

    /// Pad the output with `0` bits until it is at a byte boundary.
    pub fn pad(&mut self) {
        if self.len > 0 {
            self.data.push((self.partial >> 24) as u8);
            self.partial = 0;
            self.len = 0;
        }
    }

    /// pad and return the accumulated bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.pad();
        self.data
    }
}

pub struct ByteReader<R> {
    read: R,
    partial: u32,
    valid: u8,
}
impl<R: Iterator<Item = u8>> ByteReader<R> {
    /// Construct a new `ByteReader` from an iterator of `u8`
    pub fn new(read: R) -> Self {
        let mut bits = ByteReader {
            read,
            partial: 0,
            valid: 0,
        };
        bits.fill();
        bits
    }
    fn fill(&mut self) {
        while self.valid < 16 {
            if let Some(byte) = self.read.next() {
                self.partial = self.partial << 8 | byte as u32;
                self.valid += 8;
            } else {
                break;
            }
        }
    }
}
impl<'a> ByteReader<std::iter::Copied<std::slice::Iter<'a, u8>>> {
    /// Construct a new `ByteReader` from a slice of bytes.
    pub fn from_slice(slice: &'a [u8]) -> Self {
        ByteReader::new(slice.iter().copied())
    }
}
impl<'a, R: Iterator<Item = u8> + 'a> ByteReader<R> {
    /// Turn the reader into an iterator of bits.
    ///
    /// Yields one `bool` per bit, `1=true` and `0=false`.
    pub fn into_bits(mut self) -> impl Iterator<Item = bool> + 'a {
        std::iter::from_fn(move || {
            let bit = self.peek(1)? == 1;
            self.consume(1);
            Some(bit)
        })
    }
}
impl<R: Iterator<Item = u8>> BitReader for ByteReader<R> {
    fn peek(&self, bits: u8) -> Option<u16> {
        assert!(bits <= 16);
        if self.valid >= bits {
            let shift = self.valid - bits;
            let out = (self.partial >> shift) as u16 & ((1u32 << bits) - 1) as u16;
            Some(out)
        } else {
            None
        }
    }
    fn consume(&mut self, bits: u8) {
        self.valid -= bits;
        self.partial &= (1u32 << self.valid) - 1;
        self.fill();
    }
}

/// Start and end marker around the header fields.
pub const MARKER: u32 = 0xDEAD_BEEF;

/// marker + threads + crosses + mode flag + marker
pub const HEADER_BITS: u64 = 32 + 32 + 32 + 1 + 32;

/// Fixed header of a mosaic file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub threads: i32,
    pub crosses: i32,
    pub mode: Mode,
}

impl Header {
    pub fn of(grid: &MosaicGrid) -> Header {
        Header {
            threads: grid.width() as i32,
            crosses: grid.height() as i32,
            mode: grid.mode(),
        }
    }

    /// Payload bits following the header, or `None` for non-positive dimensions.
    pub fn payload_bits(&self) -> Option<u64> {
        if self.threads < 1 || self.crosses < 1 {
            return None;
        }
        Some(self.threads as u64 * self.crosses as u64 * self.mode.planes() as u64)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bits {
    pub data: u16,
    pub len: u8,
}

impl Bits {
    /// A single bit.
    pub const fn bit(set: bool) -> Bits {
        Bits { data: set as u16, len: 1 }
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "d={:0b} w={}", self.data, self.len)
    }
}

#[test]
fn test_bits() {
    let mut bits = ByteReader::new([0b0000_1101, 0b1010_0000, 0xff].iter().cloned());
    assert_eq!(bits.read(4), Some(0));
    assert_eq!(bits.read(7), Some(0b1101101));
    assert_eq!(bits.read(13), Some(0b0_0000_1111_1111));
    assert_eq!(bits.peek(1), None);
}

#[test]
fn test_writer_unaligned_words() {
    let mut writer = VecWriter::new();
    writer.write(Bits::bit(true)).unwrap();
    writer.write_u32(0xDEADBEEF).unwrap();
    let data = writer.finish();
    assert_eq!(data, [0xEF, 0x56, 0xDF, 0x77, 0x80]);

    let mut reader = ByteReader::from_slice(&data);
    assert_eq!(reader.read(1), Some(1));
    assert_eq!(reader.read_u32(), Some(0xDEADBEEF));
    assert_eq!(reader.into_bits().collect::<Vec<_>>(), vec![false; 7]);
}
