//! Little-endian field serialization for fixed-layout header blocks.
//!
//! Writing goes through [`WriteBytesLe`], usually derived with
//! `#[derive(ToBytes)]`; reading goes through [`LeReader`], a thin wrapper
//! over a `bitstream-io` byte reader.

use std::io;

use anyhow::{Result, bail};
use bitstream_io::{ByteRead, ByteReader, LittleEndian, Primitive};

use crate::utils::errors::EncodeError;

pub trait WriteBytesLe {
    fn write_le(&self, dst: &mut Vec<u8>);
}

macro_rules! impl_num_le {
    ($($t:ty),+) => { $(
        impl WriteBytesLe for $t { #[inline] fn write_le(&self, dst: &mut Vec<u8>) { dst.extend_from_slice(&self.to_le_bytes()); }}
    )+ }
}

impl_num_le!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl<T: WriteBytesLe> WriteBytesLe for Vec<T> {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_le(dst));
    }
}

impl<T: WriteBytesLe, const N: usize> WriteBytesLe for [T; N] {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_le(dst));
    }
}

/// A block with a fixed on-disk size, declared with `#[fixed_block(size = N)]`.
pub trait FixedBlock: WriteBytesLe {
    const SIZE: usize;

    /// Serializes the block, failing if the fields do not add up to `SIZE`.
    fn to_block(&self) -> Result<Vec<u8>> {
        let mut vec = Vec::with_capacity(Self::SIZE);
        self.write_le(&mut vec);
        if vec.len() != Self::SIZE {
            bail!(EncodeError::BlockSize {
                expected: Self::SIZE,
                actual: vec.len(),
            });
        }
        Ok(vec)
    }
}

/// Sequential little-endian reader over an in-memory block.
pub struct LeReader<'a> {
    inner: ByteReader<io::Cursor<&'a [u8]>, LittleEndian>,
}

impl<'a> LeReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            inner: ByteReader::endian(io::Cursor::new(bytes), LittleEndian),
        }
    }

    #[inline]
    pub fn read<V: Primitive>(&mut self) -> io::Result<V> {
        self.inner.read::<V>()
    }

    #[inline]
    pub fn array<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_bytes(&mut buf)?;
        Ok(buf)
    }

    pub fn vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.inner.read_bytes(&mut buf)?;
        Ok(buf)
    }

    #[inline]
    pub fn skip(&mut self, bytes: u32) -> io::Result<()> {
        self.inner.skip(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dzt_macros::{ToBytes, fixed_block};

    #[derive(ToBytes)]
    struct Mini {
        a: u16,
        b: u32,
        guid: [u8; 4],
    }

    #[derive(ToBytes)]
    #[fixed_block(size = 8)]
    struct Sized8 {
        a: i16,
        b: f32,
        pad: [u8; 2],
    }

    #[derive(ToBytes)]
    #[fixed_block(size = 8)]
    struct Short {
        a: i16,
    }

    #[test]
    fn to_bytes_little_endian() {
        let s = Mini {
            a: 0x1234,
            b: 0xABCDEF01,
            guid: *b"TEST",
        };

        let mut vec = Vec::new();
        s.write_le(&mut vec);

        let expected = [0x34, 0x12, 0x01, 0xEF, 0xCD, 0xAB, b'T', b'E', b'S', b'T'];
        assert_eq!(&vec[..], &expected);
    }

    #[test]
    fn fixed_block_checks_size() {
        let ok = Sized8 {
            a: -2,
            b: 1.5,
            pad: [0; 2],
        };
        let bytes = ok.to_block().unwrap();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..2], &(-2i16).to_le_bytes());

        let err = Short { a: 1 }.to_block().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EncodeError>(),
            Some(EncodeError::BlockSize {
                expected: 8,
                actual: 2
            })
        ));
    }

    #[test]
    fn write_and_read_back() -> io::Result<()> {
        let mut bytes = Vec::new();
        7i16.write_le(&mut bytes);
        2.5f32.write_le(&mut bytes);
        0xA5u8.write_le(&mut bytes);
        [1u8, 2, 3].write_le(&mut bytes);
        let mut reader = LeReader::new(&bytes);
        assert_eq!(reader.read::<i16>()?, 7);
        assert_eq!(reader.read::<f32>()?, 2.5);
        reader.skip(1)?;
        assert_eq!(reader.array::<3>()?, [1, 2, 3]);
        assert!(reader.read::<u8>().is_err());
        Ok(())
    }
}
