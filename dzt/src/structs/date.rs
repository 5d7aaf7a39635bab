//! Packed DZT date/time (`rfDateByte`).
//!
//! Four bytes holding a little-endian 32-bit word made of six unsigned bit
//! fields, from least to most significant:
//!
//! | bits | field |
//! |---|---|
//! | 5 | seconds / 2 (0-29) |
//! | 6 | minute (0-59) |
//! | 5 | hour (0-23) |
//! | 5 | day of month (1-31) |
//! | 4 | month (1-12) |
//! | 7 | year - 1980 (0-127) |
//!
//! Seconds are stored at two-second resolution, so encoding truncates odd
//! seconds and decoding always yields an even value.

use std::fmt::{Display, Formatter};
use std::io;

use anyhow::{Result, bail};
use bitstream_io::{BitRead, BitReader, BitWrite, BitWriter, LittleEndian};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::utils::bytes::WriteBytesLe;
use crate::utils::errors::DateError;

pub const YEAR_BASE: i32 = 1980;
pub const YEAR_MAX: i32 = YEAR_BASE + 127;

/// Raw bit fields of a packed date, kept as stored so that values which are
/// not valid calendar dates still round-trip unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PackedDate {
    pub sec2: u8,
    pub minute: u8,
    pub hour: u8,
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

impl PackedDate {
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::read_fields(&bytes).unwrap_or_default()
    }

    fn read_fields(bytes: &[u8; 4]) -> io::Result<Self> {
        let mut reader = BitReader::endian(&bytes[..], LittleEndian);
        Ok(Self {
            sec2: reader.read_unsigned_var(5)?,
            minute: reader.read_unsigned_var(6)?,
            hour: reader.read_unsigned_var(5)?,
            day: reader.read_unsigned_var(5)?,
            month: reader.read_unsigned_var(4)?,
            year: reader.read_unsigned_var(7)?,
        })
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let mut bytes = [0u8; 4];
        // Fields are masked to their widths, so the 32 bits always fit.
        let _ = self.write_fields(&mut bytes);
        bytes
    }

    fn write_fields(&self, bytes: &mut [u8; 4]) -> io::Result<()> {
        let mut writer = BitWriter::endian(&mut bytes[..], LittleEndian);
        writer.write_unsigned_var(5, self.sec2 & 0x1F)?;
        writer.write_unsigned_var(6, self.minute & 0x3F)?;
        writer.write_unsigned_var(5, self.hour & 0x1F)?;
        writer.write_unsigned_var(5, self.day & 0x1F)?;
        writer.write_unsigned_var(4, self.month & 0x0F)?;
        writer.write_unsigned_var(7, self.year & 0x7F)?;
        Ok(())
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_le_bytes(self.to_bytes())
    }

    pub fn from_datetime(dt: &NaiveDateTime) -> Result<Self> {
        let year = dt.year();
        if !(YEAR_BASE..=YEAR_MAX).contains(&year) {
            bail!(DateError::YearOutOfRange(year));
        }

        Ok(Self {
            sec2: (dt.second() / 2) as u8,
            minute: dt.minute() as u8,
            hour: dt.hour() as u8,
            day: dt.day() as u8,
            month: dt.month() as u8,
            year: (year - YEAR_BASE) as u8,
        })
    }

    pub fn to_datetime(&self) -> Result<NaiveDateTime> {
        let datetime = NaiveDate::from_ymd_opt(
            YEAR_BASE + self.year as i32,
            self.month as u32,
            self.day as u32,
        )
        .and_then(|date| {
            date.and_hms_opt(
                self.hour as u32,
                self.minute as u32,
                self.sec2 as u32 * 2,
            )
        });

        match datetime {
            Some(dt) => Ok(dt),
            None => bail!(DateError::InvalidDate(self.to_u32())),
        }
    }
}

impl WriteBytesLe for PackedDate {
    fn write_le(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.to_bytes());
    }
}

impl Display for PackedDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Ok(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Err(_) => write!(f, "invalid({:#010X})", self.to_u32()),
        }
    }
}

/// Packs a timestamp into the 4-byte DZT representation.
pub fn encode(dt: &NaiveDateTime) -> Result<[u8; 4]> {
    Ok(PackedDate::from_datetime(dt)?.to_bytes())
}

/// Unpacks a 4-byte DZT date into a timestamp with even seconds.
pub fn decode(bytes: [u8; 4]) -> Result<NaiveDateTime> {
    PackedDate::from_bytes(bytes).to_datetime()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn known_bit_layout() -> Result<()> {
        // 2017-05-19 14:23:46
        let bytes = encode(&dt(2017, 5, 19, 14, 23, 46))?;
        let word = u32::from_le_bytes(bytes);
        let expected = 23 | (23 << 5) | (14 << 11) | (19 << 16) | (5 << 21) | (37 << 25);
        assert_eq!(word, expected);
        assert_eq!(bytes[3] >> 1, 37);
        Ok(())
    }

    #[test]
    fn round_trip_even_seconds() -> Result<()> {
        for t in [
            dt(1980, 1, 1, 0, 0, 0),
            dt(2000, 2, 29, 23, 59, 58),
            dt(2023, 12, 31, 12, 30, 2),
            dt(2107, 12, 31, 23, 59, 58),
        ] {
            assert_eq!(decode(encode(&t)?)?, t);
        }
        Ok(())
    }

    #[test]
    fn odd_seconds_truncate() -> Result<()> {
        let t = dt(2019, 7, 4, 9, 15, 59);
        let packed = PackedDate::from_datetime(&t)?;
        assert_eq!(packed.sec2, 29);
        assert_eq!(decode(packed.to_bytes())?, dt(2019, 7, 4, 9, 15, 58));
        Ok(())
    }

    #[test]
    fn sec_field_never_exceeds_29() -> Result<()> {
        for s in 0..60 {
            let bytes = encode(&dt(2021, 3, 3, 3, 3, s))?;
            assert_eq!(bytes.len(), 4);
            assert!(PackedDate::from_bytes(bytes).sec2 <= 29);
        }
        Ok(())
    }

    #[test]
    fn year_out_of_range() {
        let err = encode(&dt(1979, 12, 31, 0, 0, 0)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DateError>(),
            Some(&DateError::YearOutOfRange(1979))
        );
        assert!(encode(&dt(2108, 1, 1, 0, 0, 0)).is_err());
    }

    #[test]
    fn zero_date_passes_through_raw() {
        let packed = PackedDate::from_bytes([0; 4]);
        assert_eq!(packed.to_bytes(), [0; 4]);
        assert!(packed.to_datetime().is_err());
        assert_eq!(format!("{packed}"), "invalid(0x00000000)");
    }
}
