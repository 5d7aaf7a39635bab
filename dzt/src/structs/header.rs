//! Per-channel DZT header.
//!
//! Every channel owns one 1024-byte header block. The first 96 bytes are
//! typed fields; the remainder is carried through verbatim because its
//! internal structure varies between field units and other tools depend on
//! it being preserved.
//!
//! ```text
//!   0  tag, data, nsamp, bits, zero           5 x i16
//!  10  sps, spm, mpm, position, range         5 x f32
//!  30  npass                                  i16
//!  32  created, modified                      2 x packed date
//!  40  rgain, nrgain, text, ntext,
//!      proc, nproc, nchan                     7 x i16
//!  54  epsr, top, depth, xstart, xend, servo  6 x f32
//!  78  reserved                               3 bytes
//!  81  accomp                                 u8
//!  82  sconfig, spp, linenum                  3 x i16
//!  88  ystart, yend                           2 x f32
//!  96  opaque tail (antenna, name, info area, GPS references)
//! ```

use anyhow::{Result, ensure};
use dzt_macros::{ToBytes, fixed_block};
use log::trace;

use crate::structs::date::PackedDate;
use crate::utils::bytes::{FixedBlock, LeReader};

/// Size of one channel header block.
pub const HEADER_SIZE: usize = 1024;
/// Size of the fixed information area (`rh_tag` .. `rh_chksum`).
pub const FIXED_AREA_SIZE: usize = 128;
pub const GPS_BLOCK_SIZE: usize = 9;
pub const INFO_AREA_SIZE: usize = HEADER_SIZE - FIXED_AREA_SIZE - 2 * GPS_BLOCK_SIZE;
pub const ANTENNA_SIZE: usize = 14;
pub const NAME_SIZE: usize = 12;
/// Bit depth the encoder always writes.
pub const OUTPUT_BITS: i16 = 32;

/// One channel's survey metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHeader {
    pub tag: i16,
    /// `rh_data`: data-type code; values below 1024 also give the offset to
    /// the sample payload in units of 1024 bytes.
    pub data: i16,
    pub samples: i16,
    pub bits: i16,
    pub zero: i16,
    pub sps: f32,
    pub spm: f32,
    pub mpm: f32,
    pub position: f32,
    /// Two-way travel time covered by one trace, in nanoseconds.
    pub range: f32,
    pub npass: i16,
    pub created: PackedDate,
    pub modified: PackedDate,
    pub rgain: i16,
    pub nrgain: i16,
    pub text: i16,
    pub ntext: i16,
    pub processing: i16,
    pub nproc: i16,
    pub nchan: i16,
    pub epsr: f32,
    pub top: f32,
    pub depth: f32,
    pub x_start: f32,
    pub x_end: f32,
    pub servo_level: f32,
    pub accessory: u8,
    pub sconfig: i16,
    pub spp: i16,
    pub line_number: i16,
    pub y_start: f32,
    pub y_end: f32,
    pub opaque: OpaqueBlocks,
}

/// Header regions preserved byte-for-byte between decode and encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueBlocks {
    pub reserved_96: u8,
    pub dtype: u8,
    pub antenna: [u8; ANTENNA_SIZE],
    pub reserved_112: u8,
    pub version: u8,
    pub name: [u8; NAME_SIZE],
    pub checksum: [u8; 2],
    pub info_area: Vec<u8>,
    pub gps: [[u8; GPS_BLOCK_SIZE]; 2],
}

impl Default for OpaqueBlocks {
    fn default() -> Self {
        Self {
            reserved_96: 0,
            dtype: 0,
            antenna: [0; ANTENNA_SIZE],
            reserved_112: 0,
            version: 0,
            name: [0; NAME_SIZE],
            checksum: [0; 2],
            info_area: vec![0; INFO_AREA_SIZE],
            gps: [[0; GPS_BLOCK_SIZE]; 2],
        }
    }
}

impl Default for ChannelHeader {
    fn default() -> Self {
        Self {
            tag: 0x00FF,
            data: HEADER_SIZE as i16,
            samples: 0,
            bits: OUTPUT_BITS,
            zero: 0,
            sps: 0.0,
            spm: 0.0,
            mpm: 0.0,
            position: 0.0,
            range: 0.0,
            npass: 0,
            created: PackedDate::default(),
            modified: PackedDate::default(),
            rgain: 0,
            nrgain: 0,
            text: 0,
            ntext: 0,
            processing: 0,
            nproc: 0,
            nchan: 1,
            epsr: 1.0,
            top: 0.0,
            depth: 0.0,
            x_start: 0.0,
            x_end: 0.0,
            servo_level: 0.0,
            accessory: 0,
            sconfig: 0,
            spp: 0,
            line_number: 0,
            y_start: 0.0,
            y_end: 0.0,
            opaque: OpaqueBlocks::default(),
        }
    }
}

/// On-disk image of a header, in field order.
#[derive(Debug, ToBytes)]
#[fixed_block(size = 1024)]
pub(crate) struct HeaderBlock {
    tag: i16,
    data: i16,
    samples: i16,
    bits: i16,
    zero: i16,
    sps: f32,
    spm: f32,
    mpm: f32,
    position: f32,
    range: f32,
    npass: i16,
    created: PackedDate,
    modified: PackedDate,
    rgain: i16,
    nrgain: i16,
    text: i16,
    ntext: i16,
    processing: i16,
    nproc: i16,
    nchan: i16,
    epsr: f32,
    top: f32,
    depth: f32,
    x_start: f32,
    x_end: f32,
    servo_level: f32,
    reserved_78: [u8; 3],
    accessory: u8,
    sconfig: i16,
    spp: i16,
    line_number: i16,
    y_start: f32,
    y_end: f32,
    reserved_96: u8,
    dtype: u8,
    antenna: [u8; ANTENNA_SIZE],
    reserved_112: u8,
    version: u8,
    name: [u8; NAME_SIZE],
    checksum: [u8; 2],
    info_area: Vec<u8>,
    gps: [[u8; GPS_BLOCK_SIZE]; 2],
}

impl ChannelHeader {
    /// Parses one 1024-byte header block.
    pub fn read(block: &[u8]) -> Result<Self> {
        ensure!(
            block.len() >= HEADER_SIZE,
            "Insufficient data for a channel header: {} < {HEADER_SIZE} bytes",
            block.len()
        );

        let r = &mut LeReader::new(&block[..HEADER_SIZE]);

        let tag = r.read::<i16>()?;
        let data = r.read::<i16>()?;
        let samples = r.read::<i16>()?;
        let bits = r.read::<i16>()?;
        let zero = r.read::<i16>()?;
        let sps = r.read::<f32>()?;
        let spm = r.read::<f32>()?;
        let mpm = r.read::<f32>()?;
        let position = r.read::<f32>()?;
        let range = r.read::<f32>()?;
        let npass = r.read::<i16>()?;
        let created = PackedDate::from_bytes(r.array::<4>()?);
        let modified = PackedDate::from_bytes(r.array::<4>()?);
        let rgain = r.read::<i16>()?;
        let nrgain = r.read::<i16>()?;
        let text = r.read::<i16>()?;
        let ntext = r.read::<i16>()?;
        let processing = r.read::<i16>()?;
        let nproc = r.read::<i16>()?;
        let nchan = r.read::<i16>()?;
        let epsr = r.read::<f32>()?;
        let top = r.read::<f32>()?;
        let depth = r.read::<f32>()?;
        let x_start = r.read::<f32>()?;
        let x_end = r.read::<f32>()?;
        let servo_level = r.read::<f32>()?;
        r.skip(3)?;
        let accessory = r.read::<u8>()?;
        let sconfig = r.read::<i16>()?;
        let spp = r.read::<i16>()?;
        let line_number = r.read::<i16>()?;
        let y_start = r.read::<f32>()?;
        let y_end = r.read::<f32>()?;

        let opaque = OpaqueBlocks {
            reserved_96: r.read::<u8>()?,
            dtype: r.read::<u8>()?,
            antenna: r.array::<ANTENNA_SIZE>()?,
            reserved_112: r.read::<u8>()?,
            version: r.read::<u8>()?,
            name: r.array::<NAME_SIZE>()?,
            checksum: r.array::<2>()?,
            info_area: r.vec(INFO_AREA_SIZE)?,
            gps: [r.array::<GPS_BLOCK_SIZE>()?, r.array::<GPS_BLOCK_SIZE>()?],
        };

        let header = Self {
            tag,
            data,
            samples,
            bits,
            zero,
            sps,
            spm,
            mpm,
            position,
            range,
            npass,
            created,
            modified,
            rgain,
            nrgain,
            text,
            ntext,
            processing,
            nproc,
            nchan,
            epsr,
            top,
            depth,
            x_start,
            x_end,
            servo_level,
            accessory,
            sconfig,
            spp,
            line_number,
            y_start,
            y_end,
            opaque,
        };

        trace!(
            "Header: tag={:#06X} nsamp={} bits={} zero={} range={}ns nchan={} antenna=\"{}\"",
            header.tag,
            header.samples,
            header.bits,
            header.zero,
            header.range,
            header.nchan,
            header.antenna_name()
        );

        Ok(header)
    }

    /// Serializes the header as written by the encoder: 32-bit samples, the
    /// given modification date and a zeroed reserved field.
    pub fn to_block(&self, modified: PackedDate) -> Result<Vec<u8>> {
        let o = &self.opaque;
        ensure!(
            o.info_area.len() == INFO_AREA_SIZE,
            "Info area must be {INFO_AREA_SIZE} bytes, got {}",
            o.info_area.len()
        );

        HeaderBlock {
            tag: self.tag,
            data: self.data,
            samples: self.samples,
            bits: OUTPUT_BITS,
            zero: self.zero,
            sps: self.sps,
            spm: self.spm,
            mpm: self.mpm,
            position: self.position,
            range: self.range,
            npass: self.npass,
            created: self.created,
            modified,
            rgain: self.rgain,
            nrgain: self.nrgain,
            text: self.text,
            ntext: self.ntext,
            processing: self.processing,
            nproc: self.nproc,
            nchan: self.nchan,
            epsr: self.epsr,
            top: self.top,
            depth: self.depth,
            x_start: self.x_start,
            x_end: self.x_end,
            servo_level: self.servo_level,
            reserved_78: [0; 3],
            accessory: self.accessory,
            sconfig: self.sconfig,
            spp: self.spp,
            line_number: self.line_number,
            y_start: self.y_start,
            y_end: self.y_end,
            reserved_96: o.reserved_96,
            dtype: o.dtype,
            antenna: o.antenna,
            reserved_112: o.reserved_112,
            version: o.version,
            name: o.name,
            checksum: o.checksum,
            info_area: o.info_area.clone(),
            gps: o.gps,
        }
        .to_block()
    }

    /// Sampling frequency down a trace in Hz, derived from the time range.
    pub fn sampling_frequency(&self) -> Option<f64> {
        if self.range > 0.0 && self.samples > 0 {
            Some(self.samples as f64 / (self.range as f64 * 1e-9))
        } else {
            None
        }
    }

    pub fn antenna_name(&self) -> String {
        block_text(&self.opaque.antenna)
    }

    pub fn set_antenna_name(&mut self, name: &str) {
        self.opaque.antenna = [0; ANTENNA_SIZE];
        let len = name.len().min(ANTENNA_SIZE);
        self.opaque.antenna[..len].copy_from_slice(&name.as_bytes()[..len]);
    }

    pub fn name(&self) -> String {
        block_text(&self.opaque.name)
    }
}

/// Byte offset of the sample payload in a file with `nchan` channels whose
/// first header declares `rh_data`.
///
/// Values in `0..1024` give the offset in units of 1024 bytes; anything else
/// marks a file whose payload follows the headers directly. The payload never
/// starts inside the header region.
pub fn payload_offset(rh_data: i16, nchan: usize) -> usize {
    let units = if (0..HEADER_SIZE as i16).contains(&rh_data) {
        rh_data as usize
    } else {
        nchan
    };
    (units * HEADER_SIZE).max(nchan * HEADER_SIZE)
}

fn block_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}
