//! Build codes: the delta instructions exchanged on the wire.
//!
//! A delta is an ordered list of codes. Each code either points at one
//! source block by index or carries literal bytes the source does not have.
//! On the wire a code is a 3-byte header: the top 2 bits of a 24-bit
//! big-endian integer are the type tag, the remaining 22 bits the block
//! index or payload length. Raw codes are followed by the payload itself.

use std::io::{Read, Write};

use crate::error::{Result, SyncError};
use crate::wire;

/// Largest block index or raw payload length the 22-bit header field can
/// carry.
pub const CODE_VALUE_MAX: u32 = (1 << 22) - 1;

/// Leading version byte of a packed build code list.
pub(crate) const BUILD_CODE_LIST_VERSION: u8 = 0x81;

const TAG_MASK: u8 = 0xC0;
const REF_TAG: u8 = 0x80;
const RAW_TAG: u8 = 0x00;

/// One delta instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildCode {
    /// Copy the source block at this index into the output.
    Ref { index: u32 },
    /// Splice these bytes into the output verbatim.
    Raw(Vec<u8>),
}

impl BuildCode {
    /// Packed size in bytes: the 3-byte header plus any raw payload.
    pub fn length(&self) -> u64 {
        match self {
            BuildCode::Ref { .. } => 3,
            BuildCode::Raw(data) => 3 + data.len() as u64,
        }
    }

    /// Writes the code and returns the number of bytes written.
    ///
    /// Fails with [`SyncError::FieldRange`] when the block index or payload
    /// length exceeds [`CODE_VALUE_MAX`].
    pub fn pack<W: Write>(&self, out: &mut W) -> Result<u64> {
        match self {
            BuildCode::Ref { index } => {
                if *index > CODE_VALUE_MAX {
                    return Err(SyncError::FieldRange {
                        what: "block reference index",
                        value: *index as u64,
                    });
                }
                write_header(out, REF_TAG, *index)?;
                Ok(3)
            }
            BuildCode::Raw(data) => {
                if data.len() > CODE_VALUE_MAX as usize {
                    return Err(SyncError::FieldRange {
                        what: "raw payload length",
                        value: data.len() as u64,
                    });
                }
                write_header(out, RAW_TAG, data.len() as u32)?;
                out.write_all(data)?;
                Ok(3 + data.len() as u64)
            }
        }
    }

    /// Reads one code written by [`pack`](Self::pack).
    pub fn unpack<R: Read>(input: &mut R) -> Result<Self> {
        let first = wire::read_u8(input).map_err(|e| SyncError::from_read(e, "build code header"))?;
        let low = wire::read_u16(input).map_err(|e| SyncError::from_read(e, "build code header"))?;
        let value = ((first & 0x3F) as u32) << 16 | low as u32;

        match first & TAG_MASK {
            REF_TAG => Ok(BuildCode::Ref { index: value }),
            RAW_TAG => {
                let mut data = vec![0u8; value as usize];
                input
                    .read_exact(&mut data)
                    .map_err(|e| SyncError::from_read(e, "raw code payload"))?;
                Ok(BuildCode::Raw(data))
            }
            tag => Err(SyncError::UnknownHeader { tag }),
        }
    }
}

fn write_header<W: Write>(out: &mut W, tag: u8, value: u32) -> Result<()> {
    wire::write_u8(out, tag | ((value >> 16) as u8 & 0x3F))?;
    wire::write_u16(out, value as u16)?;
    Ok(())
}

/// The full delta for one file: an ordered code list plus the block size the
/// codes were generated against.
///
/// Played back in order against an unchanged source file, the list
/// reproduces the target byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCodeList {
    block_size: u16,
    codes: Vec<BuildCode>,
}

impl BuildCodeList {
    pub fn new(block_size: u16, codes: Vec<BuildCode>) -> Self {
        Self { block_size, codes }
    }

    /// Block size the delta was generated with. Must match the source
    /// index's block size for playback to make sense.
    pub fn block_size(&self) -> u16 {
        self.block_size
    }

    pub fn codes(&self) -> &[BuildCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Packed size of the codes alone, without the list header.
    pub fn estimated_length(&self) -> u64 {
        self.codes.iter().map(BuildCode::length).sum()
    }

    /// Exact size of the packed form in bytes, header included.
    pub fn packed_len(&self) -> u64 {
        11 + self.estimated_length()
    }

    /// Writes the binary form: version byte, block size, code count, code
    /// byte-length estimate, then every code in order. Returns the number of
    /// bytes written.
    pub fn pack<W: Write>(&self, out: &mut W) -> Result<u64> {
        if self.codes.len() > u32::MAX as usize {
            return Err(SyncError::FieldRange {
                what: "build code count",
                value: self.codes.len() as u64,
            });
        }

        wire::write_u8(out, BUILD_CODE_LIST_VERSION)?;
        wire::write_u16(out, self.block_size)?;
        wire::write_u32(out, self.codes.len() as u32)?;
        // Advisory size field; saturates instead of failing on huge deltas.
        wire::write_u32(out, self.estimated_length().min(u32::MAX as u64) as u32)?;

        let mut written = 11u64;
        for code in &self.codes {
            written += code.pack(out)?;
        }
        Ok(written)
    }

    /// Reads the binary form written by [`pack`](Self::pack).
    pub fn unpack<R: Read>(mut input: R) -> Result<Self> {
        let version = wire::read_u8(&mut input)
            .map_err(|e| SyncError::from_read(e, "build code list version"))?;
        if version != BUILD_CODE_LIST_VERSION {
            return Err(SyncError::VersionMismatch {
                expected: BUILD_CODE_LIST_VERSION,
                found: version,
            });
        }

        let block_size = wire::read_u16(&mut input)
            .map_err(|e| SyncError::from_read(e, "build code list block size"))?;
        if block_size == 0 {
            return Err(SyncError::FieldRange {
                what: "build code list block size",
                value: 0,
            });
        }
        let count = wire::read_u32(&mut input)
            .map_err(|e| SyncError::from_read(e, "build code count"))?;
        // The size estimate is advisory; skip it.
        wire::read_u32(&mut input).map_err(|e| SyncError::from_read(e, "estimated length"))?;

        let mut codes = Vec::new();
        for _ in 0..count {
            codes.push(BuildCode::unpack(&mut input)?);
        }

        tracing::debug!(
            "Unpacked {} build codes, block size {}",
            codes.len(),
            block_size
        );
        Ok(Self { block_size, codes })
    }
}
