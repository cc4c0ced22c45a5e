//! Source block index: the per-block signature manifest of a source file.
//!
//! The source side cuts its file into fixed-size blocks and records a
//! [`Signature`] for each. The manifest travels to the target side (see
//! [`pack`](SourceIndex::pack) / [`unpack`](SourceIndex::unpack)), which
//! matches target content against it without ever seeing the source bytes.

use std::io::{Read, Write};

use crate::checksum::{Signature, STRONG_LEN};
use crate::error::{Result, SyncError};
use crate::wire;

/// Leading version byte of a packed source index.
pub(crate) const SOURCE_INDEX_VERSION: u8 = 0x71;

/// Signatures of a source file's complete blocks, in file order.
///
/// A trailing partial block is not indexed; whatever it covered is resent
/// as raw bytes when the file is rebuilt.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    block_size: u16,
    signatures: Vec<Signature>,
}

impl SourceIndex {
    /// Reads `source` to the end and signs every complete `block_size` block.
    ///
    /// A final block shorter than `block_size` is discarded. `block_size`
    /// must be at least 1. Build codes address blocks with a 22-bit index,
    /// so a source beyond [`CODE_VALUE_MAX`](crate::CODE_VALUE_MAX) blocks
    /// needs a larger block size to stay fully referenceable.
    pub fn create<R: Read>(mut source: R, block_size: u16) -> Result<Self> {
        if block_size == 0 {
            return Err(SyncError::Config("block size must be at least 1".into()));
        }

        let mut signatures = Vec::new();
        let mut block = vec![0u8; block_size as usize];
        loop {
            let filled = wire::read_fill(&mut source, &mut block)?;
            if filled < block.len() {
                break;
            }
            signatures.push(Signature::from_block(&block));
        }

        tracing::debug!(
            "Indexed {} blocks of {} bytes",
            signatures.len(),
            block_size
        );
        Ok(Self {
            block_size,
            signatures,
        })
    }

    /// Block size the index was built with.
    pub fn block_size(&self) -> u16 {
        self.block_size
    }

    /// Number of indexed blocks.
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Signature of block `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<&Signature> {
        self.signatures.get(index)
    }

    /// All block signatures, in file order.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Exact size of the packed form in bytes.
    pub fn packed_len(&self) -> u64 {
        1 + 2 + 4 + self.signatures.len() as u64 * (4 + STRONG_LEN as u64)
    }

    /// Writes the binary form: version byte, block size, block count, then
    /// one fast/strong pair per block. Returns the number of bytes written.
    pub fn pack<W: Write>(&self, out: &mut W) -> Result<u64> {
        if self.signatures.len() > u32::MAX as usize {
            return Err(SyncError::FieldRange {
                what: "source index block count",
                value: self.signatures.len() as u64,
            });
        }

        wire::write_u8(out, SOURCE_INDEX_VERSION)?;
        wire::write_u16(out, self.block_size)?;
        wire::write_u32(out, self.signatures.len() as u32)?;
        for signature in &self.signatures {
            wire::write_u32(out, signature.fast())?;
            out.write_all(&signature.strong())?;
        }
        Ok(self.packed_len())
    }

    /// Reads the binary form written by [`pack`](Self::pack).
    pub fn unpack<R: Read>(mut input: R) -> Result<Self> {
        let version = wire::read_u8(&mut input)
            .map_err(|e| SyncError::from_read(e, "source index version"))?;
        if version != SOURCE_INDEX_VERSION {
            return Err(SyncError::VersionMismatch {
                expected: SOURCE_INDEX_VERSION,
                found: version,
            });
        }

        let block_size = wire::read_u16(&mut input)
            .map_err(|e| SyncError::from_read(e, "source index block size"))?;
        if block_size == 0 {
            return Err(SyncError::FieldRange {
                what: "source index block size",
                value: 0,
            });
        }
        let count = wire::read_u32(&mut input)
            .map_err(|e| SyncError::from_read(e, "source index block count"))?;

        let mut signatures = Vec::new();
        for _ in 0..count {
            let fast = wire::read_u32(&mut input)
                .map_err(|e| SyncError::from_read(e, "signature fast hash"))?;
            let mut strong = [0u8; STRONG_LEN];
            input
                .read_exact(&mut strong)
                .map_err(|e| SyncError::from_read(e, "signature strong hash"))?;
            signatures.push(Signature::from_wire(fast, strong));
        }

        tracing::debug!(
            "Unpacked index: {} blocks of {} bytes",
            signatures.len(),
            block_size
        );
        Ok(Self {
            block_size,
            signatures,
        })
    }
}
