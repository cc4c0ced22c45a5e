//! Delta encoder: scans a target stream against a reference table and emits
//! the build codes that reproduce it.
//!
//! The scan is the classic rsync walk. A block-sized window slides over the
//! target one byte at a time; every position is probed against the table.
//! Bytes that fall out of the window unmatched accumulate into raw codes,
//! and each confirmed match becomes a reference code, after which the window
//! restarts block-aligned on fresh bytes.

use std::io::Read;

use crate::code::{BuildCode, BuildCodeList, CODE_VALUE_MAX};
use crate::error::{Result, SyncError};
use crate::index::SourceIndex;
use crate::rolling::RollingSignature;
use crate::table::{build_ref_table, RefTable};
use crate::wire;

/// Default cap on one raw code's payload: the largest length the wire
/// format can carry.
pub const DEFAULT_RAW_LIMIT: u32 = CODE_VALUE_MAX;

/// Tuning for [`generate_codes`].
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Maximum bytes per raw code, between 1 and [`CODE_VALUE_MAX`]. A
    /// longer unmatched run splits into consecutive raw codes at this size.
    pub raw_limit: u32,
    /// Fail with [`SyncError::Oversize`] when the encoded delta comes out
    /// larger than the target bytes it represents. Off by default; callers
    /// that can fall back to sending the file whole turn it on.
    pub oversize_check: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            raw_limit: DEFAULT_RAW_LIMIT,
            oversize_check: false,
        }
    }
}

impl EncodeOptions {
    fn validate(&self) -> Result<()> {
        if self.raw_limit == 0 || self.raw_limit > CODE_VALUE_MAX {
            return Err(SyncError::Config(format!(
                "raw limit must be between 1 and {}, got {}",
                CODE_VALUE_MAX,
                self.raw_limit
            )));
        }
        Ok(())
    }
}

/// Pending unmatched bytes, flushed into raw codes.
struct RawBuffer {
    buf: Vec<u8>,
    limit: usize,
}

impl RawBuffer {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
        }
    }

    /// Appends one unmatched byte, first flushing a full buffer so no raw
    /// code ever exceeds the limit.
    fn push(&mut self, byte: u8, codes: &mut Vec<BuildCode>) {
        if self.buf.len() >= self.limit {
            self.flush(codes);
        }
        self.buf.push(byte);
    }

    fn flush(&mut self, codes: &mut Vec<BuildCode>) {
        if !self.buf.is_empty() {
            codes.push(BuildCode::Raw(std::mem::take(&mut self.buf)));
        }
    }
}

/// Encodes `target` against `table`, producing the delta that rebuilds it
/// from the source file the table was derived from.
///
/// `block_size` must be the size the table's index was built with. The
/// target is read once, front to back; wrap file handles in a
/// `BufReader`, since the scan reads single bytes between matches.
pub fn generate_codes<R: Read>(
    table: &dyn RefTable,
    block_size: u16,
    mut target: R,
    options: &EncodeOptions,
) -> Result<BuildCodeList> {
    options.validate()?;
    if block_size == 0 {
        return Err(SyncError::Config("block size must be at least 1".into()));
    }

    let block_len = block_size as usize;
    let mut codes = Vec::new();
    let mut raw = RawBuffer::new(options.raw_limit as usize);
    let mut rolling = RollingSignature::new(block_len);
    let mut window = vec![0u8; block_len];
    let mut bytes_read: u64 = 0;

    'blocks: loop {
        let filled = wire::read_fill(&mut target, &mut window)?;
        bytes_read += filled as u64;
        if filled < block_len {
            // A short tail can never match a full block.
            for &byte in &window[..filled] {
                raw.push(byte, &mut codes);
            }
            break;
        }

        rolling.init(&window);
        loop {
            if let Some(index) = table.lookup(&rolling) {
                raw.flush(&mut codes);
                codes.push(BuildCode::Ref { index });
                // Restart block-aligned after a match.
                continue 'blocks;
            }
            match wire::read_byte(&mut target)? {
                Some(byte) => {
                    bytes_read += 1;
                    let evicted = rolling.roll(byte);
                    raw.push(evicted, &mut codes);
                }
                None => {
                    // Stream exhausted mid-window: drain it as literals.
                    for byte in rolling.bytes() {
                        raw.push(byte, &mut codes);
                    }
                    break 'blocks;
                }
            }
        }
    }
    raw.flush(&mut codes);

    let list = BuildCodeList::new(block_size, codes);
    if options.oversize_check {
        let encoded = list.estimated_length();
        if encoded > bytes_read {
            tracing::warn!(
                "Delta ({} bytes) exceeds the {} target bytes it encodes",
                encoded,
                bytes_read
            );
            return Err(SyncError::Oversize {
                encoded,
                read: bytes_read,
            });
        }
    }

    tracing::debug!(
        "Encoded {} target bytes into {} codes ({} bytes packed)",
        bytes_read,
        list.len(),
        list.packed_len()
    );
    Ok(list)
}

impl SourceIndex {
    /// Encodes `target` against this index, building a reference table with
    /// [`build_ref_table`] first.
    pub fn generate_codes<R: Read>(
        &self,
        target: R,
        options: &EncodeOptions,
    ) -> Result<BuildCodeList> {
        let table = build_ref_table(self);
        generate_codes(table.as_ref(), self.block_size(), target, options)
    }
}
