//! Single-file delta synchronization in the rsync style.
//!
//! Two machines hold different revisions of a file and want to converge
//! while exchanging as little data as possible. Three artifacts travel
//! between them:
//!
//! 1. The source side builds a [`SourceIndex`] (per-block fast and strong
//!    hashes) and sends it over.
//! 2. The target side scans its file against the index
//!    ([`SourceIndex::generate_codes`]) and answers with a compact
//!    [`BuildCodeList`]: references to blocks the source already has,
//!    interleaved with the literal bytes it does not.
//! 3. The source side replays the list against its local file
//!    ([`apply_codes`]) and obtains the target byte-for-byte.
//!
//! Only the index and the code list cross the network; the more the two
//! revisions share, the smaller the exchange. Both artifacts have compact
//! big-endian wire forms via their `pack`/`unpack` methods.
//!
//! ```
//! use std::io::Cursor;
//! use remotesync::{apply_codes, EncodeOptions, SourceIndex};
//!
//! # fn main() -> remotesync::Result<()> {
//! let source = b"the quick brown fox jumps over the lazy dog";
//! let target = b"the quick brown cat naps over the lazy dog!";
//!
//! // Source side: index the current file.
//! let index = SourceIndex::create(Cursor::new(source), 8)?;
//!
//! // Target side: encode the new revision against the index.
//! let delta = index.generate_codes(Cursor::new(target), &EncodeOptions::default())?;
//!
//! // Source side: replay the delta to rebuild the new revision.
//! let mut rebuilt = Vec::new();
//! apply_codes(&mut Cursor::new(source), &delta, &mut rebuilt)?;
//! assert_eq!(rebuilt, target);
//! # Ok(())
//! # }
//! ```

pub mod applier;
pub mod checksum;
pub mod code;
pub mod error;
pub mod generator;
pub mod index;
pub mod rolling;
pub mod table;
mod wire;

pub use applier::apply_codes;
pub use checksum::{fast_signature, strong_signature, Signature, STRONG_LEN};
pub use code::{BuildCode, BuildCodeList, CODE_VALUE_MAX};
pub use error::{Result, SyncError};
pub use generator::{generate_codes, EncodeOptions, DEFAULT_RAW_LIMIT};
pub use index::SourceIndex;
pub use rolling::RollingSignature;
pub use table::{build_ref_table, ArrayRefTable, HashRefTable, RefTable, ARRAY_TABLE_THRESHOLD};

/// Default block size in bytes, suitable for mid-sized files.
pub const DEFAULT_BLOCK_SIZE: u16 = 4096;

/// Block size for a source of the given length: sqrt(file size),
/// capped between 512 bytes and the u16 wire maximum.
pub fn recommended_block_size(file_size: u64) -> u16 {
    let size = (file_size as f64).sqrt() as u64;
    size.clamp(512, u16::MAX as u64) as u16
}
