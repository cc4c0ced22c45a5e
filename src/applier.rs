//! Patch: replays a build code list against the source file to materialize
//! the target.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::code::{BuildCode, BuildCodeList};
use crate::error::{Result, SyncError};
use crate::wire;

/// Rebuilds the target by playing `list` back against `source`.
///
/// `source` must be the unchanged file the list was encoded against:
/// reference codes seek to `index * block_size` and read one full block,
/// and a short read there fails with [`SyncError::SourceIntegrity`]. Raw
/// codes are written through as-is. Returns the number of bytes written to
/// `out`; callers that know the expected target length should compare.
pub fn apply_codes<S, W>(source: &mut S, list: &BuildCodeList, out: &mut W) -> Result<u64>
where
    S: Read + Seek + ?Sized,
    W: Write + ?Sized,
{
    let block_len = list.block_size() as usize;
    let mut block = vec![0u8; block_len];
    let mut written: u64 = 0;

    for code in list.codes() {
        match code {
            BuildCode::Ref { index } => {
                source.seek(SeekFrom::Start(*index as u64 * block_len as u64))?;
                let got = wire::read_fill(source, &mut block)?;
                if got < block_len {
                    return Err(SyncError::SourceIntegrity {
                        index: *index,
                        expected: block_len,
                        got,
                    });
                }
                out.write_all(&block)?;
                written += block_len as u64;
            }
            BuildCode::Raw(data) => {
                out.write_all(data)?;
                written += data.len() as u64;
            }
        }
    }

    out.flush()?;
    tracing::debug!("Patched {} bytes from {} codes", written, list.len());
    Ok(written)
}
