//! Reference tables: fast lookup from a window signature to a source block.
//!
//! Built on the target side from an unpacked [`SourceIndex`], a table answers
//! "is this window byte-identical to some source block, and which one?" A
//! match requires the fast checksum AND the strong hash to agree; the fast
//! value alone is only a filter, and colliding fast values across distinct
//! content are routine.
//!
//! When several source blocks share identical content, every lookup resolves
//! to the lowest block index. Both implementations agree on this, so the
//! encoder's output does not depend on which table backs it.

use std::collections::HashMap;

use crate::checksum::STRONG_LEN;
use crate::index::SourceIndex;
use crate::rolling::RollingSignature;

/// Block count at and above which [`build_ref_table`] switches from the
/// hash-map table to the flat sorted-array table.
pub const ARRAY_TABLE_THRESHOLD: usize = 1 << 16;

/// Signature-to-block lookup over one source file.
///
/// The strong hash of the probe window is expensive; implementations compute
/// it at most once per lookup, and only after the fast checksum has hit.
pub trait RefTable {
    /// Index of the source block matching the current window, if any.
    fn lookup(&self, rolling: &RollingSignature) -> Option<u32>;
}

/// Picks a table implementation for `index` by block count: the hash table
/// below [`ARRAY_TABLE_THRESHOLD`] blocks, the sorted array at or above it,
/// where its per-entry memory savings start to matter.
pub fn build_ref_table(index: &SourceIndex) -> Box<dyn RefTable> {
    if index.len() >= ARRAY_TABLE_THRESHOLD {
        tracing::debug!("Using array reference table for {} blocks", index.len());
        Box::new(ArrayRefTable::new(index))
    } else {
        tracing::debug!("Using hash reference table for {} blocks", index.len());
        Box::new(HashRefTable::new(index))
    }
}

/// Two-level hash table: fast checksum to strong hash to block index.
///
/// O(1) expected lookup with per-entry map overhead; the right choice for
/// small and moderate source files.
pub struct HashRefTable {
    buckets: HashMap<u32, HashMap<[u8; STRONG_LEN], u32>>,
}

impl HashRefTable {
    pub fn new(index: &SourceIndex) -> Self {
        let mut buckets: HashMap<u32, HashMap<[u8; STRONG_LEN], u32>> = HashMap::new();
        for (i, signature) in index.signatures().iter().enumerate() {
            buckets
                .entry(signature.fast())
                .or_default()
                .entry(signature.strong())
                .or_insert(i as u32);
        }
        Self { buckets }
    }
}

impl RefTable for HashRefTable {
    fn lookup(&self, rolling: &RollingSignature) -> Option<u32> {
        let inner = self.buckets.get(&rolling.fast())?;
        inner.get(&rolling.strong()).copied()
    }
}

#[derive(Clone, Copy)]
struct ArrayEntry {
    fast: u32,
    strong: [u8; STRONG_LEN],
    index: u32,
}

/// Flat table: one entry per source block, sorted by the low 16 bits of the
/// fast checksum, with a 65536-slot jump table giving each bucket's first
/// position.
///
/// 28 bytes per entry and no per-entry allocation, which beats the hash
/// table's overhead once source files run to many tens of thousands of
/// blocks. Lookup jumps to the bucket and walks it linearly; buckets stay
/// short because blocks spread across 65536 of them.
pub struct ArrayRefTable {
    entries: Vec<ArrayEntry>,
    // First entry position per low-16-bit fast value; EMPTY_BUCKET if none.
    jump: Vec<u32>,
}

const EMPTY_BUCKET: u32 = u32::MAX;

impl ArrayRefTable {
    pub fn new(index: &SourceIndex) -> Self {
        let mut entries: Vec<ArrayEntry> = index
            .signatures()
            .iter()
            .enumerate()
            .map(|(i, signature)| ArrayEntry {
                fast: signature.fast(),
                strong: signature.strong(),
                index: i as u32,
            })
            .collect();
        // Stable: within a bucket, entries keep file order, so the walk
        // below finds the lowest matching block index first.
        entries.sort_by_key(|e| e.fast & 0xFFFF);

        let mut jump = vec![EMPTY_BUCKET; 1 << 16];
        for (pos, entry) in entries.iter().enumerate().rev() {
            jump[(entry.fast & 0xFFFF) as usize] = pos as u32;
        }

        Self { entries, jump }
    }
}

impl RefTable for ArrayRefTable {
    fn lookup(&self, rolling: &RollingSignature) -> Option<u32> {
        let fast = rolling.fast();
        let bucket = fast & 0xFFFF;
        let start = self.jump[bucket as usize];
        if start == EMPTY_BUCKET {
            return None;
        }

        let mut strong = None;
        for entry in &self.entries[start as usize..] {
            if entry.fast & 0xFFFF != bucket {
                break;
            }
            if entry.fast != fast {
                continue;
            }
            let strong = strong.get_or_insert_with(|| rolling.strong());
            if entry.strong == *strong {
                return Some(entry.index);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn index_of(source: &[u8], block_size: u16) -> SourceIndex {
        SourceIndex::create(Cursor::new(source), block_size).unwrap()
    }

    fn probe(block: &[u8]) -> RollingSignature {
        let mut rolling = RollingSignature::new(block.len());
        rolling.init(block);
        rolling
    }

    fn assert_finds_all(table: &dyn RefTable, source: &[u8], block_size: usize) {
        for (i, block) in source.chunks_exact(block_size).enumerate() {
            assert_eq!(
                table.lookup(&probe(block)),
                Some(i as u32),
                "block {} not found",
                i
            );
        }
    }

    #[test]
    fn test_hash_table_finds_each_block() {
        let index = index_of(b"0123456789", 3);
        assert_finds_all(&HashRefTable::new(&index), b"012345678", 3);
    }

    #[test]
    fn test_array_table_finds_each_block() {
        let index = index_of(b"0123456789", 3);
        assert_finds_all(&ArrayRefTable::new(&index), b"012345678", 3);
    }

    #[test]
    fn test_lookup_miss() {
        let index = index_of(b"0123456789", 3);
        assert_eq!(HashRefTable::new(&index).lookup(&probe(b"XYZ")), None);
        assert_eq!(ArrayRefTable::new(&index).lookup(&probe(b"XYZ")), None);
    }

    #[test]
    fn test_fast_collision_is_not_a_match() {
        // Same fast checksum, different content: a=2, b=4 for both.
        let block = [0u8, 2, 0];
        let colliding = [1u8, 0, 1];
        assert_eq!(
            crate::checksum::fast_signature(&block),
            crate::checksum::fast_signature(&colliding)
        );

        let index = index_of(&block, 3);
        assert_eq!(HashRefTable::new(&index).lookup(&probe(&colliding)), None);
        assert_eq!(ArrayRefTable::new(&index).lookup(&probe(&colliding)), None);
    }

    #[test]
    fn test_duplicate_blocks_resolve_to_lowest_index() {
        let index = index_of(b"ABCABCABC", 3);
        assert_eq!(HashRefTable::new(&index).lookup(&probe(b"ABC")), Some(0));
        assert_eq!(ArrayRefTable::new(&index).lookup(&probe(b"ABC")), Some(0));
    }

    #[test]
    fn test_array_bucket_with_shared_low_bits() {
        // All three blocks sum to 3, so they land in jump bucket 3 while
        // their full fast values differ.
        let source = [3u8, 0, 0, 0, 0, 3, 0, 3, 0];
        let index = index_of(&source, 3);
        let table = ArrayRefTable::new(&index);

        assert_finds_all(&table, &source, 3);
        // Full-fast collision with block 2 ([0,3,0]) but different strong.
        let colliding = [1u8, 1, 1];
        assert_eq!(
            crate::checksum::fast_signature(&colliding),
            crate::checksum::fast_signature(&[0u8, 3, 0])
        );
        assert_eq!(table.lookup(&probe(&colliding)), None);
    }

    #[test]
    fn test_empty_index() {
        let index = index_of(b"", 4);
        assert_eq!(HashRefTable::new(&index).lookup(&probe(b"abcd")), None);
        assert_eq!(ArrayRefTable::new(&index).lookup(&probe(b"abcd")), None);
    }

    #[test]
    fn test_build_ref_table_lookup() {
        let index = index_of(b"0123456789", 3);
        let table = build_ref_table(&index);
        assert_eq!(table.lookup(&probe(b"345")), Some(1));
        assert_eq!(table.lookup(&probe(b"999")), None);
    }
}
