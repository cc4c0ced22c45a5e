//! Block signature computation: the fast 32-bit rolling-capable checksum and
//! the strong 160-bit SHA-1 digest.
//!
//! The fast checksum is the first-pass filter during target scanning; it is
//! cheap but collides. The strong hash confirms a candidate match and is what
//! actually decides block identity. Matching on the fast value alone is never
//! sufficient.

use std::cell::OnceCell;
use std::fmt;

use sha1::{Digest, Sha1};

/// Byte width of the strong hash (SHA-1).
pub const STRONG_LEN: usize = 20;

/// Fast checksum over a block, in the style of the rsync paper's Adler-32
/// variant.
///
/// Two 16-bit sums:
/// - `a`: sum of all bytes
/// - `b`: weighted sum, where the first byte carries weight `len` and the
///   last carries weight 1
///
/// The result is `(b << 16) | a`. The weighting direction matters: it is what
/// makes the O(1) rolling update in [`crate::RollingSignature`] possible, so
/// it must not be flipped.
pub fn fast_signature(data: &[u8]) -> u32 {
    let (a, b) = checksum_sums(data);
    (b << 16) | a
}

/// The two 16-bit running sums behind [`fast_signature`], already masked.
/// Shared with the rolling window so both start from identical state.
pub(crate) fn checksum_sums(data: &[u8]) -> (u32, u32) {
    let mut a: u32 = 0;
    let mut b: u32 = 0;
    let mut weight = data.len() as u32;

    for &byte in data {
        a = a.wrapping_add(byte as u32);
        b = b.wrapping_add(weight.wrapping_mul(byte as u32));
        weight = weight.wrapping_sub(1);
    }

    (a & 0xFFFF, b & 0xFFFF)
}

/// Strong signature over a block: the full SHA-1 digest.
///
/// Used only to confirm candidate matches found via the fast checksum and to
/// disambiguate fast-checksum collisions; never run per scanned byte.
pub fn strong_signature(data: &[u8]) -> [u8; STRONG_LEN] {
    Sha1::digest(data).into()
}

/// Per-block hash pair, the unit entry of a [`crate::SourceIndex`].
///
/// A signature lives one of two lifecycles, fixed at construction:
///
/// - **content-backed** ([`Signature::from_block`]): owns the block bytes;
///   `fast` and `strong` are computed on first access and cached, never
///   recomputed.
/// - **wire-backed** ([`Signature::from_wire`]): carries only the hash pair
///   decoded from the wire; there is no content to hash.
#[derive(Clone)]
pub struct Signature {
    fast: OnceCell<u32>,
    strong: OnceCell<[u8; STRONG_LEN]>,
    content: Option<Vec<u8>>,
}

impl Signature {
    /// Builds a content-backed signature from a block of bytes. Hashes are
    /// not computed until first asked for.
    pub fn from_block(block: &[u8]) -> Self {
        Self {
            fast: OnceCell::new(),
            strong: OnceCell::new(),
            content: Some(block.to_vec()),
        }
    }

    /// Builds a wire-backed signature from an already-computed hash pair.
    pub fn from_wire(fast: u32, strong: [u8; STRONG_LEN]) -> Self {
        let fast_cell = OnceCell::new();
        let strong_cell = OnceCell::new();
        let _ = fast_cell.set(fast);
        let _ = strong_cell.set(strong);
        Self {
            fast: fast_cell,
            strong: strong_cell,
            content: None,
        }
    }

    /// The fast checksum, computed at most once.
    pub fn fast(&self) -> u32 {
        *self.fast.get_or_init(|| {
            let content = self
                .content
                .as_deref()
                .expect("hash-only signature is constructed with both hashes set");
            fast_signature(content)
        })
    }

    /// The strong hash, computed at most once.
    pub fn strong(&self) -> [u8; STRONG_LEN] {
        *self.strong.get_or_init(|| {
            let content = self
                .content
                .as_deref()
                .expect("hash-only signature is constructed with both hashes set");
            strong_signature(content)
        })
    }

    /// The strong hash rendered as base64, for logs and diagnostics.
    pub fn strong_base64(&self) -> String {
        use base64::{engine::general_purpose, Engine as _};
        general_purpose::STANDARD.encode(self.strong())
    }

    /// The owned block bytes, present only on content-backed signatures.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("fast", &format_args!("{:#010x}", self.fast()))
            .field("strong", &self.strong_base64())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_signature_known_values() {
        assert_eq!(fast_signature(b"test"), 72942016);
        assert_eq!(fast_signature(b"test1234"), 223150730);
    }

    #[test]
    fn test_fast_signature_weighting_direction() {
        // First byte weighted heaviest: [1, 0] gives b = 2, [0, 1] gives b = 1.
        assert_eq!(fast_signature(&[1, 0]), (2 << 16) | 1);
        assert_eq!(fast_signature(&[0, 1]), (1 << 16) | 1);
    }

    #[test]
    fn test_fast_signature_empty() {
        assert_eq!(fast_signature(b""), 0);
    }

    #[test]
    fn test_fast_signature_high_bytes() {
        // 0xFF must count as 255, not -1.
        let fast = fast_signature(&[0xFF]);
        assert_eq!(fast & 0xFFFF, 255);
        assert_eq!(fast >> 16, 255);
    }

    #[test]
    fn test_fast_signature_deterministic() {
        let data = b"some block of data";
        assert_eq!(fast_signature(data), fast_signature(data));
    }

    fn base64_of(bytes: &[u8]) -> String {
        use base64::{engine::general_purpose, Engine as _};
        general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn test_strong_signature_known_values() {
        assert_eq!(base64_of(&strong_signature(b"test")), "qUqP5cyxm6YcTAhz05Hph5gvu9M=");
        assert_eq!(
            base64_of(&strong_signature(b"test1234")),
            "m8NFSdVl2VBbKH3gzSCsd74dPyw="
        );
    }

    #[test]
    fn test_content_backed_signature_caches() {
        let sig = Signature::from_block(b"cache me");
        let first = sig.fast();
        let second = sig.fast();
        assert_eq!(first, second);
        assert_eq!(first, fast_signature(b"cache me"));
        assert_eq!(sig.strong(), sig.strong());
        assert_eq!(sig.strong(), strong_signature(b"cache me"));
        assert_eq!(sig.content(), Some(&b"cache me"[..]));
    }

    #[test]
    fn test_wire_backed_signature_returns_stored_values() {
        let strong = [0xAB; STRONG_LEN];
        let sig = Signature::from_wire(0x1234_5678, strong);
        assert_eq!(sig.fast(), 0x1234_5678);
        assert_eq!(sig.strong(), strong);
        assert_eq!(sig.content(), None);
    }

    #[test]
    fn test_strong_base64_matches_direct_encoding() {
        let sig = Signature::from_block(b"test");
        assert_eq!(sig.strong_base64(), "qUqP5cyxm6YcTAhz05Hph5gvu9M=");
    }

    #[test]
    fn test_debug_shows_both_hashes() {
        let sig = Signature::from_block(b"test");
        let rendered = format!("{sig:?}");
        assert!(rendered.contains("0x0459"), "fast hex missing: {rendered}");
        assert!(rendered.contains("qUqP5cyxm6YcTAhz05Hph5gvu9M="), "{rendered}");
    }
}
