//! Rolling form of the fast checksum.
//!
//! A [`RollingSignature`] owns a window of exactly one block and slides it
//! through the target stream one byte at a time, maintaining the fast
//! checksum in O(1) per step. The strong hash has no incremental form and is
//! recomputed from the window only when a candidate match needs confirming.
//!
//! The window is a preallocated ring (array plus head index), not a deque:
//! a roll never allocates.

use sha1::{Digest, Sha1};

use crate::checksum::{checksum_sums, STRONG_LEN};

#[derive(Debug, Clone)]
pub struct RollingSignature {
    window: Vec<u8>,
    head: usize,
    a: u32,
    b: u32,
}

impl RollingSignature {
    /// Creates an empty rolling signature sized for `block_size` windows.
    /// [`init`](Self::init) must run before the first [`roll`](Self::roll).
    pub fn new(block_size: usize) -> Self {
        Self {
            window: Vec::with_capacity(block_size),
            head: 0,
            a: 0,
            b: 0,
        }
    }

    /// Resets the window and accumulators from a fresh block.
    pub fn init(&mut self, block: &[u8]) {
        self.window.clear();
        self.window.extend_from_slice(block);
        self.head = 0;
        let (a, b) = checksum_sums(block);
        self.a = a;
        self.b = b;
    }

    /// Slides the window forward by one byte: the oldest byte leaves, `adding`
    /// enters at the end, and the checksum is updated in place.
    ///
    /// Returns the evicted byte. With window size `n`, departing byte `d` and
    /// arriving byte `x`:
    ///
    /// ```text
    /// a' = (a - d + x)       mod 2^16
    /// b' = (b - n*d + a')    mod 2^16
    /// ```
    ///
    /// `b'` uses the already-updated `a'`; swapping the order breaks the
    /// equivalence with recomputing from scratch.
    pub fn roll(&mut self, adding: u8) -> u8 {
        let size = self.window.len() as u32;
        let deleting = self.window[self.head];
        self.window[self.head] = adding;
        self.head += 1;
        if self.head == self.window.len() {
            self.head = 0;
        }

        let del = deleting as u32;
        self.a = self.a.wrapping_sub(del).wrapping_add(adding as u32) & 0xFFFF;
        self.b = self
            .b
            .wrapping_sub(size.wrapping_mul(del))
            .wrapping_add(self.a)
            & 0xFFFF;

        deleting
    }

    /// The fast checksum of the current window.
    pub fn fast(&self) -> u32 {
        (self.b << 16) | self.a
    }

    /// The strong hash of the current window, recomputed on each call.
    /// The ring is hashed in logical order without copying it out.
    pub fn strong(&self) -> [u8; STRONG_LEN] {
        let mut hasher = Sha1::new();
        hasher.update(&self.window[self.head..]);
        hasher.update(&self.window[..self.head]);
        hasher.finalize().into()
    }

    /// Window bytes in logical order, oldest first.
    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.window[self.head..]
            .iter()
            .chain(&self.window[..self.head])
            .copied()
    }

    /// Current window length.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
