//! Seedable, splittable random streams for noise generation.
//!
//! A [`NoiseKey`] is a small value that fully determines a random stream.
//! Keys can be split into independent children or folded together with extra
//! data, so every consumer (a trial, an entry, a thread) can own its own
//! generator without sharing mutable state. [`NoiseRng`] turns a key into a
//! counter-based Threefry-2x32 stream that implements [`rand::RngCore`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use rand::RngCore;

/// Key parity constant from the Threefry specification.
const KEY_PARITY: u32 = 0x1BD1_1BDA;

/// First counter word of the key that split children derive from.
const SPLIT_DOMAIN: u32 = 0x5EED_C417;

/// Key that deterministically identifies a random stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NoiseKey {
    hi: u32,
    lo: u32,
}

impl NoiseKey {
    /// Create a key from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        let (hi, lo) = split_u64(seed);
        Self { hi, lo }
    }

    /// Create a key from a seed drawn from the operating system.
    ///
    /// Returns the seed alongside the key so callers can log it and replay
    /// the run later with [`NoiseKey::new`].
    pub fn from_entropy() -> (Self, u64) {
        let seed: u64 = rand::random();
        (Self::new(seed), seed)
    }

    /// Raw key words, high word first.
    pub fn words(&self) -> (u32, u32) {
        (self.hi, self.lo)
    }

    /// Split into `n` keys whose streams are independent of each other and
    /// of the parent. Element `i` equals [`NoiseKey::child`]`(i)`.
    pub fn split(self, n: usize) -> Vec<Self> {
        let base = self.split_base();
        (0..n as u64).map(|i| base.derive(i)).collect()
    }

    /// The `index`-th child key, as produced by [`NoiseKey::split`].
    pub fn child(self, index: u64) -> Self {
        self.split_base().derive(index)
    }

    /// Derive a subkey bound to `data`, e.g. a trial or entry index.
    pub fn fold_in(self, data: u64) -> Self {
        self.derive(data)
    }

    /// Start a random stream from this key.
    pub fn to_rng(self) -> NoiseRng {
        NoiseRng::new(self)
    }

    // Children hang off a separate base key so they never equal `fold_in`
    // subkeys of the same parent.
    fn split_base(self) -> Self {
        let (hi, lo) = threefry2x32(self, SPLIT_DOMAIN, 0);
        Self { hi, lo }
    }

    fn derive(self, data: u64) -> Self {
        let (d0, d1) = split_u64(data);
        let (hi, lo) = threefry2x32(self, d0, d1);
        Self { hi, lo }
    }
}

/// Counter-based random stream derived from a [`NoiseKey`].
#[derive(Clone, Debug)]
pub struct NoiseRng {
    key: NoiseKey,
    counter: u64,
    buffer: [u32; 2],
    index: usize,
}

impl NoiseRng {
    /// Create a stream positioned at counter zero.
    pub fn new(key: NoiseKey) -> Self {
        Self {
            key,
            counter: 0,
            buffer: [0; 2],
            index: 2,
        }
    }

    /// Key this stream was started from.
    pub fn key(&self) -> NoiseKey {
        self.key
    }

    fn refill(&mut self) {
        let (c0, c1) = split_u64(self.counter);
        let (y0, y1) = threefry2x32(self.key, c1, c0);
        self.buffer = [y0, y1];
        self.index = 0;
        self.counter = self.counter.wrapping_add(1);
    }
}

impl RngCore for NoiseRng {
    fn next_u32(&mut self) -> u32 {
        if self.index >= 2 {
            self.refill();
        }
        let out = self.buffer[self.index];
        self.index += 1;
        out
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next_u32() as u64;
        let hi = self.next_u32() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn split_u64(x: u64) -> (u32, u32) {
    ((x >> 32) as u32, (x & 0xFFFF_FFFF) as u32)
}

/// Threefry-2x32 with 20 rounds applied to a single counter pair.
fn threefry2x32(key: NoiseKey, x0: u32, x1: u32) -> (u32, u32) {
    const ROTATIONS: [[u32; 4]; 2] = [[13, 15, 26, 6], [17, 29, 16, 24]];

    let ks = [key.hi, key.lo, key.hi ^ key.lo ^ KEY_PARITY];
    let mut x0 = x0.wrapping_add(ks[0]);
    let mut x1 = x1.wrapping_add(ks[1]);

    for block in 0..5usize {
        for &rot in &ROTATIONS[block % 2] {
            x0 = x0.wrapping_add(x1);
            x1 = x1.rotate_left(rot) ^ x0;
        }
        // Key injection after every four rounds.
        let s = block + 1;
        x0 = x0.wrapping_add(ks[s % 3]);
        x1 = x1.wrapping_add(ks[(s + 1) % 3]).wrapping_add(s as u32);
    }

    (x0, x1)
}

/// Common imports for random stream utilities.
pub mod prelude {
    pub use crate::{NoiseKey, NoiseRng};
}
