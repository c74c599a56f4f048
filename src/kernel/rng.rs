//! Per-particle random streams.
//!
//! Each particle owns a 64-bit xorshift state. The WGSL kernel stores it as a
//! `vec2<u32>` (low word, high word) and emulates the 64-bit shifts on the
//! pair; the functions here are the reference the shader follows bit for bit.

/// Replacement for the one state xorshift cannot leave.
pub const ZERO_SEED_FALLBACK: u64 = 0x9E37_79B9_7F4A_7C15;

/// One xorshift64 step (shifts 13, 7, 17).
#[inline]
pub const fn xorshift64(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

/// Top 24 bits of the state as a float in [0, 1).
#[inline]
pub fn unit_f32(state: u64) -> f32 {
    (state >> 40) as f32 / 16_777_216.0
}

/// PCG output permutation, used only to derive initial seeds.
#[inline]
pub const fn pcg_hash(x: u32) -> u32 {
    let state = x.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    let word = ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277_803_737);
    (word >> 22) ^ word
}

/// Deterministic, never-zero seed for particle `index`.
pub const fn seed_from_index(index: u32) -> u64 {
    let lo = pcg_hash(index.wrapping_mul(2).wrapping_add(1)) as u64;
    let hi = pcg_hash(index.wrapping_mul(2).wrapping_add(2)) as u64;
    let seed = (hi << 32) | lo;
    if seed == 0 {
        ZERO_SEED_FALLBACK
    } else {
        seed
    }
}

/// Split a state into the `(lo, hi)` words the GPU stores.
#[inline]
pub const fn split_seed(seed: u64) -> [u32; 2] {
    [seed as u32, (seed >> 32) as u32]
}

#[inline]
pub const fn join_seed(words: [u32; 2]) -> u64 {
    ((words[1] as u64) << 32) | words[0] as u64
}

/// A particle stream borrowed for the duration of one kernel invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleRng {
    state: u64,
}

impl ParticleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { ZERO_SEED_FALLBACK } else { seed },
        }
    }

    /// Advance the stream and return a float in [0, 1).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.state = xorshift64(self.state);
        unit_f32(self.state)
    }

    /// Three consecutive draws.
    #[inline]
    pub fn next_vec3(&mut self) -> [f32; 3] {
        let x = self.next_f32();
        let y = self.next_f32();
        let z = self.next_f32();
        [x, y, z]
    }

    pub fn state(&self) -> u64 {
        self.state
    }
}
