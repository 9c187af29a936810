//!
//! Random sampling used by generation-mode resolution and by the size mutator.
//!
//! `Sampler` only requires `rand64`; every other primitive has a default built on
//! top of it and may be overridden (tests script individual decisions this way).

use rand_core::RngCore;

pub trait Sampler {
    /// Uniform 64-bit value.
    fn rand64(&mut self) -> u64;

    /// Uniform value in `[0, n)`. Returns 0 for `n == 0`.
    fn rand(&mut self, n: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        self.rand64() % n
    }

    /// Uniform float in `[0, 1)`.
    fn float64(&mut self) -> f64 {
        (self.rand64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn one_of(&mut self, n: u64) -> bool {
        self.rand(n) == 0
    }

    fn bin(&mut self) -> bool {
        self.rand(2) == 0
    }

    fn n_out_of(&mut self, n: u64, out_of: u64) -> bool {
        self.rand(out_of) < n
    }

    /// Value in `[0, n)` where `n - 1` is `k` times more likely than 0.
    fn biased_rand(&mut self, n: u64, k: u64) -> u64 {
        if n == 0 {
            return 0;
        }
        if k == 0 {
            return self.rand(n);
        }
        let (nf, kf) = (n as f64, k as f64);
        let rf = nf * (kf / 2.0 + 1.0) * self.float64();
        let bf = (-1.0 + (1.0 + 2.0 * kf * rf / nf).sqrt()) * nf / kf;
        (bf as u64).min(n - 1)
    }

    /// Random integer skewed towards small and boundary values.
    fn rand_int64(&mut self) -> u64 {
        let mut v = if self.n_out_of(100, 182) {
            self.rand(10)
        } else if self.n_out_of(50, 82) {
            SPECIAL_INTS[self.rand(SPECIAL_INTS.len() as u64) as usize]
        } else if self.n_out_of(10, 32) {
            self.rand(256)
        } else if self.n_out_of(10, 22) {
            self.rand(4 << 10)
        } else if self.n_out_of(10, 12) {
            self.rand(64 << 10)
        } else {
            self.rand(1 << 31)
        };
        if self.n_out_of(100, 107) {
            return v;
        }
        if self.n_out_of(5, 7) {
            v = v.wrapping_neg();
        } else {
            v <<= self.rand(63);
        }
        v
    }

    /// `rand_int64` truncated to `bits` width.
    fn rand_int(&mut self, bits: u64) -> u64 {
        truncate_to_bits(self.rand_int64(), bits)
    }

    /// Value in the inclusive range `[begin, end]`, occasionally any value of the width.
    fn rand_range_int(&mut self, begin: u64, end: u64, bit_size: u64) -> u64 {
        if self.one_of(100) {
            return self.rand_int(bit_size);
        }
        let span = end.wrapping_sub(begin).wrapping_add(1);
        if span == 0 {
            return self.rand64();
        }
        begin.wrapping_add(self.rand64() % span)
    }
}

/// Values around common size and signedness boundaries.
pub const SPECIAL_INTS: &[u64] = &[
    0,
    1,
    31,
    32,
    63,
    64,
    127,
    128,
    129,
    255,
    256,
    257,
    511,
    512,
    1023,
    1024,
    1025,
    2047,
    2048,
    4095,
    4096,
    (1 << 15) - 1,
    1 << 15,
    (1 << 15) + 1,
    (1 << 16) - 1,
    1 << 16,
    (1 << 16) + 1,
    (1 << 31) - 1,
    1 << 31,
    (1 << 31) + 1,
    (1 << 32) - 1,
    1 << 32,
    (1 << 32) + 1,
    (1 << 63) - 1,
    1 << 63,
    (1 << 63) + 1,
    u64::MAX,
];

pub fn truncate_to_bits(v: u64, bits: u64) -> u64 {
    if bits == 0 || bits >= 64 {
        v
    } else {
        v & ((1u64 << bits) - 1)
    }
}

/// `Sampler` over any `RngCore`.
#[derive(Debug, Clone)]
pub struct RandGen<R: RngCore> {
    rng: R,
}

impl<R: RngCore> RandGen<R> {
    pub fn new(rng: R) -> Self {
        RandGen { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl RandGen<rand_core::OsRng> {
    pub fn from_entropy() -> Self {
        RandGen::new(rand_core::OsRng)
    }
}

impl<R: RngCore> Sampler for RandGen<R> {
    fn rand64(&mut self) -> u64 {
        self.rng.next_u64()
    }
}
