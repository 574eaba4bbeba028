// SPDX-License-Identifier: Apache-2.0

//! Deterministic PRNG wrapper.
//!
//! A single `Random` instance owns all PRNG state for a `Generator` or
//! `Mutator` run; every draw mutates it in place, and a fixed seed
//! reproduces an identical stream of draws (see spec §5, §8 "Determinism").

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const MINIMAL_STRING_ALPHABET: &[u8] = b"-ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 _:$";

/// Owns a seeded PRNG. Cloning a `Random` is intentionally not `Copy`: the
/// caller holds exactly one instance and threads it through by `&mut`.
pub struct Random {
    rng: StdRng,
}

impl Random {
    pub fn new(seed: u64) -> Self {
        Random {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform integer in `[lo, hi]` inclusive.
    pub fn range_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        self.rng.gen_range(lo..=hi)
    }

    /// Uniform integer in `[0, n)`. Panics if `n == 0`.
    pub fn index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    pub fn bool(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// A random string of 1..=10 printable ascii characters drawn from the
    /// minimal-primitive alphabet in spec §4.5.
    pub fn minimal_string(&mut self) -> String {
        self.random_string(1, 10)
    }

    /// A short random string, 1..=4 characters, used by the mutator's
    /// append/prepend string family (spec §4.6).
    pub fn short_string(&mut self) -> String {
        self.random_string(1, 4)
    }

    pub fn random_string(&mut self, min_len: usize, max_len: usize) -> String {
        let len = self.rng.gen_range(min_len..=max_len);
        (0..len)
            .map(|_| {
                let idx = self.rng.gen_range(0..MINIMAL_STRING_ALPHABET.len());
                MINIMAL_STRING_ALPHABET[idx] as char
            })
            .collect()
    }

    /// A random integer in `[1, 10]`, the minimal-primitive default for
    /// `number`.
    pub fn minimal_number(&mut self) -> i64 {
        self.rng.gen_range(1..=10)
    }

    /// In-place Fisher-Yates shuffle.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.rng);
    }

    /// Returns a shuffled copy of `0..n` without materializing a full
    /// permutation vector when the caller only needs a stride: picks a
    /// random start offset and a stride coprime to `n`, so stepping
    /// `(start + i * stride) % n` for `i in 0..n` visits every index exactly
    /// once in a pseudo-random order. Falls back to stride 1 for `n <= 2`
    /// (every stride is trivially coprime there).
    pub fn coprime_stride_order(&mut self, n: usize) -> CoprimeStrideIter {
        if n == 0 {
            return CoprimeStrideIter {
                n,
                start: 0,
                stride: 1,
                i: 0,
            };
        }
        let stride = if n <= 2 {
            1
        } else {
            loop {
                let candidate = self.rng.gen_range(1..n);
                if gcd(candidate, n) == 1 {
                    break candidate;
                }
            }
        };
        CoprimeStrideIter {
            n,
            start: self.rng.gen_range(0..n),
            stride,
            i: 0,
        }
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Iterator produced by [`Random::coprime_stride_order`].
pub struct CoprimeStrideIter {
    n: usize,
    start: usize,
    stride: usize,
    i: usize,
}

impl Iterator for CoprimeStrideIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.i >= self.n {
            return None;
        }
        let idx = (self.start + self.i * self.stride) % self.n;
        self.i += 1;
        Some(idx)
    }
}
