//! RANLUX-class uniform random generator (luxury level 2, `ranlxs2`).
//!
//! Ported bit-for-bit from the reference implementation, which is itself a
//! reimplementation of the GSL `ranlxs2` generator
//! (<http://git.savannah.gnu.org/cgit/gsl.git/tree/rng/ranlxs.c>). Each
//! worker owns one instance, seeded as `base_seed + worker_id`, so a run
//! with a fixed base seed and worker count is bit-reproducible. Calls never
//! block, never allocate, and a generator is never shared across threads —
//! it does not implement `Sync`.

use rand::RngCore;

const LUXURY_LEVEL_2: u32 = 397;

pub struct RandomGenerator {
    xdbl: [f64; 12],
    ydbl: [f64; 12],
    carry: f64,
    xflt: [f32; 24],
    ir: u32,
    jr: u32,
    is: u32,
    is_old: u32,
    pr: u32,
}

impl RandomGenerator {
    pub fn new(seed: i32) -> Self {
        let mut gen = Self {
            xdbl: [0.0; 12],
            ydbl: [0.0; 12],
            carry: 0.0,
            xflt: [0.0; 24],
            ir: 0,
            jr: 7,
            is: 23,
            is_old: 0,
            pr: LUXURY_LEVEL_2,
        };
        gen.set_seed(seed);
        gen
    }

    pub fn set_seed(&mut self, seed: i32) {
        let seed = if seed == 0 { 1 } else { seed };
        let mut i = (seed as u32) & 0x7FFF_FFFF;
        let mut xbit = [0i32; 31];
        for bit in xbit.iter_mut() {
            *bit = (i % 2) as i32;
            i /= 2;
        }

        let mut ibit = 0usize;
        let mut jbit = 18usize;
        for slot in self.xdbl.iter_mut() {
            let mut x = 0.0f64;
            for _ in 0..48 {
                let y = xbit[ibit] as f64;
                x += x + y;
                xbit[ibit] = (xbit[ibit] + xbit[jbit]) % 2;
                ibit = (ibit + 1) % 31;
                jbit = (jbit + 1) % 31;
            }
            *slot = (1.0 / 281_474_976_710_656.0) * x;
        }

        self.carry = 0.0;
        self.ir = 0;
        self.jr = 7;
        self.is = 23;
        self.is_old = 0;
        self.pr = LUXURY_LEVEL_2;
    }

    fn ranlux_step(xdbl: &mut [f64; 12], x1: &mut f64, x2: &mut f64, i1: usize, i2: usize, i3: usize) {
        *x1 = xdbl[i1] - xdbl[i2];
        if *x2 < 0.0 {
            *x1 -= 1.0 / 281_474_976_710_656.0;
            *x2 += 1.0;
        }
        xdbl[i3] = *x2;
    }

    fn increment_state(&mut self) {
        let mut xdbl = self.xdbl;
        let mut carry = self.carry;
        let mut ir = self.ir;
        let mut jr = self.jr;

        let mut k = 0u32;
        while ir > 0 {
            let y1 = xdbl[jr as usize] - xdbl[ir as usize];
            let mut y2 = y1 - carry;
            if y2 < 0.0 {
                carry = 1.0 / 281_474_976_710_656.0;
                y2 += 1.0;
            } else {
                carry = 0.0;
            }
            xdbl[ir as usize] = y2;
            ir = (ir + 1) % 12;
            jr = (jr + 1) % 12;
            k += 1;
        }

        let kmax = self.pr - 12;
        while k <= kmax {
            let mut y1 = xdbl[7] - xdbl[0];
            y1 -= carry;

            let mut y2 = 0.0;
            let mut y3 = 0.0;
            Self::ranlux_step(&mut xdbl, &mut y2, &mut y1, 8, 1, 0);
            Self::ranlux_step(&mut xdbl, &mut y3, &mut y2, 9, 2, 1);
            Self::ranlux_step(&mut xdbl, &mut y1, &mut y3, 10, 3, 2);
            Self::ranlux_step(&mut xdbl, &mut y2, &mut y1, 11, 4, 3);
            Self::ranlux_step(&mut xdbl, &mut y3, &mut y2, 0, 5, 4);
            Self::ranlux_step(&mut xdbl, &mut y1, &mut y3, 1, 6, 5);
            Self::ranlux_step(&mut xdbl, &mut y2, &mut y1, 2, 7, 6);
            Self::ranlux_step(&mut xdbl, &mut y3, &mut y2, 3, 8, 7);
            Self::ranlux_step(&mut xdbl, &mut y1, &mut y3, 4, 9, 8);
            Self::ranlux_step(&mut xdbl, &mut y2, &mut y1, 5, 10, 9);
            Self::ranlux_step(&mut xdbl, &mut y3, &mut y2, 6, 11, 10);

            if y3 < 0.0 {
                carry = 1.0 / 281_474_976_710_656.0;
                y3 += 1.0;
            } else {
                carry = 0.0;
            }
            xdbl[11] = y3;

            k += 12;
        }

        let kmax = self.pr;
        let mut ydbl = self.ydbl;
        while k < kmax {
            let y1 = xdbl[jr as usize] - xdbl[ir as usize];
            let mut y2 = y1 - carry;
            if y2 < 0.0 {
                carry = 1.0 / 281_474_976_710_656.0;
                y2 += 1.0;
            } else {
                carry = 0.0;
            }
            xdbl[ir as usize] = y2;
            ydbl[ir as usize] = y2 + 268_435_456.0;
            ir = (ir + 1) % 12;
            jr = (jr + 1) % 12;
            k += 1;
        }

        ydbl[ir as usize] = xdbl[ir as usize] + 268_435_456.0;
        let mut k2 = (ir + 1) % 12;
        while k2 > 0 {
            ydbl[k2 as usize] = xdbl[k2 as usize] + 268_435_456.0;
            k2 = (k2 + 1) % 12;
        }

        let mut xflt = [0.0f32; 24];
        let mut m = 0usize;
        for k3 in 0..12 {
            let x = xdbl[k3];
            let mut y2 = ydbl[k3] - 268_435_456.0;
            if y2 > x {
                y2 -= 1.0 / 16_777_216.0;
            }
            let y1 = (x - y2) * 16_777_216.0;
            xflt[m] = y1 as f32;
            m += 1;
            xflt[m] = y2 as f32;
            m += 1;
        }

        self.xdbl = xdbl;
        self.ydbl = ydbl;
        self.xflt = xflt;
        self.ir = ir;
        self.is = 2 * ir;
        self.is_old = 2 * ir;
        self.jr = jr;
        self.carry = carry;
    }

    /// Uniform random `f64` in `[0, 1]`. Mutates the internal state.
    pub fn uniform(&mut self) -> f64 {
        self.is = (self.is + 1) % 24;
        if self.is == self.is_old {
            self.increment_state();
        }
        self.xflt[self.is as usize] as f64
    }

    /// Random integer in `[0, 2^24]`.
    pub fn random_integer(&mut self) -> i32 {
        (self.uniform() * 16_777_216.0) as i32
    }
}

impl RngCore for RandomGenerator {
    fn next_u32(&mut self) -> u32 {
        self.random_integer() as u32
    }

    fn next_u64(&mut self) -> u64 {
        ((self.next_u32() as u64) << 32) | self.next_u32() as u64
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core_fill_bytes_via_next(self, dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn rand_core_fill_bytes_via_next(gen: &mut RandomGenerator, dest: &mut [u8]) {
    let mut chunks = dest.chunks_exact_mut(4);
    for chunk in &mut chunks {
        chunk.copy_from_slice(&gen.next_u32().to_le_bytes());
    }
    let rem = chunks.into_remainder();
    if !rem.is_empty() {
        let bytes = gen.next_u32().to_le_bytes();
        rem.copy_from_slice(&bytes[..rem.len()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stays_in_unit_interval() {
        let mut gen = RandomGenerator::new(42);
        for _ in 0..100_000 {
            let u = gen.uniform();
            assert!((0.0..=1.0).contains(&u));
        }
    }

    #[test]
    fn same_seed_reproduces_the_same_stream() {
        let mut a = RandomGenerator::new(1234);
        let mut b = RandomGenerator::new(1234);
        for _ in 0..1000 {
            assert_eq!(a.uniform(), b.uniform());
        }
    }

    #[test]
    fn different_worker_seeds_diverge() {
        let mut a = RandomGenerator::new(1);
        let mut b = RandomGenerator::new(2);
        let seq_a: Vec<f64> = (0..10).map(|_| a.uniform()).collect();
        let seq_b: Vec<f64> = (0..10).map(|_| b.uniform()).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn zero_seed_is_remapped_to_one() {
        let mut a = RandomGenerator::new(0);
        let mut b = RandomGenerator::new(1);
        assert_eq!(a.uniform(), b.uniform());
    }
}
