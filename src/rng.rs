//! Small deterministic RNG (LCG). Battle variance and question selection only
//! need uniform picks, and a seedable generator keeps replays and tests exact.

pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Seeds from the platform RNG when the `rng` feature is enabled.
    #[cfg(feature = "rng")]
    pub fn from_entropy() -> Self {
        let mut buf = [0u8; 8];
        if getrandom::getrandom(&mut buf).is_err() {
            return Self::new(0x5EED);
        }
        Self::new(u64::from_le_bytes(buf))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        (self.state >> 32) as u32
    }

    /// Uniform float in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX) * (1.0 - f64::EPSILON)
    }

    pub fn range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive <= 1 {
            return 0;
        }
        (self.next_u32() as usize) % upper_exclusive
    }

    /// Coin flip used by the partial-reading hint.
    pub fn next_bool(&mut self) -> bool {
        self.next_u32() & 1 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_f64_stays_in_unit_interval() {
        let mut rng = SimpleRng::new(42);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "value out of range: {v}");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SimpleRng::new(7);
        let mut b = SimpleRng::new(7);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn range_usize_handles_degenerate_bounds() {
        let mut rng = SimpleRng::new(1);
        assert_eq!(rng.range_usize(0), 0);
        assert_eq!(rng.range_usize(1), 0);
        for _ in 0..100 {
            assert!(rng.range_usize(5) < 5);
        }
    }
}
