//! Deterministic RNG based on splitmix64. All randomness in the generators
//! flows through an explicitly passed source; there is no global state.

pub const SALT_LEFT: u64 = 0x1EF7_B2A4_C0DE_5EED;
pub const SALT_RIGHT: u64 = 0x2B16_47F0_FACE_D00D;

#[inline]
pub fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Sub-seeds for the left and right children of a subdivision node.
#[inline]
pub fn branch_seeds(seed: u64) -> (u64, u64) {
    (splitmix64(seed ^ SALT_LEFT), splitmix64(seed ^ SALT_RIGHT))
}

/// First deviate of a fresh stream on `seed`. This is the displacement
/// factor of the root midpoint under every seed policy.
#[inline]
pub fn deviate_for(seed: u64) -> f64 {
    Rng::new(seed).deviate()
}

/// Anything that can hand out uniform deviates in [-1, 1].
pub trait RandomSource {
    fn deviate(&mut self) -> f64;
}

/// Simple sequential RNG.
#[derive(Clone, Debug)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = splitmix64(self.state);
        self.state
    }

    /// Uniform in [0, 1) with 53 bits of precision.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }
}

impl RandomSource for Rng {
    #[inline]
    fn deviate(&mut self) -> f64 {
        self.range_f64(-1.0, 1.0)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    #[inline]
    fn deviate(&mut self) -> f64 {
        (**self).deviate()
    }
}
