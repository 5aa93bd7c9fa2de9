//! Shared image generation and distortion functions for mssim tests.
//!
//! These produce deterministic synthetic greyscale images using an LCG
//! PRNG, ensuring identical test inputs across all platforms.

// ============================================================================
// LCG PRNG
// ============================================================================

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }

    pub fn next_u16(&mut self) -> u16 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFFFF) as u16
    }
}

// ============================================================================
// Image Generation Functions
// ============================================================================

/// Generate uniform greyscale image
pub fn gen_uniform(width: usize, height: usize, value: u8) -> Vec<u8> {
    vec![value; width * height]
}

/// Generate horizontal gradient
pub fn gen_gradient_h(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for _y in 0..height {
        for x in 0..width {
            let val = if width > 1 {
                (x * 255 / (width - 1)) as u8
            } else {
                128
            };
            data.push(val);
        }
    }
    data
}

/// Generate a ramp over the flat pixel index (value proportional to
/// `y * width + x`)
pub fn gen_gradient_flat(width: usize, height: usize) -> Vec<u8> {
    let n = width * height;
    (0..n).map(|i| (i * 255 / (n - 1)) as u8).collect()
}

/// Generate checkerboard pattern
pub fn gen_checkerboard(width: usize, height: usize, block_size: usize, lo: u8, hi: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let checker = ((x / block_size) + (y / block_size)) % 2 == 0;
            data.push(if checker { hi } else { lo });
        }
    }
    data
}

/// Generate seeded random image
pub fn gen_random(width: usize, height: usize, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..width * height).map(|_| rng.next_u8()).collect()
}

/// Generate seeded random 16-bit image
pub fn gen_random_u16(width: usize, height: usize, seed: u64) -> Vec<u16> {
    let mut rng = Lcg::new(seed);
    (0..width * height).map(|_| rng.next_u16()).collect()
}

// ============================================================================
// Distortion Functions
// ============================================================================

/// Add uniform brightness shift
pub fn distort_brightness(img: &[u8], delta: i16) -> Vec<u8> {
    img.iter()
        .map(|&v| (v as i16 + delta).clamp(0, 255) as u8)
        .collect()
}

/// Add per-pixel noise in [-amplitude, amplitude] with fixed seed
pub fn distort_noise(img: &[u8], seed: u64, amplitude: u8) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    let span = 2 * amplitude as i16 + 1;
    img.iter()
        .map(|&v| {
            let noise = rng.next_u8() as i16 % span - amplitude as i16;
            (v as i16 + noise).clamp(0, 255) as u8
        })
        .collect()
}

/// Tonal inverse (255 - v)
pub fn distort_invert(img: &[u8]) -> Vec<u8> {
    img.iter().map(|&v| 255 - v).collect()
}
