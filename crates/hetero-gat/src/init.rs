//! Parameter initializers.
//!
//! Glorot draws take an explicit RNG so a seeded `ChaCha8Rng` makes the
//! whole reset deterministic; the fan pair comes from the last two dims of
//! the tensor view being initialized (weight chunks are viewed as
//! `(heads * out_channels, in_channels)`, attention vectors as
//! `(2, heads, out_channels)`).

use rand::Rng;

/// Variance-scaling ("Glorot") uniform samples:
/// `U(-sqrt(6 / (fan_in + fan_out)), +sqrt(6 / (fan_in + fan_out)))`.
pub fn glorot<R: Rng>(rng: &mut R, fan_out: usize, fan_in: usize, n: usize) -> Vec<f32> {
    let limit = (6.0f32 / (fan_out + fan_in) as f32).sqrt();
    (0..n).map(|_| rng.gen_range(-limit..limit)).collect()
}

/// All-zero buffer, used for bias vectors.
#[must_use]
pub fn zeros(n: usize) -> Vec<f32> {
    vec![0.0; n]
}
