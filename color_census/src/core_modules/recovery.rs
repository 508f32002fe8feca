// THEORY:
// The `recovery` module undoes the whitening for the centroids the clustering
// stage found. A centroid lives in scaled space, so multiplying each component
// by the deviation recorded for its channel moves it back to the plain 0-255
// value range. The float result is truncated toward zero rather than rounded,
// then clamped to byte range so a centroid that drifted slightly outside the
// range of real samples cannot wrap around.

use crate::core_modules::scaling::{ChannelStats, ScaledPixel};
use palette::Srgb;

/// De-scales one component back to the 0-255 value range.
pub fn descale_channel(scaled: f32, sigma: f32) -> f32 {
    scaled * sigma
}

/// Truncates a de-scaled component toward zero and clamps it to byte range.
pub fn to_byte(value: f32) -> u8 {
    (value as i64).clamp(0, 255) as u8
}

/// Recovers the approximate RGB color of a whitened centroid.
pub fn descale_centroid(centroid: &ScaledPixel, stats: &ChannelStats) -> Srgb<u8> {
    Srgb::new(
        to_byte(descale_channel(centroid.red, stats.red)),
        to_byte(descale_channel(centroid.green, stats.green)),
        to_byte(descale_channel(centroid.blue, stats.blue)),
    )
}
