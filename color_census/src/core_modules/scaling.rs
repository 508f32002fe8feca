// THEORY:
// The `scaling` module implements the whitening stage. K-means measures plain
// euclidean distance, so a channel with a wide spread would dominate a channel
// with a narrow one. Dividing every channel by its own standard deviation puts
// the three channels on comparable footing before clustering.
//
// Key principles:
// 1.  **Population deviation**: the divisor is the mean-free standard
//     deviation over all samples (divisor N). The recovery stage multiplies by
//     the very same recorded value, so the two directions always agree.
// 2.  **Per-channel independence**: each channel is scaled by its own
//     deviation only; channels never mix.
// 3.  **Degenerate inputs are rejected**: a zero-variance channel would divide
//     by zero, and an empty sample set has no deviation at all. Both are
//     reported as typed errors instead of leaking NaN samples downstream.

use crate::error::CensusError;
use palette::Srgb;

/// Per-channel population standard deviations, retained for de-scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl ChannelStats {
    /// Measures the population standard deviation of each channel.
    /// The sample set must not be empty.
    pub fn measure(samples: &[Srgb<u8>]) -> ChannelStats {
        let count = samples.len() as f64;

        let mut sums = [0.0f64; 3];
        for sample in samples {
            sums[0] += f64::from(sample.red);
            sums[1] += f64::from(sample.green);
            sums[2] += f64::from(sample.blue);
        }
        let means = [sums[0] / count, sums[1] / count, sums[2] / count];

        let mut squares = [0.0f64; 3];
        for sample in samples {
            squares[0] += (f64::from(sample.red) - means[0]).powi(2);
            squares[1] += (f64::from(sample.green) - means[1]).powi(2);
            squares[2] += (f64::from(sample.blue) - means[2]).powi(2);
        }

        ChannelStats {
            red: (squares[0] / count).sqrt() as f32,
            green: (squares[1] / count).sqrt() as f32,
            blue: (squares[2] / count).sqrt() as f32,
        }
    }
}

/// One whitened sample: each channel value divided by that channel's deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledPixel {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

/// The scaled feature table: the original samples, their whitened
/// counterparts, and the deviations linking the two spaces.
#[derive(Debug, Clone)]
pub struct ScaledTable {
    pub samples: Vec<Srgb<u8>>,
    pub scaled: Vec<ScaledPixel>,
    pub stats: ChannelStats,
}

/// Whitens a flat sample sequence, or rejects it as degenerate.
pub fn whiten(samples: Vec<Srgb<u8>>) -> Result<ScaledTable, CensusError> {
    if samples.is_empty() {
        return Err(CensusError::EmptyImage);
    }

    let stats = ChannelStats::measure(&samples);
    for (channel, sigma) in [
        ("red", stats.red),
        ("green", stats.green),
        ("blue", stats.blue),
    ] {
        if sigma == 0.0 {
            return Err(CensusError::DegenerateImage { channel });
        }
    }

    let scaled = samples
        .iter()
        .map(|sample| ScaledPixel {
            red: f32::from(sample.red) / stats.red,
            green: f32::from(sample.green) / stats.green,
            blue: f32::from(sample.blue) / stats.blue,
        })
        .collect();

    Ok(ScaledTable {
        samples,
        scaled,
        stats,
    })
}
