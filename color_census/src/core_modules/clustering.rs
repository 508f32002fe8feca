// THEORY:
// The `clustering` module finds the k representative points of the whitened
// sample cloud. The iterative refinement itself (k-means++ seeding,
// assignment, centroid recomputation, convergence checks) is delegated
// wholesale to the `kmeans_colors` crate; this module only prepares the
// samples for the library and interprets what comes back.
//
// Key principles:
// 1.  **Unit-range carrier**: the library clusters its own unit-range color
//     type, so the whitened samples are mapped onto it with a single uniform
//     factor. Uniform rescaling preserves k-means partitions exactly, and the
//     returned centroids are mapped back with the inverse factor.
// 2.  **Restarts**: a single k-means run can settle in a poor local optimum,
//     so the library is invoked `runs` times with consecutive seeds and the
//     lowest-scoring run wins. This is the library's own multi-run recipe.
// 3.  **Fresh entropy by default**: every run draws a new base seed, so
//     repeated runs over the same image may place or order clusters
//     differently. Pinning `ClusterParams::seed` makes a run reproducible.
// 4.  **Shares, not just positions**: the assignment indices are folded into a
//     per-cluster fraction of the image, and clusters come back largest first.
// 5.  **Exactly k, even on flat images**: k-means++ seeding stops once every
//     distinct color already is a centroid, so an image with fewer distinct
//     colors than k comes back short. The result is padded with empty
//     zero-share clusters so callers always receive the count they asked for.

use crate::core_modules::scaling::{ScaledPixel, ScaledTable};
use crate::error::CensusError;
use kmeans_colors::get_kmeans;
use palette::Srgb;

/// Smallest selectable cluster count.
pub const MIN_CLUSTERS: usize = 2;
/// Largest selectable cluster count.
pub const MAX_CLUSTERS: usize = 19;

/// Tunables for one clustering run.
#[derive(Debug, Clone)]
pub struct ClusterParams {
    /// Upper bound on refinement iterations per restart.
    pub max_iter: usize,
    /// Convergence threshold on centroid movement, in carrier space.
    pub converge: f32,
    /// How many restarts to attempt; the best-scoring one is kept.
    pub runs: usize,
    /// Fixed base seed for reproducible runs; `None` draws fresh entropy.
    pub seed: Option<u64>,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            max_iter: 20,
            converge: 1e-5,
            runs: 20,
            seed: None,
        }
    }
}

/// One detected cluster: its centroid in whitened space and the fraction of
/// samples assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub centroid: ScaledPixel,
    pub share: f32,
}

/// Runs k-means over a whitened table and returns exactly `k` clusters,
/// sorted by descending share. Images with fewer distinct colors than `k`
/// yield surplus clusters with `share == 0.0`.
pub fn find_clusters(
    table: &ScaledTable,
    k: usize,
    params: &ClusterParams,
) -> Result<Vec<Cluster>, CensusError> {
    if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&k) {
        return Err(CensusError::InvalidClusterCount { requested: k });
    }

    // Whitened channel c spans [0, 255 / sigma_c]; dividing every component
    // by the widest of those spans puts all three inside the carrier's unit
    // range.
    let span = widest_span(table);
    let carrier: Vec<Srgb<f32>> = table
        .scaled
        .iter()
        .map(|pixel| Srgb::new(pixel.red / span, pixel.green / span, pixel.blue / span))
        .collect();

    let seed = params.seed.unwrap_or_else(rand::random);
    let mut run = get_kmeans(k, params.max_iter, params.converge, false, &carrier, seed);
    for restart in 1..params.runs.max(1) {
        let attempt = get_kmeans(
            k,
            params.max_iter,
            params.converge,
            false,
            &carrier,
            seed.wrapping_add(restart as u64),
        );
        if attempt.score < run.score {
            run = attempt;
        }
    }

    let mut counts = vec![0usize; k];
    for &index in &run.indices {
        counts[index as usize] += 1;
    }

    let total = table.scaled.len() as f32;
    let mut clusters: Vec<Cluster> = run
        .centroids
        .iter()
        .zip(counts)
        .map(|(centroid, count)| Cluster {
            centroid: ScaledPixel {
                red: centroid.red * span,
                green: centroid.green * span,
                blue: centroid.blue * span,
            },
            share: count as f32 / total,
        })
        .collect();

    // The library's k-means++ seeding returns min(k, distinct colors)
    // centroids. Pad the shortfall with clusters that hold no samples.
    clusters.resize(
        k,
        Cluster {
            centroid: ScaledPixel {
                red: 0.0,
                green: 0.0,
                blue: 0.0,
            },
            share: 0.0,
        },
    );

    clusters.sort_by(|a, b| b.share.total_cmp(&a.share));
    Ok(clusters)
}

fn widest_span(table: &ScaledTable) -> f32 {
    let narrowest = table.stats.red.min(table.stats.green).min(table.stats.blue);
    255.0 / narrowest
}
