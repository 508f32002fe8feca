// THEORY:
// The `pipeline` module chains the compute stages into one call: flatten the
// raster, whiten the channels, cluster the whitened samples, then recover a
// byte-range color and hex code per cluster. Every run recomputes from
// scratch, so two runs over the same image and seed report the same census.
//
// Naming is deliberately left out of the pipeline. The compute stages are
// synchronous and pure, and frontends layer the network lookups on top of the
// finished census where they can handle outages in their own way.

use crate::core_modules::clustering::{self, ClusterParams};
use crate::core_modules::hex::rgb_to_hex;
use crate::core_modules::recovery::descale_centroid;
use crate::core_modules::sampling;
use crate::core_modules::scaling;
use crate::error::CensusError;
use image::RgbImage;
use palette::Srgb;
use std::path::Path;

pub use crate::core_modules::clustering::{MAX_CLUSTERS, MIN_CLUSTERS};

/// Configuration for the census pipeline, allowing for tunable behavior.
#[derive(Debug, Clone)]
pub struct CensusConfig {
    /// How many dominant colors to report, 2 through 19.
    pub cluster_count: usize,
    /// Iteration cap handed to the clustering backend.
    pub max_iter: usize,
    /// Convergence threshold handed to the clustering backend.
    pub converge: f32,
    /// Clustering restarts; the best-scoring one is kept.
    pub runs: usize,
    /// Fixed clustering seed. `None` draws fresh entropy per run.
    pub seed: Option<u64>,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            cluster_count: 5,
            max_iter: 20,
            converge: 1e-5,
            runs: 20,
            seed: None,
        }
    }
}

/// One dominant color of an analyzed image.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedColor {
    /// Recovered byte-range color.
    pub rgb: Srgb<u8>,
    /// Lowercase `#rrggbb` rendering of `rgb`.
    pub hex: String,
    /// Fraction of the image's pixels in this color's cluster.
    pub share: f32,
}

/// The finished census of one image.
#[derive(Debug, Clone)]
pub struct Census {
    /// Display name of the analyzed file.
    pub file: String,
    pub width: u32,
    pub height: u32,
    /// Dominant colors, largest cluster first.
    pub colors: Vec<DetectedColor>,
}

/// Runs the full dominant-color analysis over images.
pub struct CensusPipeline {
    config: CensusConfig,
}

impl CensusPipeline {
    pub fn new(config: CensusConfig) -> Self {
        Self { config }
    }

    /// Loads an image from disk and analyzes it.
    pub fn analyze_file(&self, path: &Path) -> Result<Census, CensusError> {
        let image = sampling::load_rgb(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.analyze_image(&name, &image)
    }

    /// Analyzes an already-decoded image.
    ///
    /// The census is recomputed from scratch on every call. No state is kept
    /// between runs.
    pub fn analyze_image(&self, name: &str, image: &RgbImage) -> Result<Census, CensusError> {
        // Stage 1: Flatten the raster into row-major samples.
        let samples = sampling::flatten_pixels(image);

        // Stage 2: Whiten each channel by its population deviation.
        let table = scaling::whiten(samples)?;

        // Stage 3: Partition the whitened samples into k clusters.
        let params = ClusterParams {
            max_iter: self.config.max_iter,
            converge: self.config.converge,
            runs: self.config.runs,
            seed: self.config.seed,
        };
        let clusters = clustering::find_clusters(&table, self.config.cluster_count, &params)?;

        // Stage 4: Recover byte-range colors and their hex codes.
        let colors = clusters
            .iter()
            .map(|cluster| {
                let rgb = descale_centroid(&cluster.centroid, &table.stats);
                DetectedColor {
                    rgb,
                    hex: rgb_to_hex(&rgb),
                    share: cluster.share,
                }
            })
            .collect();

        Ok(Census {
            file: name.to_string(),
            width: image.width(),
            height: image.height(),
            colors,
        })
    }
}
