use align_core::OrbConfig;
use crate::detector::FastDetector;
use crate::error::FastResult;

/// Builder for creating a `FastDetector`
#[derive(Debug, Clone)]
pub struct DetectorBuilder {
    config: OrbConfig,
    width: usize,
    height: usize,
}

impl DetectorBuilder {
    /// Create a new builder with default settings
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            config: OrbConfig::default(),
            width,
            height,
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: OrbConfig, width: usize, height: usize) -> Self {
        Self { config, width, height }
    }

    /// Maximum number of keypoints over all pyramid levels
    pub fn max_features(mut self, max_features: usize) -> Self {
        self.config.max_features = max_features;
        self
    }

    /// Set the FAST threshold (1-127)
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Number of pyramid levels and the scale step between them
    pub fn pyramid(mut self, levels: usize, scale_factor: f32) -> Self {
        self.config.pyramid_levels = levels;
        self.config.scale_factor = scale_factor;
        self
    }

    /// Set the patch size for orientation and descriptors
    pub fn patch_size(mut self, patch_size: usize) -> Self {
        self.config.patch_size = patch_size;
        self
    }

    pub fn edge_threshold(mut self, edge_threshold: usize) -> Self {
        self.config.edge_threshold = edge_threshold;
        self
    }

    /// Set the non-maximum suppression (NMS) distance
    pub fn nms_distance(mut self, distance: f32) -> Self {
        self.config.nms_distance = distance;
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.n_threads = n_threads;
        self
    }

    /// Build the `FastDetector`
    pub fn build(self) -> FastResult<FastDetector> {
        FastDetector::new(self.config, self.width, self.height)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        format!(
            "{}x{} image, {} features, {} levels x{:.2}, threshold {}, patch {}",
            self.width,
            self.height,
            self.config.max_features,
            self.config.pyramid_levels,
            self.config.scale_factor,
            self.config.threshold,
            self.config.patch_size
        )
    }

    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}
