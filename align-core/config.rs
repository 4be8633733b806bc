#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid FAST threshold: {0} (must be 1-127)")]
    InvalidThreshold(u8),
    #[error("invalid patch size: {0} (must be odd and at least 7)")]
    InvalidPatchSize(usize),
    #[error("invalid pyramid: {levels} levels with scale factor {scale_factor}")]
    InvalidPyramid { levels: usize, scale_factor: f32 },
    #[error("max_features must be at least 1")]
    InvalidFeatureCap,
    #[error("retain fraction {0} outside (0, 1]")]
    InvalidRetainFraction(f32),
    #[error("reprojection threshold {0} must be positive")]
    InvalidReprojectionThreshold(f64),
    #[error("RANSAC confidence {0} outside (0, 1)")]
    InvalidConfidence(f64),
    #[error("RANSAC needs at least one iteration")]
    InvalidIterations,
    #[error("invalid thread count: 0")]
    InvalidThreads,
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "serde")]
    #[error("TOML decode failed: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[cfg(feature = "serde")]
    #[error("TOML encode failed: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[cfg(feature = "serde")]
    #[error("JSON failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Oriented FAST / rotated BRIEF detector settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbConfig {
    /// Upper bound on keypoints kept per image
    pub max_features: usize,
    pub threshold: u8,
    pub pyramid_levels: usize,
    pub scale_factor: f32,
    pub patch_size: usize,
    /// Border (in level pixels) where no keypoint is detected
    pub edge_threshold: usize,
    pub nms_distance: f32,
    pub n_threads: usize,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            threshold: 20,
            pyramid_levels: 8,
            scale_factor: 1.2,
            patch_size: 31,
            edge_threshold: 31,
            nms_distance: 3.0,
            n_threads: num_cpus::get().max(1),
        }
    }
}

impl OrbConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threshold == 0 || self.threshold > 127 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        if self.patch_size % 2 == 0 || self.patch_size < 7 {
            return Err(ConfigError::InvalidPatchSize(self.patch_size));
        }
        if self.pyramid_levels == 0 || !(self.scale_factor > 1.0) {
            return Err(ConfigError::InvalidPyramid {
                levels: self.pyramid_levels,
                scale_factor: self.scale_factor,
            });
        }
        if self.max_features == 0 {
            return Err(ConfigError::InvalidFeatureCap);
        }
        if self.n_threads == 0 {
            return Err(ConfigError::InvalidThreads);
        }
        Ok(())
    }

    /// Share of `max_features` assigned to each pyramid level.
    ///
    /// Level `i` gets a share proportional to `(1/scale_factor)^i`; the last
    /// level takes whatever the rounding left over.
    pub fn features_per_level(&self) -> Vec<usize> {
        let levels = self.pyramid_levels;
        let factor = 1.0 / self.scale_factor as f64;
        let mut desired = self.max_features as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));

        let mut shares = Vec::with_capacity(levels);
        let mut assigned = 0usize;
        for _ in 0..levels.saturating_sub(1) {
            let n = desired.round() as usize;
            shares.push(n);
            assigned += n;
            desired *= factor;
        }
        shares.push(self.max_features.saturating_sub(assigned));
        shares
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchConfig {
    /// Fraction of the raw matches kept after sorting by distance
    pub retain_fraction: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { retain_fraction: 0.2 }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.retain_fraction > 0.0 && self.retain_fraction <= 1.0) {
            return Err(ConfigError::InvalidRetainFraction(self.retain_fraction));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RansacConfig {
    /// Maximum distance in pixels between a projected point and its match
    pub reprojection_threshold: f64,
    pub max_iterations: usize,
    pub confidence: f64,
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            reprojection_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            seed: 0,
        }
    }
}

impl RansacConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.reprojection_threshold > 0.0) {
            return Err(ConfigError::InvalidReprojectionThreshold(self.reprojection_threshold));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ConfigError::InvalidConfidence(self.confidence));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidIterations);
        }
        Ok(())
    }
}

/// Complete alignment configuration
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AlignConfig {
    pub detector: OrbConfig,
    pub matching: MatchConfig,
    pub ransac: RansacConfig,
}

impl AlignConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        self.matching.validate()?;
        self.ransac.validate()
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "AlignConfig: max_features={}, threshold={}, levels={}x{:.2}, retain={:.2}, reproj={:.1}px, iters<={}",
            self.detector.max_features,
            self.detector.threshold,
            self.detector.pyramid_levels,
            self.detector.scale_factor,
            self.matching.retain_fraction,
            self.ransac.reprojection_threshold,
            self.ransac.max_iterations,
        )
    }

    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AlignConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.detector.max_features, 5000);
        assert_eq!(cfg.matching.retain_fraction, 0.2);
        assert_eq!(cfg.ransac.reprojection_threshold, 3.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut cfg = AlignConfig::default();
        cfg.detector.threshold = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidThreshold(0))));

        let mut cfg = AlignConfig::default();
        cfg.detector.patch_size = 16;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidPatchSize(16))));

        let mut cfg = AlignConfig::default();
        cfg.detector.scale_factor = 1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidPyramid { .. })));

        let mut cfg = AlignConfig::default();
        cfg.matching.retain_fraction = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidRetainFraction(_))));

        let mut cfg = AlignConfig::default();
        cfg.matching.retain_fraction = f32::NAN;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidRetainFraction(_))));

        let mut cfg = AlignConfig::default();
        cfg.ransac.confidence = 1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidConfidence(_))));
    }

    #[test]
    fn test_features_per_level_sums_to_cap() {
        let cfg = OrbConfig::default();
        let shares = cfg.features_per_level();
        assert_eq!(shares.len(), 8);
        assert_eq!(shares.iter().sum::<usize>(), 5000);
        // finer levels get the larger share
        assert!(shares[0] > shares[1]);
        assert!(shares[1] > shares[6]);
    }

    #[test]
    fn test_single_level_takes_everything() {
        let cfg = OrbConfig {
            pyramid_levels: 1,
            max_features: 300,
            ..OrbConfig::default()
        };
        assert_eq!(cfg.features_per_level(), vec![300]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg = AlignConfig::from_toml(
            "[detector]\nmax_features = 1200\n\n[matching]\nretain_fraction = 0.5\n",
        )
        .unwrap();
        assert_eq!(cfg.detector.max_features, 1200);
        assert_eq!(cfg.detector.threshold, 20);
        assert_eq!(cfg.matching.retain_fraction, 0.5);
        assert_eq!(cfg.ransac, RansacConfig::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_round_trip() {
        let mut cfg = AlignConfig::default();
        cfg.detector.max_features = 800;
        cfg.matching.retain_fraction = 0.25;
        cfg.ransac.reprojection_threshold = 2.5;
        cfg.ransac.seed = 7;

        let parsed = AlignConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(parsed, cfg);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("align.json");
        cfg.save_json(&path).unwrap();
        assert_eq!(AlignConfig::load_json(&path).unwrap(), cfg);

        let invalid = r#"{"ransac": {"reprojection_threshold": -1.0}}"#;
        assert!(matches!(
            AlignConfig::from_json(invalid),
            Err(ConfigError::InvalidReprojectionThreshold(_))
        ));
        assert!(AlignConfig::load_json(dir.path().join("missing.json")).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_invalid_toml_fails_validation() {
        let result = AlignConfig::from_toml("[matching]\nretain_fraction = 1.5\n");
        assert!(matches!(result, Err(ConfigError::InvalidRetainFraction(_))));
    }
}
