use align_core::{AlignConfig, ConfigError, MatchConfig, OrbConfig, RansacConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix appended to the destination file name for the aligned output
pub const DEFAULT_OUTPUT_SUFFIX: &str = ".new.jpg";

/// A destination photo to be aligned onto a reference photo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePair {
    pub reference: PathBuf,
    pub destination: PathBuf,
}

impl ImagePair {
    pub fn new(reference: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            reference: reference.into(),
            destination: destination.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchConfigError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("output suffix must not be empty (it would overwrite the destination)")]
    EmptySuffix,
}

/// Everything a batch run needs: alignment parameters, output naming and
/// the list of pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub output_suffix: String,
    /// Process pairs concurrently
    pub parallel: bool,
    pub detector: OrbConfig,
    pub matching: MatchConfig,
    pub ransac: RansacConfig,
    pub pairs: Vec<ImagePair>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            parallel: false,
            detector: OrbConfig::default(),
            matching: MatchConfig::default(),
            ransac: RansacConfig::default(),
            pairs: Vec::new(),
        }
    }
}

impl BatchConfig {
    pub fn align_config(&self) -> AlignConfig {
        AlignConfig {
            detector: self.detector.clone(),
            matching: self.matching.clone(),
            ransac: self.ransac.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), BatchConfigError> {
        self.align_config().validate()?;
        if self.output_suffix.is_empty() {
            return Err(BatchConfigError::EmptySuffix);
        }
        Ok(())
    }

    /// Pairs sharing one reference, as in a bracketed sequence
    pub fn add_destinations<I, P>(&mut self, reference: &Path, destinations: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.pairs
            .extend(destinations.into_iter().map(|d| ImagePair::new(reference, d)));
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, BatchConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, BatchConfigError> {
        Ok(toml::to_string_pretty(self).map_err(ConfigError::from)?)
    }

    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self, BatchConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_toml(&content)
    }

    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), BatchConfigError> {
        std::fs::write(path, self.to_toml()?).map_err(ConfigError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = BatchConfig::default();
        assert_eq!(cfg.output_suffix, ".new.jpg");
        assert!(!cfg.parallel);
        assert!(cfg.pairs.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_pairs_from_toml() {
        let cfg = BatchConfig::from_toml(
            r#"
output_suffix = ".aligned.png"

[detector]
max_features = 2000

[[pairs]]
reference = "shots/IMG_7399.jpg"
destination = "shots/IMG_7400.jpg"

[[pairs]]
reference = "shots/IMG_7399.jpg"
destination = "shots/IMG_7401.jpg"
"#,
        )
        .unwrap();

        assert_eq!(cfg.output_suffix, ".aligned.png");
        assert_eq!(cfg.detector.max_features, 2000);
        assert_eq!(cfg.matching.retain_fraction, 0.2);
        assert_eq!(cfg.pairs.len(), 2);
        assert_eq!(cfg.pairs[1], ImagePair::new("shots/IMG_7399.jpg", "shots/IMG_7401.jpg"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            BatchConfig::from_toml("output_suffix = \"\"\n"),
            Err(BatchConfigError::EmptySuffix)
        ));
        assert!(matches!(
            BatchConfig::from_toml("[ransac]\nreprojection_threshold = -1.0\n"),
            Err(BatchConfigError::Config(ConfigError::InvalidReprojectionThreshold(_)))
        ));
        assert!(matches!(
            BatchConfig::from_toml("pairs = 3\n"),
            Err(BatchConfigError::Config(ConfigError::TomlDecode(_)))
        ));
    }

    #[test]
    fn test_shared_reference() {
        let mut cfg = BatchConfig::default();
        cfg.add_destinations(Path::new("ref.jpg"), ["a.jpg", "b.jpg"]);
        assert_eq!(cfg.pairs, vec![ImagePair::new("ref.jpg", "a.jpg"), ImagePair::new("ref.jpg", "b.jpg")]);
    }

    #[test]
    fn test_toml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.toml");
        let mut cfg = BatchConfig { parallel: true, ..BatchConfig::default() };
        cfg.add_destinations(Path::new("ref.jpg"), ["a.jpg"]);
        cfg.save_toml(&path).unwrap();
        let loaded = BatchConfig::load_toml(&path).unwrap();
        assert_eq!(loaded, cfg);
    }
}
