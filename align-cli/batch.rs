use crate::config::{BatchConfig, BatchConfigError, ImagePair, DEFAULT_OUTPUT_SUFFIX};
use crate::diagnostics::{draw_matches, DiagnosticsSink, PairDiagnostics, PREVIEW_SCALE};
use crate::error::PairError;
use crate::report::{BatchReport, PairOutcome, PairReport};
use align_core::{AlignConfig, ConfigError, Correspondences};
use align_geometry::{Alignment, GeometricAligner};
use align_match::FeatureMatcher;
use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// In-memory result of aligning one pair
#[derive(Debug, Clone)]
pub struct PairAlignment {
    pub correspondences: Correspondences,
    pub alignment: Alignment,
}

/// Output file for `destination`: its full file name with `suffix` appended
pub fn output_path(destination: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    destination.with_file_name(name)
}

/// Matcher and aligner shared by every pair of a batch
#[derive(Debug, Clone)]
pub struct BatchAligner {
    matcher: FeatureMatcher,
    aligner: GeometricAligner,
    output_suffix: String,
    parallel: bool,
}

impl BatchAligner {
    pub fn new(config: &BatchConfig) -> Result<Self, BatchConfigError> {
        config.validate()?;
        let aligner = Self::from_align_config(config.align_config())?;
        Ok(Self {
            output_suffix: config.output_suffix.clone(),
            parallel: config.parallel,
            ..aligner
        })
    }

    pub fn from_align_config(config: AlignConfig) -> Result<Self, ConfigError> {
        let aligner = GeometricAligner::new(config.ransac.clone())?;
        let matcher = FeatureMatcher::new(config)?;
        Ok(Self {
            matcher,
            aligner,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            parallel: false,
        })
    }

    pub fn output_suffix(&self) -> &str {
        &self.output_suffix
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Match, estimate and warp two in-memory photos
    pub fn align_images(&self, reference: &DynamicImage, destination: &DynamicImage) -> Result<PairAlignment, PairError> {
        let correspondences = self.matcher.match_images(reference, destination)?;
        let alignment = self
            .aligner
            .align(&reference.to_rgb8(), &destination.to_rgb8(), &correspondences)?;
        Ok(PairAlignment {
            correspondences,
            alignment,
        })
    }

    /// Load, align and save one pair
    pub fn process_pair(&self, pair: &ImagePair, diagnostics: Option<&dyn DiagnosticsSink>) -> Result<PairOutcome, PairError> {
        let reference = load(&pair.reference)?;
        let destination = load(&pair.destination)?;

        let PairAlignment {
            correspondences,
            alignment,
        } = self.align_images(&reference, &destination)?;
        log::info!("{}: homography\n{}", pair.destination.display(), alignment.homography);

        let output = output_path(&pair.destination, &self.output_suffix);
        alignment
            .warped
            .save(&output)
            .map_err(|source| PairError::Save { path: output.clone(), source })?;

        if let Some(sink) = diagnostics {
            notify(sink, pair, &reference.to_rgb8(), &destination.to_rgb8(), &correspondences, &alignment);
        }

        Ok(PairOutcome {
            output,
            raw_matches: correspondences.raw_count(),
            kept_matches: correspondences.len(),
            inliers: alignment.inlier_count(),
            homography: alignment.homography.h,
        })
    }

    /// Align every pair; a failing pair is reported and the batch goes on
    pub fn run(&self, pairs: &[ImagePair], diagnostics: Option<&dyn DiagnosticsSink>) -> BatchReport {
        let process = |pair: &ImagePair| {
            let result = self.process_pair(pair, diagnostics);
            match &result {
                Ok(outcome) => log::info!(
                    "aligned {} -> {} ({} of {} matches are inliers)",
                    pair.destination.display(),
                    outcome.output.display(),
                    outcome.inliers,
                    outcome.kept_matches
                ),
                Err(err) => log::warn!(
                    "failed to align {} onto {}: {}",
                    pair.destination.display(),
                    pair.reference.display(),
                    err
                ),
            }
            PairReport::new(pair, result)
        };

        let reports: Vec<PairReport> = if self.parallel {
            pairs.par_iter().map(process).collect()
        } else {
            pairs.iter().map(process).collect()
        };
        BatchReport { pairs: reports }
    }
}

fn load(path: &Path) -> Result<DynamicImage, PairError> {
    image::open(path).map_err(|source| PairError::Load {
        path: path.to_path_buf(),
        source,
    })
}

fn notify(
    sink: &dyn DiagnosticsSink,
    pair: &ImagePair,
    reference: &RgbImage,
    destination: &RgbImage,
    correspondences: &Correspondences,
    alignment: &Alignment,
) {
    let matches_view = draw_matches(reference, destination, correspondences, &alignment.inliers, PREVIEW_SCALE);
    sink.on_aligned(&PairDiagnostics {
        pair,
        matches_view,
        warped: &alignment.warped,
        homography: &alignment.homography,
        inliers: alignment.inlier_count(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_appends_suffix() {
        assert_eq!(
            output_path(Path::new("/photos/IMG_7400.jpg"), ".new.jpg"),
            PathBuf::from("/photos/IMG_7400.jpg.new.jpg")
        );
        assert_eq!(output_path(Path::new("b.png"), ".aligned.png"), PathBuf::from("b.png.aligned.png"));
    }

    #[test]
    fn test_batch_settings_are_applied() {
        let config = BatchConfig {
            output_suffix: ".out.png".to_string(),
            parallel: true,
            ..BatchConfig::default()
        };
        let aligner = BatchAligner::new(&config).unwrap();
        assert_eq!(aligner.output_suffix(), ".out.png");
        assert!(aligner.is_parallel());

        let config = BatchConfig {
            output_suffix: String::new(),
            ..BatchConfig::default()
        };
        assert!(matches!(BatchAligner::new(&config), Err(BatchConfigError::EmptySuffix)));
    }

    #[test]
    fn test_missing_files_fail_per_pair() {
        let aligner = BatchAligner::from_align_config(AlignConfig::default()).unwrap();
        let pairs = vec![
            ImagePair::new("/nonexistent/a.jpg", "/nonexistent/b.jpg"),
            ImagePair::new("/nonexistent/a.jpg", "/nonexistent/c.jpg"),
        ];
        let report = aligner.run(&pairs, None);
        assert_eq!(report.pairs.len(), 2);
        assert_eq!(report.failed(), 2);
        assert!(report.pairs.iter().all(|p| p.error_kind.as_deref() == Some("load")));
        assert_eq!(report.pairs[1].destination, PathBuf::from("/nonexistent/c.jpg"));
    }
}
