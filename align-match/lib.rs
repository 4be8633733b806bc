//! Feature matching between a reference and a destination photo.
//!
//! Both images are reduced to grayscale and shifted by their own minimum,
//! then described with oriented FAST keypoints and steered BRIEF. Every
//! reference descriptor is paired with its Hamming-nearest destination
//! descriptor; the pairs are sorted by distance and only the best fraction
//! survives.

mod brute_force;
mod error;
mod intensity;

pub use brute_force::match_descriptors;
pub use error::{ImageRole, MatchError};
pub use intensity::{subtract_minimum, to_gray};

use align_brief::describe_detection;
use align_core::{AlignConfig, ConfigError, Correspondences, Descriptor, Keypoint};
use align_fast::FastDetector;
use image::{DynamicImage, GrayImage};

/// Keypoints of one image and their descriptors, index-aligned
#[derive(Debug, Clone)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct FeatureMatcher {
    config: AlignConfig,
}

impl FeatureMatcher {
    pub fn new(config: AlignConfig) -> Result<Self, ConfigError> {
        config.detector.validate()?;
        config.matching.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    /// Match two photos of any pixel format, converted with BT.601 luma
    pub fn match_images(&self, reference: &DynamicImage, destination: &DynamicImage) -> Result<Correspondences, MatchError> {
        self.match_gray(&to_gray(reference), &to_gray(destination))
    }

    /// Detect, describe and match; the result is sorted by distance and
    /// truncated to the configured fraction of the raw match count.
    pub fn match_gray(&self, reference: &GrayImage, destination: &GrayImage) -> Result<Correspondences, MatchError> {
        let reference_features = self.extract(reference, ImageRole::Reference)?;
        let destination_features = self.extract(destination, ImageRole::Destination)?;

        let matches = match_descriptors(&reference_features.descriptors, &destination_features.descriptors);
        let mut correspondences = Correspondences::new(
            reference_features.keypoints,
            destination_features.keypoints,
            matches,
        )?;

        correspondences.retain_best(self.config.matching.retain_fraction);
        log::info!(
            "matches: {} raw, {} kept (fraction {})",
            correspondences.raw_count(),
            correspondences.len(),
            self.config.matching.retain_fraction
        );

        Ok(correspondences)
    }

    /// Keypoints and descriptors of one grayscale image.
    ///
    /// Fails with [`MatchError::NoFeatures`] when the detector finds nothing.
    pub fn extract(&self, gray: &GrayImage, role: ImageRole) -> Result<Features, MatchError> {
        let (shifted, black_level) = subtract_minimum(gray);
        log::debug!("{} image: minimum {}", role, black_level);

        let (width, height) = (shifted.width() as usize, shifted.height() as usize);
        let detector = FastDetector::new(self.config.detector.clone(), width, height)?;
        let detection = detector.detect(&shifted.into_raw())?;
        if detection.keypoints.is_empty() {
            return Err(MatchError::NoFeatures { image: role });
        }

        let descriptors = describe_detection(&detection)?;
        log::debug!("{} image: {} keypoints", role, detection.keypoints.len());

        Ok(Features {
            keypoints: detection.keypoints,
            descriptors,
        })
    }
}
