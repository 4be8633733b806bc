//! Robust homography estimation and perspective warping.
//!
//! [`GeometricAligner::align`] fits a homography from destination to
//! reference coordinates with RANSAC, keeps the matches that agree with it
//! and resamples the color destination image into the reference frame.

mod error;
mod homography;
mod ransac;
mod warp;

pub use error::AlignError;
pub use homography::{estimate_homography, Homography};
pub use ransac::{Ransac, RansacFit, MIN_SAMPLE};
pub use warp::warp_perspective;

use align_core::{ConfigError, Correspondences, Match, RansacConfig};
use image::RgbImage;

/// Homography and the matches that support it
#[derive(Debug, Clone)]
pub struct Estimate {
    pub homography: Homography,
    /// Inlier flag per input match, in match order
    pub mask: Vec<bool>,
    /// Inlier matches, in their original relative order
    pub inliers: Vec<Match>,
}

/// Output of a full alignment
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Destination resampled into the reference frame
    pub warped: RgbImage,
    pub homography: Homography,
    pub inliers: Vec<Match>,
}

impl Alignment {
    pub fn inlier_count(&self) -> usize {
        self.inliers.len()
    }
}

#[derive(Debug, Clone)]
pub struct GeometricAligner {
    ransac: Ransac,
}

impl GeometricAligner {
    pub fn new(config: RansacConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ransac: Ransac::new(config),
        })
    }

    /// Robust homography from destination points onto reference points
    pub fn estimate(&self, correspondences: &Correspondences) -> Result<Estimate, AlignError> {
        if correspondences.len() < MIN_SAMPLE {
            return Err(AlignError::InsufficientCorrespondences {
                found: correspondences.len(),
                required: MIN_SAMPLE,
            });
        }

        let to_f64 = |pts: Vec<(f32, f32)>| -> Vec<(f64, f64)> {
            pts.into_iter().map(|(x, y)| (x as f64, y as f64)).collect()
        };
        let reference = to_f64(correspondences.reference_points());
        let destination = to_f64(correspondences.destination_points());

        let fit = self.ransac.fit(&destination, &reference)?;
        let inliers = correspondences.select(&fit.mask)?;
        log::info!(
            "homography: {} of {} matches are inliers",
            inliers.len(),
            correspondences.len()
        );

        Ok(Estimate {
            homography: fit.homography,
            mask: fit.mask,
            inliers,
        })
    }

    /// Estimate the homography, then warp `destination` onto a canvas the
    /// size of `reference`
    pub fn align(
        &self,
        reference: &RgbImage,
        destination: &RgbImage,
        correspondences: &Correspondences,
    ) -> Result<Alignment, AlignError> {
        let estimate = self.estimate(correspondences)?;
        let (width, height) = reference.dimensions();
        let warped = warp_perspective(destination, &estimate.homography, width, height)?;

        Ok(Alignment {
            warped,
            homography: estimate.homography,
            inliers: estimate.inliers,
        })
    }
}
