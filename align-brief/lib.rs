use align_core::{Descriptor, Image, Keypoint};
use align_fast::Detection;
use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use rayon::prelude::*;

mod pattern;

use pattern::PATTERN;

const DESCRIPTOR_SIZE: usize = 32;

/// Smoothing applied before the binary tests
const SMOOTHING_SIGMA: f32 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum BriefError {
    #[error("Invalid image dimensions: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },
    #[error("Image data length mismatch: expected {expected_len}, got {actual_len}")]
    InvalidImageData { expected_len: usize, actual_len: usize },
}

/// Steered BRIEF over one image (or one pyramid level)
pub struct BriefGenerator {
    w: usize,
    h: usize,
}

impl BriefGenerator {
    pub fn new(width: usize, height: usize) -> Result<Self, BriefError> {
        if width == 0 || height == 0 {
            return Err(BriefError::InvalidImageSize { width, height });
        }
        Ok(Self { w: width, h: height })
    }

    /// One descriptor per keypoint, in keypoint order.
    ///
    /// Keypoint coordinates are pixels of `img`. The image is smoothed once,
    /// then every pair of the pattern is rotated by the keypoint angle and
    /// compared with bilinear sampling.
    pub fn generate_descriptors(&self, img: &Image, kps: &[Keypoint]) -> Result<Vec<Descriptor>, BriefError> {
        if kps.is_empty() {
            return Ok(Vec::new());
        }
        let smoothed = self.smooth(img)?;

        Ok(kps
            .par_iter()
            .map(|kp| self.describe(&smoothed, kp.x, kp.y, kp.angle))
            .collect())
    }

    fn smooth(&self, img: &Image) -> Result<Image, BriefError> {
        let expected_len = self.w * self.h;
        let gray = GrayImage::from_raw(self.w as u32, self.h as u32, img.clone()).ok_or(
            BriefError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            },
        )?;
        Ok(gaussian_blur_f32(&gray, SMOOTHING_SIGMA).into_raw())
    }

    fn describe(&self, img: &Image, cx: f32, cy: f32, angle: f32) -> Descriptor {
        let (s, c) = angle.sin_cos();
        let mut d = [0u8; DESCRIPTOR_SIZE];

        for (i, &(dx1, dy1, dx2, dy2)) in PATTERN.iter().enumerate() {
            let (dx1, dy1, dx2, dy2) = (dx1 as f32, dy1 as f32, dx2 as f32, dy2 as f32);
            let val1 = self.bilinear_sample(img, cx + c * dx1 - s * dy1, cy + s * dx1 + c * dy1);
            let val2 = self.bilinear_sample(img, cx + c * dx2 - s * dy2, cy + s * dx2 + c * dy2);

            let bit = (val1 < val2) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        d
    }

    /// Bilinear interpolation for subpixel sampling
    fn bilinear_sample(&self, img: &Image, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let x1 = x0 + 1.0;
        let y1 = y0 + 1.0;

        // Clamp to image bounds for boundary samples
        if x0 < 0.0 || y0 < 0.0 || x1 >= self.w as f32 || y1 >= self.h as f32 {
            let cx = x.round().clamp(0.0, (self.w - 1) as f32) as usize;
            let cy = y.round().clamp(0.0, (self.h - 1) as f32) as usize;
            return img[cy * self.w + cx] as f32;
        }

        let dx = x - x0;
        let dy = y - y0;

        let x0_idx = x0 as usize;
        let y0_idx = y0 as usize;
        let x1_idx = x1 as usize;
        let y1_idx = y1 as usize;

        let p00 = img[y0_idx * self.w + x0_idx] as f32;
        let p10 = img[y0_idx * self.w + x1_idx] as f32;
        let p01 = img[y1_idx * self.w + x0_idx] as f32;
        let p11 = img[y1_idx * self.w + x1_idx] as f32;

        let top = p00 * (1.0 - dx) + p10 * dx;
        let bottom = p01 * (1.0 - dx) + p11 * dx;

        top * (1.0 - dy) + bottom * dy
    }
}

/// Descriptors for every keypoint of a detection, aligned with
/// `detection.keypoints`.
///
/// Each keypoint is described on the pyramid level it was found on, so the
/// sampling pattern covers the same scene area at every scale.
pub fn describe_detection(detection: &Detection) -> Result<Vec<Descriptor>, BriefError> {
    let mut descriptors = Vec::with_capacity(detection.keypoints.len());

    for level in &detection.levels {
        let scale_level = &level.scale_level;
        let level_kps: Vec<Keypoint> = detection
            .keypoints_at(scale_level.level)
            .iter()
            .map(|kp| Keypoint {
                x: kp.x / scale_level.scale,
                y: kp.y / scale_level.scale,
                ..*kp
            })
            .collect();
        if level_kps.is_empty() {
            continue;
        }

        let generator = BriefGenerator::new(scale_level.width, scale_level.height)?;
        descriptors.extend(generator.generate_descriptors(&level.image, &level_kps)?);
    }

    Ok(descriptors)
}
