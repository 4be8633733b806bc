use align_core::{Image, Keypoint, OrbConfig};
use crate::corner_detection::CornerDetector;
use crate::error::{FastError, FastResult};
use crate::pyramid::ImagePyramid;
use crate::refinement::KeypointRefinement;
use crate::types::{Detection, PyramidLevel, ScaleLevel};
use rayon::prelude::*;

/// Multi-scale oriented FAST detector with Harris ranking
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: OrbConfig,
    w: usize,
    h: usize,
    border: usize,
    scale_levels: Vec<ScaleLevel>,
    features_per_level: Vec<usize>,
}

impl FastDetector {
    /// Creates a new FAST detector with validation
    pub fn new(cfg: OrbConfig, width: usize, height: usize) -> FastResult<Self> {
        if width == 0 || height == 0 {
            return Err(FastError::InvalidImageSize { width, height });
        }

        // FAST requires at least 7x7 image (3-pixel border on each side)
        const MIN_SIZE: usize = 7;
        if width < MIN_SIZE || height < MIN_SIZE {
            return Err(FastError::ImageTooSmall {
                width,
                height,
                min_size: MIN_SIZE,
            });
        }

        cfg.validate()?;

        // The orientation disc has to fit inside the detection border
        let border = cfg.edge_threshold.max(cfg.patch_size / 2 + 1).max(3);
        let scale_levels = ImagePyramid::generate_scale_levels(width, height, &cfg, border);
        let features_per_level = cfg.features_per_level();

        Ok(Self {
            cfg,
            w: width,
            h: height,
            border,
            scale_levels,
            features_per_level,
        })
    }

    /// Validates image data before processing
    fn validate_image(&self, img: &Image) -> FastResult<()> {
        let expected_len = self.w * self.h;
        if img.len() != expected_len {
            return Err(FastError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Detect keypoints on every pyramid level.
    ///
    /// Keypoint coordinates are scaled back to the input image; the pyramid
    /// is returned alongside so descriptors can be computed on the level
    /// each keypoint came from.
    pub fn detect(&self, img: &Image) -> FastResult<Detection> {
        self.validate_image(img)?;

        let levels = ImagePyramid::build_image_pyramid(img, self.w, self.h, &self.scale_levels);

        let per_level: Vec<Vec<Keypoint>> = levels
            .par_iter()
            .map(|level| self.detect_at_level(level))
            .collect();

        let keypoints: Vec<Keypoint> = per_level.into_iter().flatten().collect();
        log::debug!(
            "detected {} keypoints over {} pyramid levels ({}x{})",
            keypoints.len(),
            levels.len(),
            self.w,
            self.h
        );

        Ok(Detection { keypoints, levels })
    }

    /// Convenience wrapper returning only the keypoints
    pub fn detect_keypoints(&self, img: &Image) -> FastResult<Vec<Keypoint>> {
        Ok(self.detect(img)?.keypoints)
    }

    /// FAST, NMS, Harris ranking and orientation on one level
    fn detect_at_level(&self, level: &PyramidLevel) -> Vec<Keypoint> {
        let scale_level = &level.scale_level;
        let quota = self.features_per_level.get(scale_level.level).copied().unwrap_or(0);
        if quota == 0 {
            return Vec::new();
        }

        let candidates = CornerDetector::detect_keypoints_at_scale(
            &level.image,
            scale_level,
            self.cfg.threshold,
            self.border,
        );
        let suppressed = KeypointRefinement::non_maximum_suppression(&candidates, self.cfg.nms_distance);

        let mut keypoints: Vec<Keypoint> = suppressed
            .into_iter()
            .map(|sk| {
                let mut kp = sk.keypoint;
                kp.response = CornerDetector::compute_harris_response(
                    &level.image,
                    scale_level.width,
                    scale_level.height,
                    kp.x as usize,
                    kp.y as usize,
                );
                kp
            })
            .collect();

        KeypointRefinement::retain_best(&mut keypoints, quota);

        for kp in keypoints.iter_mut() {
            kp.angle = KeypointRefinement::compute_orientation(
                &level.image,
                scale_level.width,
                scale_level.height,
                kp.x,
                kp.y,
                self.cfg.patch_size,
            );
            kp.x *= scale_level.scale;
            kp.y *= scale_level.scale;
            kp.size = self.cfg.patch_size as f32 * scale_level.scale;
        }

        keypoints
    }

    /// Get scale levels for this detector
    pub fn scale_levels(&self) -> &[ScaleLevel] {
        &self.scale_levels
    }

    /// Get detector configuration
    pub fn config(&self) -> &OrbConfig {
        &self.cfg
    }

    /// Get image dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    /// Pixels skipped on each side of every level
    pub fn border(&self) -> usize {
        self.border
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use align_core::ConfigError;

    fn create_test_config() -> OrbConfig {
        OrbConfig {
            n_threads: 1,
            ..OrbConfig::default()
        }
    }

    fn create_small_test_config() -> OrbConfig {
        OrbConfig {
            patch_size: 7,
            edge_threshold: 4,
            pyramid_levels: 1,
            n_threads: 1,
            ..OrbConfig::default()
        }
    }

    /// Grid of bright squares on a dark background
    fn create_checker_image(width: usize, height: usize, cell: usize) -> Image {
        let mut img = vec![40u8; width * height];
        for y in 0..height {
            for x in 0..width {
                if (x / cell + y / cell) % 2 == 0 && (x / cell) % 3 != 2 {
                    img[y * width + x] = 210;
                }
            }
        }
        img
    }

    #[test]
    fn test_valid_constructor() {
        assert!(FastDetector::new(create_test_config(), 100, 100).is_ok());
    }

    #[test]
    fn test_invalid_dimensions() {
        let result = FastDetector::new(create_test_config(), 0, 100);
        assert!(matches!(result, Err(FastError::InvalidImageSize { .. })));

        let result = FastDetector::new(create_test_config(), 100, 0);
        assert!(matches!(result, Err(FastError::InvalidImageSize { .. })));
    }

    #[test]
    fn test_too_small_image() {
        let result = FastDetector::new(create_test_config(), 6, 6);
        assert!(matches!(result, Err(FastError::ImageTooSmall { .. })));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut cfg = create_test_config();
        cfg.threshold = 0;
        let result = FastDetector::new(cfg, 100, 100);
        assert!(matches!(result, Err(FastError::Config(ConfigError::InvalidThreshold(0)))));

        let mut cfg = create_test_config();
        cfg.patch_size = 16;
        let result = FastDetector::new(cfg, 100, 100);
        assert!(matches!(result, Err(FastError::Config(ConfigError::InvalidPatchSize(16)))));
    }

    #[test]
    fn test_invalid_image_data() {
        let detector = FastDetector::new(create_small_test_config(), 10, 10).unwrap();
        let img = vec![0; 50];
        let result = detector.detect(&img);
        assert!(matches!(result, Err(FastError::InvalidImageData { expected_len: 100, actual_len: 50 })));
    }

    #[test]
    fn test_uniform_image_has_no_keypoints() {
        let detector = FastDetector::new(create_test_config(), 200, 200).unwrap();
        let img = vec![128; 200 * 200];
        let detection = detector.detect(&img).unwrap();
        assert!(detection.keypoints.is_empty());
        assert_eq!(detection.levels.len(), detector.scale_levels().len());
    }

    #[test]
    fn test_image_smaller_than_border_has_no_levels() {
        let detector = FastDetector::new(create_test_config(), 40, 40).unwrap();
        assert!(detector.scale_levels().is_empty());
        let detection = detector.detect(&create_checker_image(40, 40, 8)).unwrap();
        assert!(detection.keypoints.is_empty());
    }

    #[test]
    fn test_keypoints_cover_levels_in_order() {
        let detector = FastDetector::new(create_test_config(), 320, 240).unwrap();
        let img = create_checker_image(320, 240, 12);
        let detection = detector.detect(&img).unwrap();

        assert!(!detection.keypoints.is_empty());
        assert!(detection.keypoints.windows(2).all(|w| w[0].octave <= w[1].octave));
        assert!(detection.keypoints.iter().any(|k| k.octave > 0));

        let total: usize = (0..detection.levels.len()).map(|l| detection.keypoints_at(l).len()).sum();
        assert_eq!(total, detection.keypoints.len());

        for kp in &detection.keypoints {
            assert!(kp.x >= 0.0 && kp.x < 320.0);
            assert!(kp.y >= 0.0 && kp.y < 240.0);
            assert!(kp.angle.is_finite());
            let scale = detection.levels[kp.octave].scale_level.scale;
            assert!((kp.size - 31.0 * scale).abs() < 1e-3);
        }
    }

    #[test]
    fn test_feature_cap_is_respected() {
        let cfg = OrbConfig {
            max_features: 40,
            ..create_test_config()
        };
        let detector = FastDetector::new(cfg, 320, 240).unwrap();
        let img = create_checker_image(320, 240, 6);
        let keypoints = detector.detect_keypoints(&img).unwrap();
        assert!(!keypoints.is_empty());
        assert!(keypoints.len() <= 40);
    }

    #[test]
    fn test_parallel_detection_is_deterministic() {
        let detector = FastDetector::new(create_test_config(), 160, 120).unwrap();
        let img = create_checker_image(160, 120, 10);
        let first = detector.detect_keypoints(&img).unwrap();
        for _ in 0..5 {
            assert_eq!(detector.detect_keypoints(&img).unwrap(), first);
        }
    }

    #[test]
    fn test_configuration_access() {
        let cfg = create_test_config();
        let detector = FastDetector::new(cfg.clone(), 120, 90).unwrap();
        assert_eq!(detector.config(), &cfg);
        assert_eq!(detector.dimensions(), (120, 90));
        assert_eq!(detector.border(), 31);
    }
}
