use align_core::{Image, Keypoint};
use crate::types::{CornerType, ScaleLevel, ScoredKeypoint};
use crate::utils::has_contiguous_arc;
use rayon::prelude::*;

/// Contiguous circle pixels required by the FAST-9 segment test
const ARC_LENGTH: usize = 9;

/// Corner detection algorithms (FAST and Harris)
pub struct CornerDetector;

impl CornerDetector {
    /// FAST circle offsets (Bresenham circle of radius 3), clockwise from the top
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Detect FAST-9 corners on one pyramid level, skipping `border` pixels
    /// on every side. Coordinates are level pixels.
    pub fn detect_keypoints_at_scale(
        img: &Image,
        scale_level: &ScaleLevel,
        threshold: u8,
        border: usize,
    ) -> Vec<ScoredKeypoint> {
        let width = scale_level.width;
        let height = scale_level.height;
        let border = border.max(3);
        if width <= 2 * border || height <= 2 * border {
            return Vec::new();
        }

        (border..height - border)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row_keypoints = Vec::new();
                for x in border..width - border {
                    let center_pixel = img[y * width + x];
                    if Self::classify(img, width, x, y, center_pixel, threshold) == CornerType::None {
                        continue;
                    }

                    let response = Self::compute_intensity_response(img, width, x, y, center_pixel, threshold);
                    row_keypoints.push(ScoredKeypoint {
                        keypoint: Keypoint {
                            x: x as f32,
                            y: y as f32,
                            angle: 0.0,
                            octave: scale_level.level,
                            size: 0.0,
                            response: 0.0,
                        },
                        response,
                    });
                }
                row_keypoints
            })
            .collect()
    }

    /// FAST-9 segment test
    pub(crate) fn classify(img: &Image, width: usize, x: usize, y: usize, center_pixel: u8, threshold: u8) -> CornerType {
        let bright_limit = center_pixel as i32 + threshold as i32;
        let dark_limit = center_pixel as i32 - threshold as i32;

        // Quick rejection on the four compass pixels: a 9-arc always covers
        // at least two of them.
        let compass = [0usize, 4, 8, 12].map(|i| Self::circle_pixel(img, width, x, y, i));
        let bright_compass = compass.iter().filter(|&&p| p > bright_limit).count();
        let dark_compass = compass.iter().filter(|&&p| p < dark_limit).count();
        if bright_compass < 2 && dark_compass < 2 {
            return CornerType::None;
        }

        let mut bright_mask = 0u16;
        let mut dark_mask = 0u16;
        for i in 0..16 {
            let pixel = Self::circle_pixel(img, width, x, y, i);
            if pixel > bright_limit {
                bright_mask |= 1 << i;
            } else if pixel < dark_limit {
                dark_mask |= 1 << i;
            }
        }

        if has_contiguous_arc(bright_mask, ARC_LENGTH) {
            CornerType::Bright
        } else if has_contiguous_arc(dark_mask, ARC_LENGTH) {
            CornerType::Dark
        } else {
            CornerType::None
        }
    }

    #[inline]
    fn circle_pixel(img: &Image, width: usize, x: usize, y: usize, i: usize) -> i32 {
        let (dx, dy) = Self::FAST_OFFSETS[i];
        let px = (x as i32 + dx) as usize;
        let py = (y as i32 + dy) as usize;
        img[py * width + px] as i32
    }

    /// Mean squared difference of the circle pixels that pass the threshold
    fn compute_intensity_response(img: &Image, width: usize, x: usize, y: usize, center_pixel: u8, threshold: u8) -> f32 {
        let center = center_pixel as f32;
        let mut sum_diff = 0.0f32;
        let mut count = 0;

        for i in 0..16 {
            let diff = (center - Self::circle_pixel(img, width, x, y, i) as f32).abs();
            if diff > threshold as f32 {
                sum_diff += diff * diff;
                count += 1;
            }
        }

        if count > 0 {
            sum_diff / count as f32
        } else {
            0.0
        }
    }

    /// Harris corner response over a 7x7 window of Sobel gradients
    pub fn compute_harris_response(img: &Image, width: usize, height: usize, x: usize, y: usize) -> f32 {
        const RADIUS: usize = 3;
        if x < RADIUS + 1 || y < RADIUS + 1 || x + RADIUS + 1 >= width || y + RADIUS + 1 >= height {
            return 0.0;
        }

        let mut ixx = 0.0f64;
        let mut ixy = 0.0f64;
        let mut iyy = 0.0f64;

        for ny in y - RADIUS..=y + RADIUS {
            for nx in x - RADIUS..=x + RADIUS {
                let (gx, gy) = Self::compute_gradients(img, width, nx, ny);
                ixx += (gx * gx) as f64;
                ixy += (gx * gy) as f64;
                iyy += (gy * gy) as f64;
            }
        }

        // det(M) - k * trace(M)^2
        let k = 0.04f64;
        let det = ixx * iyy - ixy * ixy;
        let trace = ixx + iyy;
        (det - k * trace * trace) as f32
    }

    /// Sobel gradients; caller guarantees a one-pixel margin
    fn compute_gradients(img: &Image, width: usize, x: usize, y: usize) -> (f32, f32) {
        let at = |xx: usize, yy: usize| img[yy * width + xx] as f32;

        let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
            - at(x - 1, y - 1) - 2.0 * at(x - 1, y) - at(x - 1, y + 1);
        let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
            - at(x - 1, y - 1) - 2.0 * at(x, y - 1) - at(x + 1, y - 1);

        (gx / 8.0, gy / 8.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(width: usize, height: usize) -> ScaleLevel {
        ScaleLevel { level: 0, scale: 1.0, width, height }
    }

    fn square_image(width: usize, height: usize) -> Image {
        let mut img = vec![50u8; width * height];
        for y in 20..30 {
            for x in 20..30 {
                img[y * width + x] = 200;
            }
        }
        img
    }

    #[test]
    fn test_uniform_image_has_no_corners() {
        let img = vec![128u8; 50 * 50];
        let kps = CornerDetector::detect_keypoints_at_scale(&img, &level(50, 50), 20, 3);
        assert!(kps.is_empty());
    }

    #[test]
    fn test_square_corners_are_detected() {
        let img = square_image(50, 50);
        let kps = CornerDetector::detect_keypoints_at_scale(&img, &level(50, 50), 20, 3);
        assert!(!kps.is_empty());
        for corner in [(20.0, 20.0), (29.0, 20.0), (20.0, 29.0), (29.0, 29.0)] {
            assert!(
                kps.iter().any(|k| (k.keypoint.x - corner.0).abs() <= 2.0 && (k.keypoint.y - corner.1).abs() <= 2.0),
                "no keypoint near {:?}",
                corner
            );
        }
        assert!(kps.iter().all(|k| k.response > 0.0 && k.response.is_finite()));
    }

    #[test]
    fn test_border_is_respected() {
        let img = square_image(50, 50);
        let kps = CornerDetector::detect_keypoints_at_scale(&img, &level(50, 50), 20, 22);
        for k in &kps {
            assert!(k.keypoint.x >= 22.0 && k.keypoint.x < 28.0);
            assert!(k.keypoint.y >= 22.0 && k.keypoint.y < 28.0);
        }
        assert!(CornerDetector::detect_keypoints_at_scale(&img, &level(50, 50), 20, 25).is_empty());
    }

    #[test]
    fn test_classify_dark_square_corner() {
        let mut img = vec![200u8; 50 * 50];
        for y in 20..30 {
            for x in 20..30 {
                img[y * 50 + x] = 40;
            }
        }
        // surrounded by brighter pixels on a 9+ arc
        assert_eq!(CornerDetector::classify(&img, 50, 20, 20, 40, 20), CornerType::Bright);
        assert_eq!(CornerDetector::classify(&square_image(50, 50), 50, 20, 20, 200, 20), CornerType::Dark);
        assert_eq!(CornerDetector::classify(&img, 50, 25, 25, 40, 20), CornerType::None);
    }

    #[test]
    fn test_harris_prefers_corners_over_edges() {
        let img = square_image(50, 50);
        let corner = CornerDetector::compute_harris_response(&img, 50, 50, 20, 20);
        let edge = CornerDetector::compute_harris_response(&img, 50, 50, 25, 20);
        let flat = CornerDetector::compute_harris_response(&img, 50, 50, 10, 10);
        assert!(corner > edge);
        assert!(corner > 0.0);
        assert_eq!(flat, 0.0);
        assert_eq!(CornerDetector::compute_harris_response(&img, 50, 50, 2, 2), 0.0);
    }
}
