use align_core::{Image, Keypoint};
use crate::types::ScoredKeypoint;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Keypoint suppression, ranking and orientation
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Greedy non-maximum suppression: keypoints are visited by descending
    /// score and dropped when an already accepted keypoint lies closer than
    /// `min_distance`. Equal scores keep their input order.
    pub fn non_maximum_suppression(keypoints: &[ScoredKeypoint], min_distance: f32) -> Vec<ScoredKeypoint> {
        if keypoints.is_empty() || min_distance <= 0.0 {
            return keypoints.to_vec();
        }

        let mut sorted_keypoints = keypoints.to_vec();
        sorted_keypoints.sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap_or(Ordering::Equal));

        // Accepted keypoints bucketed on a grid of `min_distance` cells, so
        // only the 3x3 neighbouring cells need checking.
        let cell = min_distance;
        let mut grid: HashMap<(i64, i64), Vec<(f32, f32)>> = HashMap::new();
        let min_distance_sq = min_distance * min_distance;
        let mut suppressed = Vec::new();

        for candidate in sorted_keypoints {
            let (x, y) = (candidate.keypoint.x, candidate.keypoint.y);
            let (cx, cy) = ((x / cell).floor() as i64, (y / cell).floor() as i64);

            let too_close = (cy - 1..=cy + 1).any(|gy| {
                (cx - 1..=cx + 1).any(|gx| {
                    grid.get(&(gx, gy)).is_some_and(|accepted| {
                        accepted.iter().any(|&(ax, ay)| {
                            let dx = x - ax;
                            let dy = y - ay;
                            dx * dx + dy * dy < min_distance_sq
                        })
                    })
                })
            });

            if !too_close {
                grid.entry((cx, cy)).or_default().push((x, y));
                suppressed.push(candidate);
            }
        }

        suppressed
    }

    /// Keep the `n` keypoints with the highest Harris response (stable)
    pub fn retain_best(keypoints: &mut Vec<Keypoint>, n: usize) {
        if keypoints.len() <= n {
            return;
        }
        keypoints.sort_by(|a, b| b.response.partial_cmp(&a.response).unwrap_or(Ordering::Equal));
        keypoints.truncate(n);
    }

    /// Orientation by intensity centroid over a disc of radius `patch_size / 2`.
    ///
    /// Pixels outside the image are skipped. Returns radians in `(-pi, pi]`.
    pub fn compute_orientation(img: &Image, width: usize, height: usize, x: f32, y: f32, patch_size: usize) -> f32 {
        let half = (patch_size / 2) as i32;
        let radius_sq = half * half;
        let (cx, cy) = (x.round() as i32, y.round() as i32);

        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -half..=half {
            let yy = cy + dy;
            if yy < 0 || yy >= height as i32 {
                continue;
            }
            let row = yy as usize * width;
            for dx in -half..=half {
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let xx = cx + dx;
                if xx < 0 || xx >= width as i32 {
                    continue;
                }
                let val = img[row + xx as usize] as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }
}
