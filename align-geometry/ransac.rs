use crate::error::AlignError;
use crate::homography::{estimate_homography, Homography};
use align_core::RansacConfig;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;

/// Points needed for one homography hypothesis
pub const MIN_SAMPLE: usize = 4;

/// Result of a robust homography fit
#[derive(Debug, Clone)]
pub struct RansacFit {
    pub homography: Homography,
    /// One flag per input pair, `true` for inliers
    pub mask: Vec<bool>,
    pub iterations: usize,
}

impl RansacFit {
    pub fn inlier_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// Seeded RANSAC over 4-point DLT hypotheses
#[derive(Debug, Clone)]
pub struct Ransac {
    config: RansacConfig,
}

impl Ransac {
    pub fn new(config: RansacConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RansacConfig {
        &self.config
    }

    /// Fit `dst ~ H * src`, tolerating outliers.
    ///
    /// The iteration budget shrinks as better models are found, until the
    /// probability of having missed an all-inlier sample drops below
    /// `1 - confidence`. The winner is refitted on its inliers and the refit
    /// replaces it only when it keeps at least as many inliers.
    pub fn fit(&self, src: &[(f64, f64)], dst: &[(f64, f64)]) -> Result<RansacFit, AlignError> {
        let n = src.len().min(dst.len());
        if n < MIN_SAMPLE {
            return Err(AlignError::InsufficientCorrespondences {
                found: n,
                required: MIN_SAMPLE,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut max_iterations = self.config.max_iterations;
        let mut best: Option<(Homography, Vec<bool>, usize)> = None;
        let mut iterations = 0;

        while iterations < max_iterations {
            iterations += 1;

            let idx = sample(&mut rng, n, MIN_SAMPLE).into_vec();
            let sample_src: Vec<(f64, f64)> = idx.iter().map(|&i| src[i]).collect();
            let sample_dst: Vec<(f64, f64)> = idx.iter().map(|&i| dst[i]).collect();
            if has_collinear_triple(&sample_src) || has_collinear_triple(&sample_dst) {
                continue;
            }

            let Some(h) = estimate_homography(&sample_src, &sample_dst) else {
                continue;
            };
            if !h.is_finite() {
                continue;
            }

            let mask = self.inlier_mask(&h, src, dst);
            let count = mask.iter().filter(|&&m| m).count();
            if best.as_ref().is_some_and(|(_, _, c)| count <= *c) {
                continue;
            }

            max_iterations = max_iterations.min(self.required_iterations(count, n, iterations));
            best = Some((h, mask, count));
        }

        let Some((mut homography, mut mask, mut count)) = best else {
            return Err(AlignError::DegenerateHomography);
        };
        if count < MIN_SAMPLE {
            return Err(AlignError::DegenerateHomography);
        }

        let (inlier_src, inlier_dst): (Vec<_>, Vec<_>) = src
            .iter()
            .zip(dst)
            .zip(&mask)
            .filter(|&(_, &keep)| keep)
            .map(|((s, d), _)| (*s, *d))
            .unzip();
        if let Some(refit) = estimate_homography(&inlier_src, &inlier_dst).filter(Homography::is_finite) {
            let refit_mask = self.inlier_mask(&refit, src, dst);
            let refit_count = refit_mask.iter().filter(|&&m| m).count();
            if refit_count >= count {
                homography = refit;
                mask = refit_mask;
                count = refit_count;
            }
        }

        if !homography.is_finite() || homography.determinant().abs() < 1e-12 {
            return Err(AlignError::DegenerateHomography);
        }

        log::debug!("RANSAC: {} of {} inliers after {} iterations", count, n, iterations);
        Ok(RansacFit {
            homography,
            mask,
            iterations,
        })
    }

    /// Reprojection test of every pair against `h`
    pub fn inlier_mask(&self, h: &Homography, src: &[(f64, f64)], dst: &[(f64, f64)]) -> Vec<bool> {
        let threshold_sq = self.config.reprojection_threshold * self.config.reprojection_threshold;
        src.iter()
            .zip(dst)
            .map(|(&(x, y), &(u, v))| {
                let (px, py) = h.apply(x, y);
                let err_sq = (px - u).powi(2) + (py - v).powi(2);
                // NaN compares false and counts as an outlier
                err_sq <= threshold_sq
            })
            .collect()
    }

    /// Iterations needed to draw one all-inlier sample with the configured
    /// confidence, given `inliers` out of `n`
    fn required_iterations(&self, inliers: usize, n: usize, done: usize) -> usize {
        let w = inliers as f64 / n as f64;
        let p_fail = 1.0 - w.powi(MIN_SAMPLE as i32);
        if p_fail <= f64::EPSILON {
            return done;
        }
        if p_fail >= 1.0 {
            return self.config.max_iterations;
        }
        let k = (1.0 - self.config.confidence).ln() / p_fail.ln();
        if k.is_finite() {
            (k.ceil() as usize).max(done)
        } else {
            self.config.max_iterations
        }
    }
}

/// True when any three of the points are (nearly) on one line, or coincide
fn has_collinear_triple(pts: &[(f64, f64)]) -> bool {
    for i in 0..pts.len() {
        for j in (i + 1)..pts.len() {
            for k in (j + 1)..pts.len() {
                let (ax, ay) = (pts[j].0 - pts[i].0, pts[j].1 - pts[i].1);
                let (bx, by) = (pts[k].0 - pts[i].0, pts[k].1 - pts[i].1);
                let cross = ax * by - ay * bx;
                let scale = (ax * ax + ay * ay).sqrt() * (bx * bx + by * by).sqrt();
                if cross.abs() <= 1e-6 * scale.max(1e-12) {
                    return true;
                }
            }
        }
    }
    false
}
