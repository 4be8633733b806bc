mod config;

pub use config::{AlignConfig, ConfigError, MatchConfig, OrbConfig, RansacConfig};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image
pub type Image = Vec<u8>;

/// Key-point ≙ FAST corner + orientation (radians), in level-0 pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    /// Pyramid level the keypoint was detected on
    pub octave: usize,
    /// Diameter of the described neighbourhood, in level-0 pixels
    pub size: f32,
    /// Harris corner response
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            octave: 0,
            size: 31.0,
            response: 0.0,
        }
    }
}

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// Number of differing bits between two descriptors
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// A reference keypoint paired with its nearest destination keypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub reference_idx: usize,
    pub destination_idx: usize,
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorrespondenceError {
    #[error("match {position} references {side} keypoint {index}, but only {len} exist")]
    IndexOutOfRange {
        position: usize,
        side: &'static str,
        index: usize,
        len: usize,
    },
    #[error("inlier mask has {mask_len} entries for {match_len} matches")]
    MaskLength { mask_len: usize, match_len: usize },
}

/// Keypoints of an image pair together with the matches between them.
///
/// Every match index is checked against its keypoint set on construction,
/// so downstream code can index the keypoint slices without bounds worries.
/// The number of matches at construction time is remembered as the raw
/// count; [`Correspondences::retain_best`] keeps a fraction of that raw
/// count, which makes repeated filtering at the same fraction a no-op.
#[derive(Debug, Clone)]
pub struct Correspondences {
    reference_keypoints: Vec<Keypoint>,
    destination_keypoints: Vec<Keypoint>,
    matches: Vec<Match>,
    raw_count: usize,
}

impl Correspondences {
    pub fn new(
        reference_keypoints: Vec<Keypoint>,
        destination_keypoints: Vec<Keypoint>,
        matches: Vec<Match>,
    ) -> Result<Self, CorrespondenceError> {
        for (position, m) in matches.iter().enumerate() {
            if m.reference_idx >= reference_keypoints.len() {
                return Err(CorrespondenceError::IndexOutOfRange {
                    position,
                    side: "reference",
                    index: m.reference_idx,
                    len: reference_keypoints.len(),
                });
            }
            if m.destination_idx >= destination_keypoints.len() {
                return Err(CorrespondenceError::IndexOutOfRange {
                    position,
                    side: "destination",
                    index: m.destination_idx,
                    len: destination_keypoints.len(),
                });
            }
        }

        let raw_count = matches.len();
        Ok(Self {
            reference_keypoints,
            destination_keypoints,
            matches,
            raw_count,
        })
    }

    /// Stable sort by ascending Hamming distance (best first)
    pub fn sort_by_distance(&mut self) {
        self.matches.sort_by_key(|m| m.distance);
    }

    pub fn is_sorted(&self) -> bool {
        self.matches.windows(2).all(|w| w[0].distance <= w[1].distance)
    }

    /// Number of matches kept by [`Self::retain_best`] for `fraction`
    pub fn retained_len(&self, fraction: f32) -> usize {
        (self.raw_count as f32 * fraction).floor() as usize
    }

    /// Sort, then keep the best `floor(raw_count * fraction)` matches.
    ///
    /// Truncating at or beyond the current length leaves the sequence as is.
    pub fn retain_best(&mut self, fraction: f32) {
        self.sort_by_distance();
        let keep = self.retained_len(fraction);
        self.matches.truncate(keep);
    }

    /// Matches whose mask entry is set, in their original order
    pub fn select(&self, mask: &[bool]) -> Result<Vec<Match>, CorrespondenceError> {
        if mask.len() != self.matches.len() {
            return Err(CorrespondenceError::MaskLength {
                mask_len: mask.len(),
                match_len: self.matches.len(),
            });
        }
        Ok(self
            .matches
            .iter()
            .zip(mask)
            .filter(|&(_, &keep)| keep)
            .map(|(m, _)| *m)
            .collect())
    }

    /// Reference-side coordinates, in match order
    pub fn reference_points(&self) -> Vec<(f32, f32)> {
        self.matches
            .iter()
            .map(|m| {
                let kp = &self.reference_keypoints[m.reference_idx];
                (kp.x, kp.y)
            })
            .collect()
    }

    /// Destination-side coordinates, in match order
    pub fn destination_points(&self) -> Vec<(f32, f32)> {
        self.matches
            .iter()
            .map(|m| {
                let kp = &self.destination_keypoints[m.destination_idx];
                (kp.x, kp.y)
            })
            .collect()
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn reference_keypoints(&self) -> &[Keypoint] {
        &self.reference_keypoints
    }

    pub fn destination_keypoints(&self) -> &[Keypoint] {
        &self.destination_keypoints
    }

    /// Match count before any truncation
    pub fn raw_count(&self) -> usize {
        self.raw_count
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
