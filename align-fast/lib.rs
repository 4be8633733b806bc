//! Multi-scale oriented FAST keypoint detection.
//!
//! Each pyramid level is searched with the FAST-9 segment test, thinned with
//! non-maximum suppression, ranked by Harris response and capped at its share
//! of the feature budget. Surviving keypoints get an intensity-centroid
//! orientation and are reported in input-image coordinates.

mod builder;
mod corner_detection;
mod detector;
mod error;
mod pyramid;
mod refinement;
mod types;
mod utils;

pub use builder::DetectorBuilder;
pub use corner_detection::CornerDetector;
pub use detector::FastDetector;
pub use error::{FastError, FastResult};
pub use pyramid::ImagePyramid;
pub use refinement::KeypointRefinement;
pub use types::{Detection, PyramidLevel, ScaleLevel, ScoredKeypoint};
