use align_brief::BriefError;
use align_core::CorrespondenceError;
use align_fast::FastError;
use std::fmt;

/// Which side of an image pair an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Reference,
    Destination,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Reference => write!(f, "reference"),
            ImageRole::Destination => write!(f, "destination"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("no keypoints found in the {image} image")]
    NoFeatures { image: ImageRole },
    #[error("keypoint detection failed: {0}")]
    Detector(#[from] FastError),
    #[error("descriptor computation failed: {0}")]
    Descriptor(#[from] BriefError),
    #[error(transparent)]
    Correspondence(#[from] CorrespondenceError),
}
