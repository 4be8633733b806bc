use align_geometry::AlignError;
use align_match::MatchError;
use std::path::PathBuf;

/// Why one image pair could not be aligned
#[derive(Debug, thiserror::Error)]
pub enum PairError {
    #[error("failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Align(#[from] AlignError),
}

impl PairError {
    /// Stable identifier used in batch reports
    pub fn kind(&self) -> &'static str {
        match self {
            PairError::Load { .. } => "load",
            PairError::Save { .. } => "save",
            PairError::Match(MatchError::NoFeatures { .. }) => "no_features",
            PairError::Match(MatchError::Detector(_) | MatchError::Descriptor(_)) => "detector",
            PairError::Match(MatchError::Correspondence(_)) => "correspondence",
            PairError::Align(AlignError::InsufficientCorrespondences { .. }) => "insufficient_correspondences",
            PairError::Align(AlignError::DegenerateHomography) => "degenerate_homography",
            PairError::Align(AlignError::Correspondence(_)) => "correspondence",
        }
    }
}
