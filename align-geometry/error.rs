use align_core::CorrespondenceError;

#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    #[error("insufficient correspondences: {found} found, at least {required} required")]
    InsufficientCorrespondences { found: usize, required: usize },
    #[error("degenerate homography: no valid transform fits the correspondences")]
    DegenerateHomography,
    #[error(transparent)]
    Correspondence(#[from] CorrespondenceError),
}
