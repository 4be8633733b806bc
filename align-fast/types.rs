use align_core::{Image, Keypoint};

/// Keypoint with FAST score, used for NMS before Harris ranking
#[derive(Debug, Clone, Copy)]
pub struct ScoredKeypoint {
    pub keypoint: Keypoint,
    pub response: f32,
}

/// Scale information for pyramid levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    pub scale: f32,
    pub width: usize,
    pub height: usize,
}

/// One pyramid level and its pixels
#[derive(Debug, Clone)]
pub struct PyramidLevel {
    pub scale_level: ScaleLevel,
    pub image: Image,
}

/// Keypoints of one image plus the pyramid they were found on.
///
/// Keypoints are grouped by ascending octave, so descriptor generation can
/// walk the levels in order and keep descriptors aligned with keypoints.
#[derive(Debug, Clone)]
pub struct Detection {
    pub keypoints: Vec<Keypoint>,
    pub levels: Vec<PyramidLevel>,
}

impl Detection {
    /// Keypoints detected on `level`
    pub fn keypoints_at(&self, level: usize) -> &[Keypoint] {
        let start = self.keypoints.partition_point(|kp| kp.octave < level);
        let end = self.keypoints.partition_point(|kp| kp.octave <= level);
        &self.keypoints[start..end]
    }
}

/// Segment-test outcome for a candidate pixel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CornerType {
    Bright,
    Dark,
    None,
}
