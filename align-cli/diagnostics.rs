use crate::config::ImagePair;
use align_core::{Correspondences, Match};
use align_geometry::Homography;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use std::path::{Path, PathBuf};

/// Scale of the matched-pairs view handed to diagnostics
pub const PREVIEW_SCALE: f32 = 0.4;

const PALETTE: [Rgb<u8>; 6] = [
    Rgb([255, 64, 64]),
    Rgb([64, 220, 64]),
    Rgb([64, 128, 255]),
    Rgb([255, 200, 0]),
    Rgb([255, 0, 255]),
    Rgb([0, 230, 230]),
];

/// What a diagnostics sink sees after a pair has been aligned
pub struct PairDiagnostics<'a> {
    pub pair: &'a ImagePair,
    /// Reference and destination side by side with inlier matches drawn,
    /// scaled by [`PREVIEW_SCALE`]
    pub matches_view: RgbImage,
    pub warped: &'a RgbImage,
    pub homography: &'a Homography,
    pub inliers: usize,
}

/// Receives previews synchronously after each successful alignment.
///
/// Closures taking a `&PairDiagnostics` implement this trait.
pub trait DiagnosticsSink: Sync {
    fn on_aligned(&self, diagnostics: &PairDiagnostics<'_>);
}

impl<F> DiagnosticsSink for F
where
    F: Fn(&PairDiagnostics<'_>) + Sync,
{
    fn on_aligned(&self, diagnostics: &PairDiagnostics<'_>) {
        self(diagnostics)
    }
}

/// Writes the previews of every pair into a directory
#[derive(Debug, Clone)]
pub struct PreviewWriter {
    dir: PathBuf,
}

impl PreviewWriter {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// `(matches view, warped preview)` file names for a destination, keyed
    /// by its full file name
    pub fn preview_paths(&self, destination: &Path) -> (PathBuf, PathBuf) {
        let name = destination
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pair".to_string());
        (
            self.dir.join(format!("{name}.matches.png")),
            self.dir.join(format!("{name}.warped.png")),
        )
    }
}

impl DiagnosticsSink for PreviewWriter {
    fn on_aligned(&self, diagnostics: &PairDiagnostics<'_>) {
        let (matches_path, warped_path) = self.preview_paths(&diagnostics.pair.destination);
        let preview = scale_image(diagnostics.warped, PREVIEW_SCALE);
        for (path, img) in [(&matches_path, &diagnostics.matches_view), (&warped_path, &preview)] {
            if let Err(err) = img.save(path) {
                log::warn!("could not write preview {}: {}", path.display(), err);
            }
        }
    }
}

/// Reference and destination side by side, each match drawn as a line
/// between its two keypoints, then scaled by `scale`
pub fn draw_matches(
    reference: &RgbImage,
    destination: &RgbImage,
    correspondences: &Correspondences,
    matches: &[Match],
    scale: f32,
) -> RgbImage {
    let (rw, rh) = reference.dimensions();
    let (dw, dh) = destination.dimensions();
    let mut canvas = RgbImage::new(rw + dw, rh.max(dh));
    imageops::replace(&mut canvas, reference, 0, 0);
    imageops::replace(&mut canvas, destination, rw as i64, 0);

    let reference_kps = correspondences.reference_keypoints();
    let destination_kps = correspondences.destination_keypoints();
    for (i, m) in matches.iter().enumerate() {
        let (Some(r), Some(d)) = (reference_kps.get(m.reference_idx), destination_kps.get(m.destination_idx)) else {
            continue;
        };
        let color = PALETTE[i % PALETTE.len()];
        let start = (r.x, r.y);
        let end = (d.x + rw as f32, d.y);
        draw_hollow_circle_mut(&mut canvas, (start.0 as i32, start.1 as i32), 4, color);
        draw_hollow_circle_mut(&mut canvas, (end.0 as i32, end.1 as i32), 4, color);
        draw_line_segment_mut(&mut canvas, start, end, color);
    }

    scale_image(&canvas, scale)
}

fn scale_image(img: &RgbImage, scale: f32) -> RgbImage {
    let width = ((img.width() as f32 * scale).round() as u32).max(1);
    let height = ((img.height() as f32 * scale).round() as u32).max(1);
    imageops::resize(img, width, height, FilterType::Triangle)
}
