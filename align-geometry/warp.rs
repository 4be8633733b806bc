use crate::error::AlignError;
use crate::homography::Homography;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation};

/// Resample `image` into a `width` x `height` canvas through `h`.
///
/// `h` maps source pixels to canvas pixels. Canvas pixels whose preimage
/// falls outside the source stay black.
pub fn warp_perspective(image: &RgbImage, h: &Homography, width: u32, height: u32) -> Result<RgbImage, AlignError> {
    let projection = h.to_projection().ok_or(AlignError::DegenerateHomography)?;
    let mut out = RgbImage::new(width, height);
    warp_into(image, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut out);
    Ok(out)
}
