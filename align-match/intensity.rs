use image::{DynamicImage, GrayImage, Luma};

/// Grayscale with BT.601 luma weights (0.299, 0.587, 0.114), rounded to
/// nearest. `DynamicImage::to_luma8` uses Rec. 709 weights instead.
pub fn to_gray(img: &DynamicImage) -> GrayImage {
    if let DynamicImage::ImageLuma8(gray) = img {
        return gray.clone();
    }
    let rgb = img.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
        Luma([((luma + 500) / 1000) as u8])
    })
}

/// Subtract the image's own minimum from every pixel.
///
/// Returns the shifted image and the minimum that was removed. The result
/// is not stretched, so the brightest pixel ends up at `max - min`.
pub fn subtract_minimum(gray: &GrayImage) -> (GrayImage, u8) {
    let min = gray.as_raw().iter().copied().min().unwrap_or(0);
    let mut shifted = gray.clone();
    if min > 0 {
        shifted.iter_mut().for_each(|p| *p -= min);
    }
    (shifted, min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gray_uses_bt601_weights() {
        let rgb = image::RgbImage::from_raw(
            4,
            1,
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 200, 100, 50],
        )
        .unwrap();
        let gray = to_gray(&DynamicImage::ImageRgb8(rgb));
        // 0.299 * 200 + 0.587 * 100 + 0.114 * 50 = 124.2
        assert_eq!(gray.into_raw(), vec![76, 150, 29, 124]);
    }

    #[test]
    fn test_gray_input_is_kept() {
        let gray = GrayImage::from_raw(3, 1, vec![0, 77, 255]).unwrap();
        assert_eq!(to_gray(&DynamicImage::ImageLuma8(gray.clone())), gray);
        let rgb = DynamicImage::ImageLuma8(gray.clone()).to_rgb8();
        assert_eq!(to_gray(&DynamicImage::ImageRgb8(rgb)), gray);
    }

    #[test]
    fn test_minimum_is_removed() {
        let gray = GrayImage::from_raw(2, 2, vec![10, 20, 30, 40]).unwrap();
        let (shifted, min) = subtract_minimum(&gray);
        assert_eq!(min, 10);
        assert_eq!(shifted.into_raw(), vec![0, 10, 20, 30]);
    }

    #[test]
    fn test_no_stretching_or_clipping() {
        let gray = GrayImage::from_raw(3, 1, vec![200, 255, 201]).unwrap();
        let (shifted, min) = subtract_minimum(&gray);
        assert_eq!(min, 200);
        assert_eq!(shifted.into_raw(), vec![0, 55, 1]);
    }

    #[test]
    fn test_black_image_is_unchanged() {
        let gray = GrayImage::from_raw(2, 1, vec![0, 90]).unwrap();
        let (shifted, min) = subtract_minimum(&gray);
        assert_eq!(min, 0);
        assert_eq!(shifted, gray);
    }
}
