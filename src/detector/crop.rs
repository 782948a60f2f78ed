//! Rotated crop: resample the window covered by a [`RotatedRect`] into an
//! upright image.
//!
//! The rectangle is first normalized per [`CropMode`]; the output then has
//! exactly `round(width) x round(height)` pixels (at least 1x1), its x axis
//! running along the rectangle's width axis. Each output pixel is sampled
//! bilinearly from the source; samples falling outside the source read as 0.

use crate::geometry::{AxisRect, RotatedRect};
use crate::image::Image;
use image::{ImageBuffer, Pixel};

/// Side-ordering convention applied before cropping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CropMode {
    /// Enforce `width >= height` (plates).
    Landscape,
    /// Enforce `height >= width` (character fragments).
    Portrait,
}

impl CropMode {
    /// Maps the integer convention `0 => Landscape`, `1 => Portrait`.
    ///
    /// # Panics
    /// On any other value: an invalid mode is a programming error.
    pub fn from_index(mode: i32) -> Self {
        match mode {
            0 => CropMode::Landscape,
            1 => CropMode::Portrait,
            other => panic!("invalid crop mode {other}: expected 0 (landscape) or 1 (portrait)"),
        }
    }

    pub fn normalize(self, rect: &RotatedRect) -> RotatedRect {
        match self {
            CropMode::Landscape => rect.landscape(),
            CropMode::Portrait => rect.portrait(),
        }
    }
}

/// Cropped pixels together with the normalized rectangle that produced them.
#[derive(Clone, Debug)]
pub struct CropResult {
    pub image: Image,
    pub rect: RotatedRect,
}

pub fn rotated_crop(image: &Image, rect: &RotatedRect, mode: CropMode) -> CropResult {
    let rect = mode.normalize(rect);
    let out_w = rect.width.round().max(1.0) as u32;
    let out_h = rect.height.round().max(1.0) as u32;
    let image = match image {
        Image::Gray(src) => Image::Gray(sample_window(src, &rect, out_w, out_h)),
        Image::Rgb(src) => Image::Rgb(sample_window(src, &rect, out_w, out_h)),
    };
    CropResult { image, rect }
}

/// Axis-aligned crop; the ROI is clipped to the image first.
pub fn crop_roi(image: &Image, roi: &AxisRect) -> Option<CropResult> {
    let roi = roi.clip(image.width(), image.height())?;
    Some(rotated_crop(image, &roi.to_rotated(), CropMode::Landscape))
}

fn sample_window<P>(
    src: &ImageBuffer<P, Vec<u8>>,
    rect: &RotatedRect,
    out_w: u32,
    out_h: u32,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    let channels = P::CHANNEL_COUNT as usize;
    let (sw, sh) = (src.width() as i64, src.height() as i64);
    let raw = src.as_raw();
    let (u, v) = rect.axes();
    let half_w = (out_w as f32 - 1.0) * 0.5;
    let half_h = (out_h as f32 - 1.0) * 0.5;

    let fetch = |x: i64, y: i64, c: usize| -> f32 {
        if x < 0 || y < 0 || x >= sw || y >= sh {
            0.0
        } else {
            raw[(y as usize * sw as usize + x as usize) * channels + c] as f32
        }
    };

    let mut out = vec![0u8; out_w as usize * out_h as usize * channels];
    for j in 0..out_h as usize {
        let dv = j as f32 - half_h;
        for i in 0..out_w as usize {
            let du = i as f32 - half_w;
            let x = rect.center[0] + du * u[0] + dv * v[0];
            let y = rect.center[1] + du * u[1] + dv * v[1];
            let x0 = x.floor();
            let y0 = y.floor();
            let fx = x - x0;
            let fy = y - y0;
            let (xi, yi) = (x0 as i64, y0 as i64);
            let base = (j * out_w as usize + i) * channels;
            for c in 0..channels {
                let top = fetch(xi, yi, c) * (1.0 - fx) + fetch(xi + 1, yi, c) * fx;
                let bottom = fetch(xi, yi + 1, c) * (1.0 - fx) + fetch(xi + 1, yi + 1, c) * fx;
                let value = top * (1.0 - fy) + bottom * fy;
                out[base + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    ImageBuffer::from_raw(out_w, out_h, out).expect("crop buffer sized for output dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn ramp(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x + 3 * y) % 256) as u8]))
    }

    #[test]
    fn output_size_follows_normalized_rect() {
        let img = Image::Gray(ramp(200, 120));
        for angle in [-80.0f32, -30.0, 0.0, 17.0, 45.0, 90.0, 135.0] {
            let tall = RotatedRect::new([100.0, 60.0], 20.0, 50.0, angle);
            let wide = rotated_crop(&img, &tall, CropMode::Landscape);
            assert_eq!(wide.image.dimensions(), (50, 20), "angle {angle}");
            assert!(wide.rect.width >= wide.rect.height);
            let upright = rotated_crop(&img, &tall, CropMode::Portrait);
            assert_eq!(upright.image.dimensions(), (20, 50), "angle {angle}");
        }
    }

    #[test]
    fn zero_angle_crop_copies_pixels() {
        let gray = ramp(64, 48);
        let img = Image::Gray(gray.clone());
        let roi = AxisRect::new(10, 5, 20, 12);
        let crop = crop_roi(&img, &roi).unwrap();
        let Image::Gray(out) = crop.image else {
            panic!("expected gray crop");
        };
        assert_eq!(out.dimensions(), (20, 12));
        for y in 0..12 {
            for x in 0..20 {
                assert_eq!(out.get_pixel(x, y), gray.get_pixel(x + 10, y + 5));
            }
        }
    }

    #[test]
    fn outside_samples_are_black_and_colour_is_kept() {
        let img = Image::Rgb(RgbImage::from_pixel(10, 10, Rgb([200, 100, 50])));
        let rect = RotatedRect::new([0.0, 0.0], 10.0, 10.0, 0.0);
        let crop = rotated_crop(&img, &rect, CropMode::Landscape);
        let Image::Rgb(out) = crop.image else {
            panic!("expected rgb crop");
        };
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(9, 9), &Rgb([200, 100, 50]));
    }

    #[test]
    #[should_panic(expected = "invalid crop mode")]
    fn unknown_mode_index_panics() {
        let _ = CropMode::from_index(2);
    }
}
