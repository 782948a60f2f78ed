//! Owned pixel buffers passed between stages.
//!
//! Every stage receives an [`Image`] by reference and returns freshly
//! allocated buffers, so nothing produced by one stage is aliased by the
//! next. Grayscale and 8-bit RGB inputs are supported; all analysis runs on
//! the grayscale reduction.

pub mod io;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};

/// Decoded input or intermediate image, single- or three-channel.
#[derive(Clone, Debug, PartialEq)]
pub enum Image {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl Image {
    /// Keep colour when the decoded image has it, otherwise store luma.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        if img.color().has_color() {
            Image::Rgb(img.into_rgb8())
        } else {
            Image::Gray(img.into_luma8())
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            Image::Gray(img) => img.width(),
            Image::Rgb(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Image::Gray(img) => img.height(),
            Image::Rgb(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn channels(&self) -> u8 {
        match self {
            Image::Gray(_) => 1,
            Image::Rgb(_) => 3,
        }
    }

    /// Single-channel copy (luma for colour input).
    pub fn to_gray(&self) -> GrayImage {
        match self {
            Image::Gray(img) => img.clone(),
            Image::Rgb(img) => imageops::grayscale(img),
        }
    }

    /// Bilinear resize to exactly `width` x `height`.
    pub fn resize_exact(&self, width: u32, height: u32) -> Image {
        match self {
            Image::Gray(img) => {
                Image::Gray(imageops::resize(img, width, height, FilterType::Triangle))
            }
            Image::Rgb(img) => Image::Rgb(imageops::resize(img, width, height, FilterType::Triangle)),
        }
    }

    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            Image::Gray(img) => DynamicImage::ImageLuma8(img.clone()),
            Image::Rgb(img) => DynamicImage::ImageRgb8(img.clone()),
        }
    }
}

impl From<GrayImage> for Image {
    fn from(img: GrayImage) -> Self {
        Image::Gray(img)
    }
}

impl From<RgbImage> for Image {
    fn from(img: RgbImage) -> Self {
        Image::Rgb(img)
    }
}

/// Mean sample value; `0.0` for an empty image.
pub fn mean_intensity(gray: &GrayImage) -> f64 {
    let raw = gray.as_raw();
    if raw.is_empty() {
        return 0.0;
    }
    raw.iter().map(|&v| v as u64).sum::<u64>() as f64 / raw.len() as f64
}

/// Global binary threshold: samples strictly above `level` become 255.
pub fn threshold_above(gray: &GrayImage, level: f64) -> GrayImage {
    let mut out = gray.clone();
    for px in out.iter_mut() {
        *px = if *px as f64 > level { 255 } else { 0 };
    }
    out
}

/// Tonal inversion `v -> 255 - v`.
pub fn inverted(gray: &GrayImage) -> GrayImage {
    let mut out = gray.clone();
    imageops::invert(&mut out);
    out
}

/// Resize a single-channel buffer with bilinear filtering.
pub fn resize_gray(gray: &GrayImage, width: u32, height: u32) -> GrayImage {
    imageops::resize(gray, width, height, FilterType::Triangle)
}
