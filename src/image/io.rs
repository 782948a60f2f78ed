//! Decoding/encoding helpers used by the binaries.
//!
//! - `load_image`: read a PNG/JPEG/etc. into an [`Image`], keeping colour.
//! - `save_image` / `save_gray`: write a buffer, creating parent directories.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::Image;
use image::GrayImage;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk; empty decodes are rejected here so the core
/// never sees them.
pub fn load_image(path: &Path) -> Result<Image, String> {
    let img = image::open(path).map_err(|e| format!("Failed to open {}: {e}", path.display()))?;
    let img = Image::from_dynamic(img);
    if img.is_empty() {
        return Err(format!("Image {} has no pixels", path.display()));
    }
    Ok(img)
}

pub fn save_image(img: &Image, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    img.to_dynamic()
        .save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

pub fn save_gray(img: &GrayImage, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    img.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
