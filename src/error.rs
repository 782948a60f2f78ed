use thiserror::Error;

/// Failures that end processing of one input image.
///
/// Recoverable misses (primary selector, refinement, verification) are not
/// represented here; they surface as `Option`s or outcome enums instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlateError {
    #[error("input image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("no plate candidate found by the primary or fallback selector")]
    PlateNotFound,
    #[error("no character fragments survived segmentation")]
    NoFragments,
}

pub type Result<T> = std::result::Result<T, PlateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_dimensions() {
        let err = PlateError::EmptyImage {
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "input image is empty (0x12)");
    }
}
