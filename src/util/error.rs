//! Error types for needlefind.

use thiserror::Error;

/// Result alias for needlefind operations.
pub type NeedleFindResult<T> = std::result::Result<T, NeedleFindError>;

/// Errors that can occur while preparing inputs or searching for a needle.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum NeedleFindError {
    /// Width or height is zero or overflows a buffer size computation.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride: width={width}, stride={stride}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the declared geometry requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A crop rectangle does not fit inside the image.
    #[error("crop out of bounds: x={x}, y={y}, w={width}, h={height} for {img_width}x{img_height}")]
    CropOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Pixel layout with a channel count the converter does not handle.
    #[error("unsupported channel count: {channels}")]
    UnsupportedChannels { channels: usize },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// An image source could not decode the requested image.
    #[error("failed to load image '{id}': {reason}")]
    LoadFailure { id: String, reason: String },
    /// A decoded image carries no pixels.
    #[error("image '{id}' is empty")]
    EmptyImage { id: String },
    /// The needle does not fit into the haystack at the given scale.
    #[error(
        "needle of {needle_width}x{needle_height} at scale {scale} is larger than haystack of {haystack_width}x{haystack_height}"
    )]
    OversizedNeedle {
        needle_width: usize,
        needle_height: usize,
        haystack_width: usize,
        haystack_height: usize,
        scale: f64,
    },
    /// The requested search region is unusable.
    #[error("invalid search region ({left}, {top}, {width}, {height}): {reason}")]
    InvalidRoi {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
        reason: &'static str,
    },
    /// Nothing reached the confidence threshold.
    #[error("{}", no_match_message(.threshold, .best))]
    NoMatchFound { threshold: f64, best: Option<f64> },
}

fn no_match_message(threshold: &f64, best: &Option<f64>) -> String {
    match best {
        Some(best) => {
            format!("No match with required confidence {threshold}. Best match: {best}")
        }
        None => "Unable to locate needle, no match".to_string(),
    }
}

impl NeedleFindError {
    /// Best score carried by a `NoMatchFound` error.
    pub fn best_score(&self) -> Option<f64> {
        match self {
            Self::NoMatchFound { best, .. } => *best,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::NeedleFindError;

    #[test]
    fn no_match_message_mentions_best_score() {
        let err = NeedleFindError::NoMatchFound {
            threshold: 0.8,
            best: Some(0.5),
        };
        assert_eq!(
            err.to_string(),
            "No match with required confidence 0.8. Best match: 0.5"
        );
        assert_eq!(err.best_score(), Some(0.5));
    }

    #[test]
    fn no_match_without_candidates() {
        let err = NeedleFindError::NoMatchFound {
            threshold: 0.8,
            best: None,
        };
        assert!(err.to_string().starts_with("Unable to locate"));
    }
}
