//! Correlation methods and how their scores are read.

/// Which end of the response surface marks a good match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extremum {
    /// Similarity metrics: the maximum wins.
    Max,
    /// Difference metrics: the minimum wins.
    Min,
}

impl Extremum {
    /// Value that can never be selected, used to mask visited neighborhoods.
    pub fn sentinel(self) -> f32 {
        match self {
            Self::Max => f32::NEG_INFINITY,
            Self::Min => f32::INFINITY,
        }
    }

    /// True when `candidate` is strictly better than `current`.
    pub fn better(self, candidate: f32, current: f32) -> bool {
        match self {
            Self::Max => candidate > current,
            Self::Min => candidate < current,
        }
    }
}

/// The six template-matching scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Raw cross-correlation `sum(T * I)`.
    Ccorr,
    /// Cross-correlation divided by both window norms.
    CcorrNormed,
    /// Cross-correlation of zero-mean template and window.
    Ccoeff,
    /// Normalized cross-correlation, in `[-1, 1]`.
    #[default]
    CcoeffNormed,
    /// Sum of squared differences.
    Sqdiff,
    /// Sum of squared differences divided by both window norms, in `[0, 1]`.
    SqdiffNormed,
}

/// How a method is thresholded and reported, resolved once per call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MethodStrategy {
    pub extremum: Extremum,
    /// Added to the raw threshold before comparing.
    pub threshold_offset: f64,
}

impl MethodStrategy {
    /// Raw-scale threshold for a "higher is better" confidence.
    pub fn raw_threshold(&self, confidence: f64) -> f64 {
        match self.extremum {
            Extremum::Max => confidence + self.threshold_offset,
            Extremum::Min => (1.0 - confidence) + self.threshold_offset,
        }
    }

    /// True when a raw extremum passes the threshold.
    pub fn passes(&self, value: f64, confidence: f64) -> bool {
        let threshold = self.raw_threshold(confidence);
        match self.extremum {
            Extremum::Max => value >= threshold,
            Extremum::Min => value <= threshold,
        }
    }

    /// Converts a raw extremum into a "higher is better" confidence.
    pub fn confidence(&self, value: f64) -> f64 {
        match self.extremum {
            Extremum::Max => value,
            Extremum::Min => 1.0 - value,
        }
    }
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::Ccorr,
        Method::CcorrNormed,
        Method::Ccoeff,
        Method::CcoeffNormed,
        Method::Sqdiff,
        Method::SqdiffNormed,
    ];

    pub fn strategy(self) -> MethodStrategy {
        match self {
            Method::Sqdiff => MethodStrategy {
                extremum: Extremum::Min,
                threshold_offset: 0.0,
            },
            Method::SqdiffNormed => MethodStrategy {
                extremum: Extremum::Min,
                threshold_offset: 0.008,
            },
            _ => MethodStrategy {
                extremum: Extremum::Max,
                threshold_offset: 0.0,
            },
        }
    }

    pub fn is_normed(self) -> bool {
        matches!(
            self,
            Method::CcorrNormed | Method::CcoeffNormed | Method::SqdiffNormed
        )
    }

    /// True for the zero-mean (coefficient) variants.
    pub fn is_centered(self) -> bool {
        matches!(self, Method::Ccoeff | Method::CcoeffNormed)
    }

    pub fn is_sqdiff(self) -> bool {
        matches!(self, Method::Sqdiff | Method::SqdiffNormed)
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Ccorr => "ccorr",
            Method::CcorrNormed => "ccorr_normed",
            Method::Ccoeff => "ccoeff",
            Method::CcoeffNormed => "ccoeff_normed",
            Method::Sqdiff => "sqdiff",
            Method::SqdiffNormed => "sqdiff_normed",
        }
    }
}
