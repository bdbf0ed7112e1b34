use std::fmt;

use crate::dispatch::{ElementKind, ModeParameterError};

/// Selects a compression mode without its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMode {
    FixedRate,
    FixedPrecision,
    FixedAccuracy,
    Reversible,
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FixedRate => "fixed-rate",
            Self::FixedPrecision => "fixed-precision",
            Self::FixedAccuracy => "fixed-accuracy",
            Self::Reversible => "reversible",
        })
    }
}

/// A compression mode together with the one parameter it takes.
///
/// The bitstream does not record the mode, so decompression must be given
/// the same `Mode` that compressed the data. A different mode decodes to
/// garbage; it is reported as [`ZfpError::ModeMismatch`](crate::ZfpError::ModeMismatch)
/// only when the codec happens to notice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    /// Each block is stored in a fixed number of bits
    FixedRate {
        /// Compressed bits per value
        rate: f64,
    },
    /// A fixed number of bit planes is kept per block
    FixedPrecision {
        /// Number of bit planes
        precision: u32,
    },
    /// Absolute error is bounded by `tolerance` (floating-point data only)
    FixedAccuracy {
        /// Maximum absolute reconstruction error
        tolerance: f64,
    },
    /// Lossless
    Reversible,
}

impl Mode {
    /// Largest accepted fixed rate. Even a 4-D block at this rate stays
    /// far inside the codec's unsigned per-block bit count.
    pub const MAX_RATE: f64 = 4096.0;

    /// The parameterless selector for this mode.
    #[must_use]
    pub const fn selector(&self) -> CompressionMode {
        match self {
            Self::FixedRate { .. } => CompressionMode::FixedRate,
            Self::FixedPrecision { .. } => CompressionMode::FixedPrecision,
            Self::FixedAccuracy { .. } => CompressionMode::FixedAccuracy,
            Self::Reversible => CompressionMode::Reversible,
        }
    }

    /// Builds a mode from a selector and keyword-style parameters.
    ///
    /// Exactly the parameter belonging to `selector` must be present;
    /// [`CompressionMode::Reversible`] takes none.
    pub fn from_parameters(
        selector: CompressionMode,
        parameters: &ModeParameters,
    ) -> Result<Self, ModeParameterError> {
        let supplied = [
            ("rate", parameters.rate.is_some(), CompressionMode::FixedRate),
            (
                "precision",
                parameters.precision.is_some(),
                CompressionMode::FixedPrecision,
            ),
            (
                "tolerance",
                parameters.tolerance.is_some(),
                CompressionMode::FixedAccuracy,
            ),
        ];
        if let Some((parameter, _, _)) = supplied
            .into_iter()
            .find(|&(_, present, owner)| present && owner != selector)
        {
            return Err(ModeParameterError::Extraneous {
                mode: selector,
                parameter,
            });
        }

        let missing = |parameter| ModeParameterError::Missing {
            mode: selector,
            parameter,
        };
        Ok(match selector {
            CompressionMode::FixedRate => Self::FixedRate {
                rate: parameters.rate.ok_or_else(|| missing("rate"))?,
            },
            CompressionMode::FixedPrecision => Self::FixedPrecision {
                precision: parameters.precision.ok_or_else(|| missing("precision"))?,
            },
            CompressionMode::FixedAccuracy => Self::FixedAccuracy {
                tolerance: parameters.tolerance.ok_or_else(|| missing("tolerance"))?,
            },
            CompressionMode::Reversible => Self::Reversible,
        })
    }

    /// Checks the parameter against the domain allowed for `kind`.
    pub fn validate(&self, kind: ElementKind) -> Result<(), ModeParameterError> {
        match *self {
            Self::FixedRate { rate } => {
                if !(rate > 0.0 && rate <= Self::MAX_RATE) {
                    return Err(ModeParameterError::Rate(rate));
                }
            }
            Self::FixedPrecision { precision } => {
                let max = kind.max_precision();
                if !(1..=max).contains(&precision) {
                    return Err(ModeParameterError::Precision {
                        precision,
                        max,
                        kind,
                    });
                }
            }
            Self::FixedAccuracy { tolerance } => {
                if kind.is_integer() {
                    return Err(ModeParameterError::AccuracyOnIntegers(kind));
                }
                if !(tolerance.is_finite() && tolerance >= 0.0) {
                    return Err(ModeParameterError::Tolerance(tolerance));
                }
            }
            Self::Reversible => {}
        }
        Ok(())
    }

    /// Upper bound on compressed bits per (padded) value.
    pub(crate) fn max_bits_per_value(&self, kind: ElementKind) -> f64 {
        match *self {
            Self::FixedRate { rate } => rate,
            Self::FixedPrecision { .. } | Self::FixedAccuracy { .. } | Self::Reversible => {
                f64::from(kind.bits() + 1)
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedRate { rate } => write!(f, "fixed-rate({rate})"),
            Self::FixedPrecision { precision } => write!(f, "fixed-precision({precision})"),
            Self::FixedAccuracy { tolerance } => write!(f, "fixed-accuracy({tolerance})"),
            Self::Reversible => f.write_str("reversible"),
        }
    }
}

/// Keyword parameters of the call surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModeParameters {
    pub rate: Option<f64>,
    pub precision: Option<u32>,
    pub tolerance: Option<f64>,
}

impl ModeParameters {
    /// Default bits per value for fixed-rate mode
    pub const DEFAULT_RATE: f64 = 8.0;
    /// Default bit planes for fixed-precision mode
    pub const DEFAULT_PRECISION: u32 = 8;
    /// Default absolute error for fixed-accuracy mode
    pub const DEFAULT_TOLERANCE: f64 = 0.001;

    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    #[must_use]
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// The default parameter for `selector`, and nothing else.
    #[must_use]
    pub fn defaults_for(selector: CompressionMode) -> Self {
        let params = Self::default();
        match selector {
            CompressionMode::FixedRate => params.with_rate(Self::DEFAULT_RATE),
            CompressionMode::FixedPrecision => params.with_precision(Self::DEFAULT_PRECISION),
            CompressionMode::FixedAccuracy => params.with_tolerance(Self::DEFAULT_TOLERANCE),
            CompressionMode::Reversible => params,
        }
    }
}
