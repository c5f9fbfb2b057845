//! Plain-vanilla option contract: side, strike, expiry, exercise rights.
//!
//! Validation accepts `expiry == 0` (intrinsic-value edge case) and requires Bermudan
//! exercise dates to lie in `(0, expiry]`.

use crate::core::{ExerciseStyle, FdError, Instrument, OptionType};

/// Vanilla option contract.
///
/// # Examples
/// ```
/// use ferric_fd::core::{ExerciseStyle, OptionType};
/// use ferric_fd::instruments::VanillaOption;
///
/// let option = VanillaOption {
///     option_type: OptionType::Put,
///     strike: 100.0,
///     expiry: 1.0,
///     exercise: ExerciseStyle::Bermudan { dates: vec![0.5, 1.0] },
/// };
/// assert!(option.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VanillaOption {
    /// Call or put.
    pub option_type: OptionType,
    /// Strike level.
    pub strike: f64,
    /// Expiry in years.
    pub expiry: f64,
    /// Exercise style.
    pub exercise: ExerciseStyle,
}

impl VanillaOption {
    pub fn european_call(strike: f64, expiry: f64) -> Self {
        Self {
            option_type: OptionType::Call,
            strike,
            expiry,
            exercise: ExerciseStyle::European,
        }
    }

    pub fn european_put(strike: f64, expiry: f64) -> Self {
        Self {
            option_type: OptionType::Put,
            strike,
            expiry,
            exercise: ExerciseStyle::European,
        }
    }

    pub fn american_call(strike: f64, expiry: f64) -> Self {
        Self {
            option_type: OptionType::Call,
            strike,
            expiry,
            exercise: ExerciseStyle::American,
        }
    }

    pub fn american_put(strike: f64, expiry: f64) -> Self {
        Self {
            option_type: OptionType::Put,
            strike,
            expiry,
            exercise: ExerciseStyle::American,
        }
    }

    /// Validates instrument fields.
    ///
    /// # Errors
    /// Returns [`FdError::InvalidInput`] when:
    /// - `strike <= 0`
    /// - `expiry < 0`
    /// - Bermudan exercise dates are empty or outside `(0, expiry]`
    pub fn validate(&self) -> Result<(), FdError> {
        if self.strike <= 0.0 || !self.strike.is_finite() {
            return Err(FdError::InvalidInput(
                "vanilla strike must be finite and > 0".to_string(),
            ));
        }
        if self.expiry < 0.0 || !self.expiry.is_finite() {
            return Err(FdError::InvalidInput(
                "vanilla expiry must be finite and >= 0".to_string(),
            ));
        }

        if let ExerciseStyle::Bermudan { dates } = &self.exercise {
            if dates.is_empty() {
                return Err(FdError::InvalidInput(
                    "bermudan exercise dates cannot be empty".to_string(),
                ));
            }
            if dates.iter().any(|&d| d <= 0.0 || d > self.expiry || d.is_nan()) {
                return Err(FdError::InvalidInput(
                    "bermudan exercise dates must lie in (0, expiry]".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl Instrument for VanillaOption {
    fn instrument_type(&self) -> &str {
        "VanillaOption"
    }
}
