//! Labour productivity damage response to humid heat stress
//!
//! Maps hourly Wet Bulb Globe Temperature (°C) to fractional labour
//! productivity loss in [0, 1] for three physical work-intensity classes.
//! The response is a Gaussian cumulative distribution in WBGT,
//!
//! `loss = 0.5 · (1 + erf((wbgt − ω) / (μ·√2)))`
//!
//! with class-specific midpoint ω and width μ, clipped to exactly 0 below a
//! class onset threshold and exactly 1 at the class saturation threshold.
//! All class parameters live in one configuration table.
//!
//! # Scientific References
//! - Roson, R. & Sartori, M. (2016). "Estimation of climate change damage
//!   functions for 140 regions in the GTAP 9 database"
//! - ILO (2019). "Working on a warmer planet: The impact of heat stress on
//!   labour productivity and decent work"
//! - Kjellstrom, T. et al. (2009). "Workplace heat stress, health and
//!   productivity" Global Health Action, 2(1)
//! - Kompas, T. et al. (2018). "The effects of climate change on GDP by
//!   country and the global economic gains from complying with the Paris
//!   Climate Accord" Earth's Future, 6(8)

use crate::core_types::units::{Celsius, Fraction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest physically plausible WBGT accepted as input (°C)
pub const WBGT_MIN: f64 = -10.0;

/// Highest physically plausible WBGT accepted as input (°C)
pub const WBGT_MAX: f64 = 60.0;

/// Physical work-intensity class selecting the applicable response curve
///
/// Fixed set of exactly three classes. Heavier exertion loses productivity
/// at lower heat stress, so the class picks the curve midpoint and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityClass {
    /// Light physical work (office, services)
    Low = 0,
    /// Moderate physical work (manufacturing, light outdoor)
    Medium = 1,
    /// Heavy physical work (construction, agriculture)
    High = 2,
}

impl IntensityClass {
    /// All classes in ascending exertion order
    pub const ALL: [IntensityClass; 3] = [
        IntensityClass::Low,
        IntensityClass::Medium,
        IntensityClass::High,
    ];

    /// Output dataset variable name for this class
    #[must_use]
    pub fn output_variable(self) -> &'static str {
        match self {
            IntensityClass::Low => "productivity_loss_low",
            IntensityClass::Medium => "productivity_loss_medium",
            IntensityClass::High => "productivity_loss_high",
        }
    }

    /// Human-readable long name for output variable attributes
    #[must_use]
    pub fn long_name(self) -> &'static str {
        match self {
            IntensityClass::Low => "Labour productivity loss (low physical intensity)",
            IntensityClass::Medium => "Labour productivity loss (medium physical intensity)",
            IntensityClass::High => "Labour productivity loss (high physical intensity)",
        }
    }
}

impl fmt::Display for IntensityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntensityClass::Low => "low",
            IntensityClass::Medium => "medium",
            IntensityClass::High => "high",
        };
        write!(f, "{name}")
    }
}

/// Error for an intensity class name that is not one of low/medium/high
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClassError {
    /// The rejected class name
    pub input: String,
}

impl fmt::Display for UnknownClassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unrecognized intensity class '{}' (expected low, medium or high)",
            self.input
        )
    }
}

impl std::error::Error for UnknownClassError {}

impl FromStr for IntensityClass {
    type Err = UnknownClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(IntensityClass::Low),
            "medium" => Ok(IntensityClass::Medium),
            "high" => Ok(IntensityClass::High),
            _ => Err(UnknownClassError {
                input: s.to_string(),
            }),
        }
    }
}

/// Response curve parameters for one work-intensity class
///
/// The curve is the Gaussian CDF `Φ((wbgt − omega) / mu)` clipped to exactly
/// 0 at or below `onset` and exactly 1 at or above `saturation`. The clip
/// points sit at `omega ∓ 4·mu`, where the raw response is within 3.2e-5 of
/// its asymptote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageCurve {
    /// Curve midpoint: WBGT at which half the productivity is lost (°C)
    pub omega: Celsius,
    /// Curve width: standard deviation of the response in WBGT (°C)
    pub mu: f64,
    /// Onset threshold: loss is exactly 0 at or below this WBGT (°C)
    pub onset: Celsius,
    /// Saturation threshold: loss is exactly 1 at or above this WBGT (°C)
    pub saturation: Celsius,
}

/// Curve table indexed by `IntensityClass` discriminant.
///
/// Midpoints and widths are the IGR damage-function calibration used for the
/// Treasury delivery; onset/saturation are the midpoints shifted by four
/// widths, written out so the boundary behaviour is visible configuration
/// rather than derived at run time.
const CURVES: [DamageCurve; 3] = [
    // low: ω = 35.5, μ = 3.9
    DamageCurve {
        omega: Celsius::new(35.5),
        mu: 3.9,
        onset: Celsius::new(19.9),
        saturation: Celsius::new(51.1),
    },
    // medium: ω = 33.5, μ = 3.9
    DamageCurve {
        omega: Celsius::new(33.5),
        mu: 3.9,
        onset: Celsius::new(17.9),
        saturation: Celsius::new(49.1),
    },
    // high: ω = 32.5, μ = 4.2
    DamageCurve {
        omega: Celsius::new(32.5),
        mu: 4.2,
        onset: Celsius::new(15.7),
        saturation: Celsius::new(49.3),
    },
];

impl DamageCurve {
    /// Look up the response curve for a work-intensity class
    #[must_use]
    pub fn for_class(class: IntensityClass) -> &'static DamageCurve {
        &CURVES[class as usize]
    }

    /// Evaluate the clipped response for an already-validated WBGT value
    ///
    /// Input must be finite; validation happens in [`estimate_loss`].
    #[must_use]
    pub fn loss(&self, wbgt_degc: f64) -> Fraction {
        if wbgt_degc <= self.onset.value() {
            return Fraction::ZERO;
        }
        if wbgt_degc >= self.saturation.value() {
            return Fraction::ONE;
        }
        let z = (wbgt_degc - self.omega.value()) / self.mu;
        Fraction::clamped(0.5 * (1.0 + libm::erf(z / std::f64::consts::SQRT_2)))
    }
}

/// Error for WBGT input that violates the estimator's input contract
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstimateError {
    /// Input was NaN or infinite
    NotFinite {
        /// The rejected value
        value: f64,
    },
    /// Input was finite but outside the plausible physical range
    OutOfPhysicalRange {
        /// The rejected value (°C)
        value: f64,
    },
}

impl fmt::Display for EstimateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimateError::NotFinite { value } => {
                write!(f, "WBGT input is not finite: {value}")
            }
            EstimateError::OutOfPhysicalRange { value } => {
                write!(
                    f,
                    "WBGT input {value}°C is outside the plausible range \
                     {WBGT_MIN}..{WBGT_MAX}°C"
                )
            }
        }
    }
}

impl std::error::Error for EstimateError {}

/// Check one WBGT value against the estimator's input contract
///
/// # Errors
/// Returns [`EstimateError::NotFinite`] for NaN or infinite input and
/// [`EstimateError::OutOfPhysicalRange`] for finite input outside
/// [`WBGT_MIN`]..=[`WBGT_MAX`].
pub fn validate_wbgt(wbgt_degc: f64) -> Result<(), EstimateError> {
    if !wbgt_degc.is_finite() {
        return Err(EstimateError::NotFinite { value: wbgt_degc });
    }
    if !(WBGT_MIN..=WBGT_MAX).contains(&wbgt_degc) {
        return Err(EstimateError::OutOfPhysicalRange { value: wbgt_degc });
    }
    Ok(())
}

/// Estimate fractional labour productivity loss for one WBGT value
///
/// Applies the class response curve from the configuration table. The result
/// is guaranteed finite and in [0, 1]; higher WBGT never yields lower loss.
///
/// # Errors
/// Returns [`EstimateError::NotFinite`] for NaN or infinite input and
/// [`EstimateError::OutOfPhysicalRange`] for finite input outside
/// [`WBGT_MIN`]..=[`WBGT_MAX`]. Invalid input is never coerced to a loss.
pub fn estimate_loss(wbgt_degc: f64, class: IntensityClass) -> Result<Fraction, EstimateError> {
    validate_wbgt(wbgt_degc)?;
    Ok(DamageCurve::for_class(class).loss(wbgt_degc))
}
