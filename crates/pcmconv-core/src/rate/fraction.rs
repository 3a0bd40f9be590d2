//! Rational approximation of resampling ratios

use super::tables::FRACTION_CANDIDATES;
use std::fmt;

/// Smallest ratio the approximator accepts
pub const MIN_RATIO: f64 = 31.0 / 64.0;

/// Largest ratio the approximator accepts
pub const MAX_RATIO: f64 = 64.0 / 31.0;

/// A small fraction `numerator / denominator` with `denominator <= 16`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fraction {
    /// Numerator
    pub numerator: u32,
    /// Denominator, 1 to 16
    pub denominator: u32,
}

impl Fraction {
    /// Find the candidate closest to `x`
    ///
    /// Closeness is the symmetric score `min(q/x, x/q)` where `q` is the
    /// candidate's value; a later candidate replaces the current best only
    /// when it scores strictly higher, so ties keep the smaller denominator.
    /// Returns `None` when `x` lies outside `[31/64, 64/31]`.
    pub fn approximate(x: f64) -> Option<Fraction> {
        if !(MIN_RATIO..=MAX_RATIO).contains(&x) {
            return None;
        }

        let mut best = None;
        let mut best_score = 0.0f64;
        for &(numerator, denominator) in FRACTION_CANDIDATES.iter() {
            let q = numerator as f64 / denominator as f64;
            let score = (q / x).min(x / q);
            if score > best_score {
                best_score = score;
                best = Some(Fraction {
                    numerator,
                    denominator,
                });
            }
        }
        best
    }

    /// Value of the fraction
    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Relative error against `x`
    pub fn relative_error(&self, x: f64) -> f64 {
        (self.value() - x).abs() / x
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
