//! Polyphase filter designer
//!
//! Designs the windowed-sinc filter bank used by the arbitrary-ratio rate
//! stages. The input step per output, `1 / ratio`, is approximated by a
//! small fraction `num / den`; the bank then has `den` phases, and one
//! period of it emits `den` outputs while consuming exactly `num` inputs.

use super::engine::{RateKernel, Walk};
use super::fixed::dot_q14;
use super::fraction::{Fraction, MAX_RATIO, MIN_RATIO};
use super::tables::{COEFF_SHIFT, FILTER_HALF_LENGTH, FILTER_LENGTH, KAISER_HALF_WINDOW};
use crate::error::PlanError;
use once_cell::sync::Lazy;
use std::f64::consts::PI;
use std::fmt;

/// Gain applied to upsampling filters
pub const UPSAMPLE_SCALE: f64 = 1.0;

/// Gain applied to downsampling filters; undoes the -5 dB stage that
/// precedes every downsampling chain
pub const DOWNSAMPLE_SCALE: f64 = 65536.0 / 38084.0;

/// 128-point window built from the Kaiser half window
static TAPER: Lazy<[f64; FILTER_LENGTH]> = Lazy::new(|| {
    let mut taper = [0.0; FILTER_LENGTH];
    for (k, &w) in KAISER_HALF_WINDOW.iter().enumerate() {
        let value = w as f64 * (k + 1) as f64;
        taper[k] = value;
        taper[FILTER_LENGTH - 1 - k] = value;
    }
    taper
});

/// Build the taper table ahead of the first filter design
pub fn init_tables() {
    Lazy::force(&TAPER);
}

/// Resampling direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Output rate above input rate
    Upsample,
    /// Output rate below input rate
    Downsample,
}

impl Direction {
    /// Gain constant of this direction
    pub fn scale(self) -> f64 {
        match self {
            Self::Upsample => UPSAMPLE_SCALE,
            Self::Downsample => DOWNSAMPLE_SCALE,
        }
    }
}

/// One phase of a polyphase filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPhase {
    /// Q14 taps; tap `k` weighs the input `k - 63` samples from the base
    pub coefficients: [i16; FILTER_LENGTH],
    /// Inputs consumed after this phase
    pub step: usize,
}

/// A bank of windowed-sinc filters for one resampling ratio
#[derive(Debug, Clone, PartialEq)]
pub struct PolyphaseFilter {
    ratio: f64,
    fraction: Fraction,
    direction: Direction,
    phases: Vec<FilterPhase>,
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        x.sin() / x
    }
}

impl PolyphaseFilter {
    /// Design a filter for `ratio = dst_rate / src_rate`
    ///
    /// The ratio must lie in `[31/64, 64/31]` and on the side of 1 that
    /// matches `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::RatioOutOfRange`] otherwise.
    pub fn design(ratio: f64, direction: Direction) -> Result<Self, PlanError> {
        let in_range = (MIN_RATIO..=MAX_RATIO).contains(&ratio);
        let matches_direction = match direction {
            Direction::Upsample => ratio >= 1.0,
            Direction::Downsample => ratio <= 1.0,
        };
        if !in_range || !matches_direction {
            return Err(PlanError::RatioOutOfRange { ratio });
        }

        let fraction = Fraction::approximate((1.0 / ratio).clamp(MIN_RATIO, MAX_RATIO))
            .ok_or(PlanError::RatioOutOfRange { ratio })?;
        let num = fraction.numerator as usize;
        let den = fraction.denominator as usize;

        // Cutoff per sample of the faster side
        let fg = -0.018 + 0.5 * ratio.min(1.0 / ratio);
        let omega = 2.0 * PI * fg;
        let spacing = match direction {
            Direction::Upsample => ratio,
            Direction::Downsample => 1.0,
        };
        let gain = direction.scale() * (1u32 << COEFF_SHIFT) as f64;
        let centre = (FILTER_HALF_LENGTH - 1) as f64;

        let mut phases = Vec::with_capacity(den);
        let mut acc = 0usize;
        for _ in 0..den {
            let offset = acc as f64 / den as f64;
            acc += num;
            let step = acc / den;
            acc %= den;

            let mut taps = [0.0f64; FILTER_LENGTH];
            for (k, tap) in taps.iter_mut().enumerate() {
                let distance = (k as f64 - centre - offset) * spacing;
                *tap = TAPER[k] * sinc(omega * distance);
            }
            let dc: f64 = taps.iter().sum();

            let mut coefficients = [0i16; FILTER_LENGTH];
            for (c, t) in coefficients.iter_mut().zip(taps.iter()) {
                let q = (t / dc * gain).round();
                *c = q.clamp(i16::MIN as f64, i16::MAX as f64) as i16;
            }
            phases.push(FilterPhase { coefficients, step });
        }

        Ok(Self {
            ratio,
            fraction,
            direction,
            phases,
        })
    }

    /// Requested ratio
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Approximated input step per output
    pub fn fraction(&self) -> Fraction {
        self.fraction
    }

    /// Number of phases (the fraction's denominator)
    pub fn denominator(&self) -> usize {
        self.phases.len()
    }

    /// Inputs consumed per period (the fraction's numerator)
    pub fn numerator(&self) -> usize {
        self.fraction.numerator as usize
    }

    /// Resampling direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Filter phases in schedule order
    pub fn phases(&self) -> &[FilterPhase] {
        &self.phases
    }
}

impl RateKernel for PolyphaseFilter {
    fn period(&self) -> (usize, usize) {
        (self.denominator(), self.numerator())
    }

    fn step(&self, phase: usize) -> usize {
        self.phases[phase].step
    }

    fn reach(&self) -> (usize, usize) {
        (FILTER_HALF_LENGTH - 1, FILTER_HALF_LENGTH)
    }

    fn walk(&self) -> Walk {
        match self.direction {
            Direction::Upsample => Walk::Backward,
            Direction::Downsample => Walk::Forward,
        }
    }

    fn convolve(&self, phase: usize, field: &[i16]) -> i16 {
        dot_q14(&self.phases[phase].coefficients, field)
    }
}

impl fmt::Display for PolyphaseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.phases.iter().map(|p| p.step.to_string()).collect();
        write!(
            f,
            "{:?} ratio {:.6}, step {} ({} phases, steps [{}])",
            self.direction,
            self.ratio,
            self.fraction,
            self.phases.len(),
            steps.join(",")
        )
    }
}
