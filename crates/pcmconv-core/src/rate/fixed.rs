//! Fixed-ratio rate stages and fixed-point helpers
//!
//! Doubling and halving share one half-band low-pass. Doubling keeps every
//! input sample as an even output and interpolates the odd outputs from
//! the odd taps; halving keeps every other output of the full filter.

use super::engine::{RateKernel, Walk};
use super::tables::{COEFF_SHIFT, HALF_BAND, HALF_BAND_SHIFT};

/// Saturate a 64-bit value to the 16-bit range
pub fn saturate(value: i64) -> i16 {
    value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Q14 dot product with rounding and saturation
pub fn dot_q14(coefficients: &[i16], field: &[i16]) -> i16 {
    let acc: i64 = coefficients
        .iter()
        .zip(field.iter())
        .map(|(&c, &x)| c as i64 * x as i64)
        .sum();
    saturate((acc + (1 << (COEFF_SHIFT - 1))) >> COEFF_SHIFT)
}

/// Attenuate by 5 dB (`38084 / 65536`)
pub fn minus_5db(value: i16) -> i16 {
    ((value as i32 * 38084) >> 16) as i16
}

/// Half-band taps reach this far on either side of the centre
const HALF_BAND_REACH: usize = 2 * HALF_BAND.len() - 1;

/// Doubles the sample rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleRate;

impl RateKernel for DoubleRate {
    fn period(&self) -> (usize, usize) {
        (2, 1)
    }

    fn step(&self, phase: usize) -> usize {
        phase
    }

    fn reach(&self) -> (usize, usize) {
        (HALF_BAND.len() - 1, HALF_BAND.len())
    }

    fn walk(&self) -> Walk {
        Walk::Backward
    }

    fn convolve(&self, phase: usize, field: &[i16]) -> i16 {
        let centre = HALF_BAND.len() - 1;
        if phase == 0 {
            return field[centre];
        }
        let mut acc = 0i64;
        for (k, &tap) in HALF_BAND.iter().enumerate() {
            let pair = field[centre - k] as i64 + field[centre + 1 + k] as i64;
            acc += tap as i64 * pair;
        }
        saturate((acc + (1 << (HALF_BAND_SHIFT - 1))) >> HALF_BAND_SHIFT)
    }
}

/// Halves the sample rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HalfRate;

impl RateKernel for HalfRate {
    fn period(&self) -> (usize, usize) {
        (1, 2)
    }

    fn step(&self, _phase: usize) -> usize {
        2
    }

    fn reach(&self) -> (usize, usize) {
        (HALF_BAND_REACH, HALF_BAND_REACH)
    }

    fn walk(&self) -> Walk {
        Walk::Forward
    }

    fn convolve(&self, _phase: usize, field: &[i16]) -> i16 {
        let centre = HALF_BAND_REACH;
        let mut acc = (1i64 << HALF_BAND_SHIFT) * field[centre] as i64;
        for (k, &tap) in HALF_BAND.iter().enumerate() {
            let d = 2 * k + 1;
            acc += tap as i64 * (field[centre - d] as i64 + field[centre + d] as i64);
        }
        saturate((acc + (1 << HALF_BAND_SHIFT)) >> (HALF_BAND_SHIFT + 1))
    }
}
