//! Property-based tests for the format adapters and the rational approximator.

use pcmconv_core::format::{
    flip_sign, mono_to_stereo_16, mono_to_stereo_8, stereo_to_mono_s16, stereo_to_mono_s8,
    stereo_to_mono_u16, stereo_to_mono_u8, swap_bytes_16, SIGN_MASK_16_SWAPPED,
    SIGN_MASK_16_SYSTEM, SIGN_MASK_8,
};
use pcmconv_core::rate::{Fraction, MAX_RATIO, MIN_RATIO};
use pcmconv_core::{plan, AudioSpec, SampleFormat};
use proptest::prelude::*;

// =============================================================================
// Involutions
// =============================================================================

proptest! {
    /// Swapping twice restores any even-length buffer
    #[test]
    fn swap_is_involutive(mut data in prop::collection::vec(any::<u8>(), 0..512)) {
        data.truncate(data.len() & !1);
        let original = data.clone();
        let len = data.len();
        swap_bytes_16(&mut data, len);
        swap_bytes_16(&mut data, len);
        prop_assert_eq!(data, original);
    }

    /// Flipping signs twice restores the buffer for every mask
    #[test]
    fn sign_flip_is_involutive(data in prop::collection::vec(any::<u8>(), 0..512)) {
        for mask in [SIGN_MASK_16_SYSTEM, SIGN_MASK_16_SWAPPED, SIGN_MASK_8] {
            let mut buf = data.clone();
            let len = buf.len();
            flip_sign(&mut buf, len, mask);
            flip_sign(&mut buf, len, mask);
            prop_assert_eq!(&buf, &data);
        }
    }

    /// Converting to the other byte order and back is lossless
    #[test]
    fn byte_order_round_trip(samples in prop::collection::vec(any::<i16>(), 0..256)) {
        let there = plan(
            &AudioSpec::new(SampleFormat::S16Lsb, 1, 8000),
            &AudioSpec::new(SampleFormat::U16Msb, 1, 8000),
        ).unwrap();
        let back = plan(
            &AudioSpec::new(SampleFormat::U16Msb, 1, 8000),
            &AudioSpec::new(SampleFormat::S16Lsb, 1, 8000),
        ).unwrap();

        let original: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut buf = original.clone();
        let len = buf.len();
        let len = there.convert(&mut buf, len).unwrap();
        let len = back.convert(&mut buf, len).unwrap();
        prop_assert_eq!(&buf[..len], &original[..]);
    }
}

// =============================================================================
// Channel mapping
// =============================================================================

proptest! {
    /// Mono to stereo and back is exact for 16-bit samples
    #[test]
    fn mono_stereo_round_trip_16(samples in prop::collection::vec(any::<i16>(), 1..128)) {
        let expected: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
        let len = expected.len();
        let mut buf = expected.clone();
        buf.resize(len * 2, 0);

        let stereo = mono_to_stereo_16(&mut buf, len);
        prop_assert_eq!(stereo, len * 2);
        let mut signed = buf.clone();
        prop_assert_eq!(stereo_to_mono_s16(&mut signed, stereo), len);
        prop_assert_eq!(&signed[..len], &expected[..]);

        // unsigned averaging reads the same bits as u16
        let mut unsigned = buf;
        stereo_to_mono_u16(&mut unsigned, stereo);
        prop_assert_eq!(&unsigned[..len], &expected[..]);
    }

    /// Mono to stereo and back is exact for 8-bit samples
    #[test]
    fn mono_stereo_round_trip_8(data in prop::collection::vec(any::<u8>(), 1..128)) {
        let len = data.len();
        let mut buf = data.clone();
        buf.resize(len * 2, 0);
        let stereo = mono_to_stereo_8(&mut buf, len);

        let mut signed = buf.clone();
        prop_assert_eq!(stereo_to_mono_s8(&mut signed, stereo), len);
        prop_assert_eq!(&signed[..len], &data[..]);

        let mut unsigned = buf;
        stereo_to_mono_u8(&mut unsigned, stereo);
        prop_assert_eq!(&unsigned[..len], &data[..]);
    }
}

// =============================================================================
// Rational approximation
// =============================================================================

proptest! {
    /// Every ratio in range gets a close fraction with a small denominator
    #[test]
    fn approximation_is_close(x in MIN_RATIO..=MAX_RATIO) {
        let f = Fraction::approximate(x).unwrap();
        prop_assert!(f.denominator <= 16);
        prop_assert!(f.numerator <= 16);
        prop_assert!(f.relative_error(x) <= 0.033, "{} for {}", f, x);
    }

    /// Ratios outside the range are rejected
    #[test]
    fn approximation_rejects_out_of_range(x in 2.1f64..100.0) {
        prop_assert!(Fraction::approximate(x).is_none());
        prop_assert!(Fraction::approximate(1.0 / x).is_none());
    }
}
