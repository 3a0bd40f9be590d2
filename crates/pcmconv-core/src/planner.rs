//! Pipeline planner
//!
//! Turns a source and destination [`AudioSpec`] into the ordered stage
//! list of a [`ConversionPlan`]. Rate changes always run on signed 16-bit
//! host-order samples with the smaller of the two channel counts; the
//! format chains on either side get the samples into and out of that
//! intermediate format.

use crate::adapter::{Adapter, Growth};
use crate::error::PlanError;
use crate::plan::ConversionPlan;
use crate::rate::engine::RateKernel;
use crate::rate::filter::{Direction, PolyphaseFilter};
use crate::rate::fixed::{DoubleRate, HalfRate};
use crate::rate::fraction::{MAX_RATIO, MIN_RATIO};
use crate::types::{AudioSpec, ByteOrder, Channels, SampleWidth, MAX_RATE, MIN_RATE};
use tracing::debug;

/// Sample encoding and layout, without the rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shape {
    width: SampleWidth,
    signed: bool,
    order: ByteOrder,
    channels: u8,
}

impl Shape {
    fn of(spec: &AudioSpec) -> Self {
        Self {
            width: spec.width(),
            signed: spec.is_signed(),
            order: spec.byte_order(),
            channels: spec.channels(),
        }
    }

    fn s16_system(channels: u8) -> Self {
        Self {
            width: SampleWidth::Bits16,
            signed: true,
            order: ByteOrder::SYSTEM,
            channels,
        }
    }
}

/// Stage list under construction with its size budget
#[derive(Debug)]
struct Builder {
    stages: Vec<Adapter>,
    size: f64,
    peak: f64,
    headroom: usize,
}

impl Builder {
    fn new() -> Self {
        Self {
            stages: Vec::new(),
            size: 1.0,
            peak: 1.0,
            headroom: 0,
        }
    }

    fn push(&mut self, adapter: Adapter) {
        match adapter.growth() {
            Growth::Double => {
                self.size *= 2.0;
                self.headroom *= 2;
            }
            Growth::Halve => self.size /= 2.0,
            Growth::Same => {}
        }
        self.peak = self.peak.max(self.size);
        self.stages.push(adapter);
    }

    /// Append a rate stage and reserve the outputs its edge ramps add
    fn push_rate(&mut self, adapter: Adapter, kernel: &dyn RateKernel, channels: Channels) {
        self.push(adapter);
        self.headroom += kernel.ramp_len() * channels.count();
    }

    fn push_format_chain(&mut self, from: Shape, to: Shape) {
        if from == to {
            return;
        }

        let mut cur = from;
        if cur.width == SampleWidth::Float32 {
            self.push(Adapter::CutFloatTo16);
            cur = Shape::s16_system(cur.channels);
        }

        // Float targets are reached through signed 16-bit host order
        let target = if to.width == SampleWidth::Float32 {
            Shape::s16_system(to.channels)
        } else {
            to
        };

        if cur.width == SampleWidth::Bits8 && target.width == SampleWidth::Bits16 {
            if target.order.is_system() {
                self.push(Adapter::Widen8To16System);
            } else {
                self.push(Adapter::Widen8To16Swapped);
            }
            cur.width = SampleWidth::Bits16;
            cur.order = target.order;
        }

        if target.width == SampleWidth::Bits16 {
            self.push_16bit_section(&mut cur, target);
        } else {
            if cur.width == SampleWidth::Bits16 {
                if cur.order.is_system() {
                    self.push(Adapter::Narrow16SystemTo8);
                } else {
                    self.push(Adapter::Narrow16SwappedTo8);
                }
                cur.width = SampleWidth::Bits8;
                cur.order = ByteOrder::SYSTEM;
            }
            self.push_8bit_section(&mut cur, target);
        }

        if to.width == SampleWidth::Float32 {
            self.push(Adapter::Expand16ToFloat);
        }
    }

    fn push_16bit_section(&mut self, cur: &mut Shape, target: Shape) {
        if cur.channels == 2 && target.channels == 1 {
            if !cur.order.is_system() {
                self.push(Adapter::SwapBytes16);
            }
            if cur.signed {
                self.push(Adapter::StereoToMonoS16);
            } else {
                self.push(Adapter::StereoToMonoU16);
            }
            if !target.order.is_system() {
                self.push(Adapter::SwapBytes16);
            }
            cur.order = target.order;
            cur.channels = 1;
        } else if cur.order != target.order {
            self.push(Adapter::SwapBytes16);
            cur.order = target.order;
        }

        if cur.signed != target.signed {
            if target.order.is_system() {
                self.push(Adapter::FlipSign16System);
            } else {
                self.push(Adapter::FlipSign16Swapped);
            }
            cur.signed = target.signed;
        }

        if cur.channels == 1 && target.channels == 2 {
            self.push(Adapter::MonoToStereo16);
            cur.channels = 2;
        }
    }

    fn push_8bit_section(&mut self, cur: &mut Shape, target: Shape) {
        if cur.channels == 2 && target.channels == 1 {
            if cur.signed {
                self.push(Adapter::StereoToMonoS8);
            } else {
                self.push(Adapter::StereoToMonoU8);
            }
            cur.channels = 1;
        }

        if cur.signed != target.signed {
            self.push(Adapter::FlipSign8);
            cur.signed = target.signed;
        }

        if cur.channels == 1 && target.channels == 2 {
            self.push(Adapter::MonoToStereo8);
            cur.channels = 2;
        }
    }

    /// Append the rate stages for `src_rate -> dst_rate`
    fn push_rate_chain(
        &mut self,
        src_rate: u32,
        dst_rate: u32,
        channels: Channels,
    ) -> Result<Option<PolyphaseFilter>, PlanError> {
        let (high, low) = (src_rate.max(dst_rate), src_rate.min(dst_rate));
        if high % low == 0 && (high / low).is_power_of_two() {
            let octaves = (high / low).trailing_zeros();
            for _ in 0..octaves {
                if dst_rate > src_rate {
                    self.push_rate(Adapter::DoubleRate(channels), &DoubleRate, channels);
                } else {
                    self.push_rate(Adapter::HalfRate(channels), &HalfRate, channels);
                }
            }
            return Ok(None);
        }

        let mut ratio = dst_rate as f64 / src_rate as f64;
        if ratio > 1.0 {
            let mut octaves = 0;
            while ratio > MAX_RATIO {
                octaves += 1;
                ratio /= 2.0;
            }
            let filter = PolyphaseFilter::design(ratio, Direction::Upsample)?;
            self.push_rate(Adapter::IncreaseRate(channels), &filter, channels);
            for _ in 0..octaves {
                self.push_rate(Adapter::DoubleRate(channels), &DoubleRate, channels);
            }
            Ok(Some(filter))
        } else {
            self.push(Adapter::Minus5dB);
            let mut octaves = 0;
            while ratio < MIN_RATIO {
                octaves += 1;
                ratio *= 2.0;
            }
            let filter = PolyphaseFilter::design(ratio, Direction::Downsample)?;
            for _ in 0..octaves {
                self.push_rate(Adapter::HalfRate(channels), &HalfRate, channels);
            }
            self.push_rate(Adapter::DecreaseRate(channels), &filter, channels);
            Ok(Some(filter))
        }
    }
}

fn check_channels(spec: &AudioSpec) -> Result<(), PlanError> {
    match Channels::from_count(spec.channels()) {
        Some(_) => Ok(()),
        None => Err(PlanError::UnsupportedChannelCount {
            channels: spec.channels(),
        }),
    }
}

fn check_rate(spec: &AudioSpec) -> Result<(), PlanError> {
    if (MIN_RATE..=MAX_RATE).contains(&spec.rate()) {
        Ok(())
    } else {
        Err(PlanError::RateOutOfRange {
            rate: spec.rate(),
            min: MIN_RATE,
            max: MAX_RATE,
        })
    }
}

/// Smallest block a stream through `stages` can accept
///
/// Walks the rate stages from last to first: each stage needs its own
/// history, and enough input to hand the next stage what that one needs.
fn min_stream_frames(stages: &[Adapter], filter: Option<&PolyphaseFilter>) -> usize {
    let mut need = 0usize;
    for stage in stages.iter().rev() {
        if let Some(kernel) = stage.kernel(filter) {
            let (outputs, inputs) = kernel.period();
            let (_, after) = kernel.reach();
            let feed = ((need + 1) * inputs + outputs - 1) / outputs + after + 1;
            need = feed.max(kernel.history_len());
        }
    }
    need
}

/// Build the plan converting `src` into `dst`
///
/// # Errors
///
/// Returns [`PlanError::UnsupportedChannelCount`] or
/// [`PlanError::RateOutOfRange`] when either spec is outside the supported
/// range. No partial plan is ever returned.
pub fn plan(src: &AudioSpec, dst: &AudioSpec) -> Result<ConversionPlan, PlanError> {
    check_channels(src)?;
    check_channels(dst)?;
    check_rate(src)?;
    check_rate(dst)?;

    let mut builder = Builder::new();
    let mut filter = None;

    if src.rate() == dst.rate() {
        builder.push_format_chain(Shape::of(src), Shape::of(dst));
    } else {
        let intermediate = Shape::s16_system(src.channels().min(dst.channels()));
        let channels = if src.channels() == 2 && dst.channels() == 2 {
            Channels::Stereo
        } else {
            Channels::Mono
        };

        builder.push_format_chain(Shape::of(src), intermediate);
        filter = builder.push_rate_chain(src.rate(), dst.rate(), channels)?;
        builder.push_format_chain(intermediate, Shape::of(dst));

        if let Some(f) = &filter {
            debug!(
                ratio = dst.rate() as f64 / src.rate() as f64,
                fraction = %f.fraction(),
                direction = ?f.direction(),
                "designed polyphase filter"
            );
        }
    }

    let min_frames = min_stream_frames(&builder.stages, filter.as_ref());
    let names: Vec<&str> = builder.stages.iter().map(|s| s.name()).collect();
    debug!(
        src = %src,
        dst = %dst,
        stages = ?names,
        size_multiplier = builder.size,
        peak_multiplier = builder.peak,
        headroom = builder.headroom,
        "built conversion plan"
    );

    Ok(ConversionPlan::from_parts(
        *src,
        *dst,
        builder.stages,
        builder.size,
        builder.peak,
        builder.headroom,
        filter,
        min_frames,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleFormat;

    fn stages(src: AudioSpec, dst: AudioSpec) -> Vec<Adapter> {
        plan(&src, &dst).unwrap().stages().to_vec()
    }

    fn spec(format: SampleFormat, channels: u8, rate: u32) -> AudioSpec {
        AudioSpec::new(format, channels, rate)
    }

    #[test]
    fn test_identity() {
        for format in SampleFormat::ALL {
            for channels in 1..=2 {
                let s = spec(format, channels, 22050);
                let p = plan(&s, &s).unwrap();
                assert!(p.is_identity());
                assert_eq!(p.size_multiplier(), 1.0);
            }
        }
    }

    #[test]
    fn test_u8_mono_to_s16_stereo() {
        let p = plan(
            &spec(SampleFormat::U8, 1, 8000),
            &spec(SampleFormat::S16_SYSTEM, 2, 8000),
        )
        .unwrap();
        assert_eq!(
            p.stages(),
            &[
                Adapter::Widen8To16System,
                Adapter::FlipSign16System,
                Adapter::MonoToStereo16
            ]
        );
        assert_eq!(p.size_multiplier(), 4.0);
    }

    #[test]
    fn test_exact_half_uses_half_rate_only() {
        let p = plan(
            &spec(SampleFormat::S16_SYSTEM, 1, 44100),
            &spec(SampleFormat::S16_SYSTEM, 1, 22050),
        )
        .unwrap();
        assert_eq!(p.stages(), &[Adapter::HalfRate(Channels::Mono)]);
        assert!(p.filter().is_none());
    }

    #[test]
    fn test_exact_quadruple_uses_doublers_only() {
        let got = stages(
            spec(SampleFormat::S16_SYSTEM, 2, 8000),
            spec(SampleFormat::S16_SYSTEM, 2, 32000),
        );
        assert_eq!(
            got,
            vec![Adapter::DoubleRate(Channels::Stereo), Adapter::DoubleRate(Channels::Stereo)]
        );
    }

    #[test]
    fn test_upsample_reserves_increase_first() {
        let p = plan(
            &spec(SampleFormat::S16_SYSTEM, 1, 8000),
            &spec(SampleFormat::S16_SYSTEM, 1, 44100),
        )
        .unwrap();
        assert_eq!(
            p.stages(),
            &[
                Adapter::IncreaseRate(Channels::Mono),
                Adapter::DoubleRate(Channels::Mono),
                Adapter::DoubleRate(Channels::Mono)
            ]
        );
        let filter = p.filter().unwrap();
        assert_eq!(filter.direction(), Direction::Upsample);
        assert_eq!((filter.numerator(), filter.denominator()), (8, 11));
    }

    #[test]
    fn test_downsample_attenuates_first() {
        let p = plan(
            &spec(SampleFormat::S16_SYSTEM, 2, 48000),
            &spec(SampleFormat::S16_SYSTEM, 2, 8000),
        )
        .unwrap();
        assert_eq!(
            p.stages(),
            &[
                Adapter::Minus5dB,
                Adapter::HalfRate(Channels::Stereo),
                Adapter::HalfRate(Channels::Stereo),
                Adapter::DecreaseRate(Channels::Stereo)
            ]
        );
        assert_eq!(p.filter().unwrap().direction(), Direction::Downsample);
    }

    #[test]
    fn test_rate_change_uses_intermediate_format() {
        let got = stages(
            spec(SampleFormat::U16Msb, 2, 11025),
            spec(SampleFormat::U8, 1, 22050),
        );
        let mut expected = Vec::new();
        if !ByteOrder::Big.is_system() {
            expected.push(Adapter::SwapBytes16);
        }
        expected.extend([
            Adapter::StereoToMonoU16,
            Adapter::FlipSign16System,
            Adapter::DoubleRate(Channels::Mono),
            Adapter::Narrow16SystemTo8,
            Adapter::FlipSign8,
        ]);
        assert_eq!(got, expected);
    }

    #[test]
    fn test_float_chains() {
        let got = stages(
            spec(SampleFormat::F32, 1, 16000),
            spec(SampleFormat::F32, 2, 16000),
        );
        assert_eq!(
            got,
            vec![Adapter::CutFloatTo16, Adapter::MonoToStereo16, Adapter::Expand16ToFloat]
        );

        let got = stages(
            spec(SampleFormat::S8, 2, 16000),
            spec(SampleFormat::F32, 1, 16000),
        );
        assert_eq!(
            got,
            vec![Adapter::Widen8To16System, Adapter::StereoToMonoS16, Adapter::Expand16ToFloat]
        );
    }

    #[test]
    fn test_swapped_target_variants() {
        let swapped = if ByteOrder::SYSTEM == ByteOrder::Little {
            SampleFormat::U16Msb
        } else {
            SampleFormat::U16Lsb
        };
        let got = stages(spec(SampleFormat::S8, 1, 8000), spec(swapped, 1, 8000));
        assert_eq!(got, vec![Adapter::Widen8To16Swapped, Adapter::FlipSign16Swapped]);

        let got = stages(spec(swapped, 2, 8000), spec(SampleFormat::U8, 2, 8000));
        assert_eq!(got, vec![Adapter::Narrow16SwappedTo8]);
    }

    #[test]
    fn test_budget_tracks_peak() {
        let p = plan(
            &spec(SampleFormat::U8, 2, 8000),
            &spec(SampleFormat::U8, 1, 16000),
        )
        .unwrap();
        // widen x2, stereo->mono x1/2, double x2, narrow x1/2
        assert_eq!(p.size_multiplier(), 1.0);
        assert_eq!(p.peak_multiplier(), 2.0);
        assert_eq!(p.headroom_samples(), DoubleRate.ramp_len());
    }

    #[test]
    fn test_headroom_covers_every_rate_stage() {
        // Each doubler doubles what came before and adds its own ramp
        let p = plan(
            &spec(SampleFormat::S16_SYSTEM, 2, 8000),
            &spec(SampleFormat::S16_SYSTEM, 2, 32000),
        )
        .unwrap();
        assert_eq!(p.headroom_samples(), (2 * 62 + 62) * 2);

        // Down stages reserve their ramps too
        let p = plan(
            &spec(SampleFormat::S16_SYSTEM, 1, 48000),
            &spec(SampleFormat::S16_SYSTEM, 1, 8000),
        )
        .unwrap();
        let filter = p.filter().unwrap();
        assert_eq!(p.headroom_samples(), 2 * HalfRate.ramp_len() + filter.ramp_len());

        let p = plan(
            &spec(SampleFormat::S16_SYSTEM, 1, 8000),
            &spec(SampleFormat::U8, 2, 11025),
        )
        .unwrap();
        // the mono-to-stereo stage after the rate change doubles the reserve
        assert_eq!(p.headroom_samples(), 2 * p.filter().unwrap().ramp_len());
    }

    #[test]
    fn test_rejects_bad_specs() {
        let ok = spec(SampleFormat::S16Lsb, 2, 44100);
        assert_eq!(
            plan(&spec(SampleFormat::S16Lsb, 6, 44100), &ok).unwrap_err(),
            PlanError::UnsupportedChannelCount { channels: 6 }
        );
        assert_eq!(
            plan(&ok, &spec(SampleFormat::S16Lsb, 0, 44100)).unwrap_err(),
            PlanError::UnsupportedChannelCount { channels: 0 }
        );
        assert!(matches!(
            plan(&spec(SampleFormat::S16Lsb, 2, 0), &ok),
            Err(PlanError::RateOutOfRange { rate: 0, .. })
        ));
        assert!(matches!(
            plan(&ok, &spec(SampleFormat::S16Lsb, 2, MAX_RATE + 1)),
            Err(PlanError::RateOutOfRange { .. })
        ));
        // Equal rates are still range checked
        let zero = spec(SampleFormat::S16Lsb, 2, 0);
        assert!(plan(&zero, &zero).is_err());
    }

    #[test]
    fn test_extreme_ratio() {
        let p = plan(
            &spec(SampleFormat::S16_SYSTEM, 1, 1),
            &spec(SampleFormat::S16_SYSTEM, 1, MAX_RATE - 1),
        )
        .unwrap();
        let doublers = p
            .stages()
            .iter()
            .filter(|s| matches!(s, Adapter::DoubleRate(_)))
            .count();
        assert_eq!(doublers, 17);
        assert_eq!(p.stages()[0], Adapter::IncreaseRate(Channels::Mono));
    }

    #[test]
    fn test_min_stream_frames() {
        let p = plan(
            &spec(SampleFormat::S16_SYSTEM, 1, 44100),
            &spec(SampleFormat::S16_SYSTEM, 1, 22050),
        )
        .unwrap();
        // One half-rate stage: max(62, ceil(2) + 31 + 1)
        assert_eq!(p.min_stream_frames(), 62);

        let p = plan(
            &spec(SampleFormat::S16_SYSTEM, 1, 8000),
            &spec(SampleFormat::S16_SYSTEM, 1, 8000),
        )
        .unwrap();
        assert_eq!(p.min_stream_frames(), 0);
    }
}
