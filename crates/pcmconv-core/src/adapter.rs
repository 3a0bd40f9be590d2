//! Pipeline stages
//!
//! A plan is an ordered list of [`Adapter`]s. Format adapters are plain
//! byte transforms; rate adapters run a [`RateKernel`] over every channel
//! of the 16-bit host-order intermediate format.

use crate::format;
use crate::rate::buffer::{ChannelView, Extension};
use crate::rate::engine::{run_pass, OutputSpan, RateKernel};
use crate::rate::filter::PolyphaseFilter;
use crate::rate::fixed::{DoubleRate, HalfRate};
use crate::stream::StageCarry;
use crate::types::Channels;
use std::fmt;
use tracing::trace;

/// Effect of a stage on the payload size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// Payload doubles
    Double,
    /// Payload halves
    Halve,
    /// Payload keeps its budget
    Same,
}

/// One stage of a conversion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Adapter {
    /// 32-bit float to signed 16-bit host order
    CutFloatTo16,
    /// Signed 16-bit host order to 32-bit float
    Expand16ToFloat,
    /// 8-bit to host-order 16-bit
    Widen8To16System,
    /// 8-bit to byte-swapped 16-bit
    Widen8To16Swapped,
    /// Host-order 16-bit to 8-bit
    Narrow16SystemTo8,
    /// Byte-swapped 16-bit to 8-bit
    Narrow16SwappedTo8,
    /// Swap the bytes of every 16-bit sample
    SwapBytes16,
    /// Flip signedness of host-order 16-bit samples
    FlipSign16System,
    /// Flip signedness of byte-swapped 16-bit samples
    FlipSign16Swapped,
    /// Flip signedness of 8-bit samples
    FlipSign8,
    /// Average signed 16-bit stereo to mono
    StereoToMonoS16,
    /// Average unsigned 16-bit stereo to mono
    StereoToMonoU16,
    /// Average signed 8-bit stereo to mono
    StereoToMonoS8,
    /// Average unsigned 8-bit stereo to mono
    StereoToMonoU8,
    /// Duplicate 16-bit mono to stereo
    MonoToStereo16,
    /// Duplicate 8-bit mono to stereo
    MonoToStereo8,
    /// Attenuate by 5 dB ahead of downsampling
    Minus5dB,
    /// Double the sample rate
    DoubleRate(Channels),
    /// Halve the sample rate
    HalfRate(Channels),
    /// Raise the sample rate by the plan's polyphase filter
    IncreaseRate(Channels),
    /// Lower the sample rate by the plan's polyphase filter
    DecreaseRate(Channels),
}

/// Execution context handed to a stage
pub struct StageContext<'a> {
    /// The plan's polyphase filter, if it has one
    pub filter: Option<&'a PolyphaseFilter>,
    /// Streaming carry of this stage, absent in one-shot mode
    pub carry: Option<&'a mut StageCarry>,
}

impl<'a> StageContext<'a> {
    /// Context for a one-shot run
    pub fn one_shot(filter: Option<&'a PolyphaseFilter>) -> Self {
        Self { filter, carry: None }
    }
}

static DOUBLE_RATE: DoubleRate = DoubleRate;
static HALF_RATE: HalfRate = HalfRate;

impl Adapter {
    /// Stable diagnostic name
    pub fn name(&self) -> &'static str {
        match self {
            Self::CutFloatTo16 => "cut_float_to_16",
            Self::Expand16ToFloat => "expand_16_to_float",
            Self::Widen8To16System => "widen_8_to_16_system",
            Self::Widen8To16Swapped => "widen_8_to_16_swapped",
            Self::Narrow16SystemTo8 => "narrow_16_system_to_8",
            Self::Narrow16SwappedTo8 => "narrow_16_swapped_to_8",
            Self::SwapBytes16 => "swap_bytes_16",
            Self::FlipSign16System => "flip_sign_16_system",
            Self::FlipSign16Swapped => "flip_sign_16_swapped",
            Self::FlipSign8 => "flip_sign_8",
            Self::StereoToMonoS16 => "stereo_to_mono_s16",
            Self::StereoToMonoU16 => "stereo_to_mono_u16",
            Self::StereoToMonoS8 => "stereo_to_mono_s8",
            Self::StereoToMonoU8 => "stereo_to_mono_u8",
            Self::MonoToStereo16 => "mono_to_stereo_16",
            Self::MonoToStereo8 => "mono_to_stereo_8",
            Self::Minus5dB => "minus_5db",
            Self::DoubleRate(Channels::Mono) => "double_rate_mono",
            Self::DoubleRate(Channels::Stereo) => "double_rate_stereo",
            Self::HalfRate(Channels::Mono) => "half_rate_mono",
            Self::HalfRate(Channels::Stereo) => "half_rate_stereo",
            Self::IncreaseRate(Channels::Mono) => "increase_rate_mono",
            Self::IncreaseRate(Channels::Stereo) => "increase_rate_stereo",
            Self::DecreaseRate(Channels::Mono) => "decrease_rate_mono",
            Self::DecreaseRate(Channels::Stereo) => "decrease_rate_stereo",
        }
    }

    /// Size budget contribution
    pub fn growth(&self) -> Growth {
        match self {
            Self::Expand16ToFloat
            | Self::Widen8To16System
            | Self::Widen8To16Swapped
            | Self::MonoToStereo16
            | Self::MonoToStereo8
            | Self::DoubleRate(_)
            | Self::IncreaseRate(_) => Growth::Double,
            Self::CutFloatTo16
            | Self::Narrow16SystemTo8
            | Self::Narrow16SwappedTo8
            | Self::StereoToMonoS16
            | Self::StereoToMonoU16
            | Self::StereoToMonoS8
            | Self::StereoToMonoU8 => Growth::Halve,
            _ => Growth::Same,
        }
    }

    /// Whether this stage changes the sample rate
    pub fn is_rate_stage(&self) -> bool {
        self.rate_channels().is_some()
    }

    /// Channel layout of a rate stage
    pub fn rate_channels(&self) -> Option<Channels> {
        match *self {
            Self::DoubleRate(c) | Self::HalfRate(c) | Self::IncreaseRate(c) | Self::DecreaseRate(c) => {
                Some(c)
            }
            _ => None,
        }
    }

    /// Whether this stage needs the plan's polyphase filter
    pub fn uses_filter(&self) -> bool {
        matches!(self, Self::IncreaseRate(_) | Self::DecreaseRate(_))
    }

    /// Kernel run by a rate stage
    pub fn kernel<'a>(&self, filter: Option<&'a PolyphaseFilter>) -> Option<&'a dyn RateKernel> {
        match self {
            Self::DoubleRate(_) => Some(&DOUBLE_RATE as &dyn RateKernel),
            Self::HalfRate(_) => Some(&HALF_RATE as &dyn RateKernel),
            Self::IncreaseRate(_) | Self::DecreaseRate(_) => {
                filter.map(|f| f as &dyn RateKernel)
            }
            _ => None,
        }
    }

    /// Run the stage over the first `len` bytes of `buf`
    ///
    /// Returns the new payload length. The buffer must be large enough for
    /// the stage's output; the plan checks this before the first stage runs.
    pub fn apply(&self, buf: &mut [u8], len: usize, ctx: &mut StageContext<'_>) -> usize {
        let new_len = match self {
            Self::CutFloatTo16 => format::cut_float_to_16(buf, len),
            Self::Expand16ToFloat => format::expand_16_to_float(buf, len),
            Self::Widen8To16System => format::widen_8_to_16_system(buf, len),
            Self::Widen8To16Swapped => format::widen_8_to_16_swapped(buf, len),
            Self::Narrow16SystemTo8 => format::narrow_16_system_to_8(buf, len),
            Self::Narrow16SwappedTo8 => format::narrow_16_swapped_to_8(buf, len),
            Self::SwapBytes16 => format::swap_bytes_16(buf, len),
            Self::FlipSign16System => format::flip_sign(buf, len, format::SIGN_MASK_16_SYSTEM),
            Self::FlipSign16Swapped => format::flip_sign(buf, len, format::SIGN_MASK_16_SWAPPED),
            Self::FlipSign8 => format::flip_sign(buf, len, format::SIGN_MASK_8),
            Self::StereoToMonoS16 => format::stereo_to_mono_s16(buf, len),
            Self::StereoToMonoU16 => format::stereo_to_mono_u16(buf, len),
            Self::StereoToMonoS8 => format::stereo_to_mono_s8(buf, len),
            Self::StereoToMonoU8 => format::stereo_to_mono_u8(buf, len),
            Self::MonoToStereo16 => format::mono_to_stereo_16(buf, len),
            Self::MonoToStereo8 => format::mono_to_stereo_8(buf, len),
            Self::Minus5dB => format::attenuate_5db(buf, len),
            Self::DoubleRate(channels)
            | Self::HalfRate(channels)
            | Self::IncreaseRate(channels)
            | Self::DecreaseRate(channels) => {
                let kernel = self.kernel(ctx.filter);
                debug_assert!(kernel.is_some(), "{} runs without a polyphase filter", self.name());
                match kernel {
                    Some(kernel) => {
                        convert_rate(kernel, *channels, buf, len, ctx.carry.as_deref_mut())
                    }
                    None => len,
                }
            }
        };
        trace!(stage = self.name(), before = len, after = new_len, "stage");
        new_len
    }
}

/// Run a rate kernel over every channel of a 16-bit host-order block
fn convert_rate(
    kernel: &dyn RateKernel,
    channels: Channels,
    buf: &mut [u8],
    len: usize,
    carry: Option<&mut StageCarry>,
) -> usize {
    let stride = channels.count();
    let frames = len / (2 * stride);

    let outputs = match carry {
        None => {
            let span = OutputSpan::one_shot(kernel, frames);
            for channel in 0..stride {
                let mut view = ChannelView::new(buf, stride, channel);
                run_pass(kernel, &mut view, Extension::silent(frames), span);
            }
            span.len()
        }
        Some(carry) => {
            let span = OutputSpan::streaming(kernel, carry.consumed, carry.emitted, frames);
            let history = kernel.history_len();
            for channel in 0..stride {
                let mut view = ChannelView::new(buf, stride, channel);
                let tail = view.copy_out(frames.saturating_sub(history)..frames);
                let lead = std::mem::replace(&mut carry.history[channel], tail);
                run_pass(kernel, &mut view, Extension::with_lead(&lead, frames), span);
            }
            carry.advance(kernel, frames, span.end);
            span.len()
        }
    };

    outputs * 2 * stride
}

impl fmt::Display for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
