//! Conversion plans and their execution
//!
//! A [`ConversionPlan`] is immutable once built and can be shared between
//! threads; every execution works on a caller-owned buffer and, in
//! streaming mode, a caller-owned [`StreamState`].

use crate::adapter::{Adapter, StageContext};
use crate::error::{ExecError, PlanError};
use crate::planner;
use crate::rate::filter::PolyphaseFilter;
use crate::stream::StreamState;
use crate::types::AudioSpec;
use std::fmt;
use tracing::trace;

/// Ordered stage list converting one [`AudioSpec`] into another
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPlan {
    src: AudioSpec,
    dst: AudioSpec,
    stages: Vec<Adapter>,
    size_multiplier: f64,
    peak_multiplier: f64,
    headroom_samples: usize,
    filter: Option<PolyphaseFilter>,
    min_stream_frames: usize,
}

impl ConversionPlan {
    /// Plan the conversion of `src` into `dst`
    ///
    /// # Errors
    ///
    /// See [`planner::plan`].
    pub fn new(src: &AudioSpec, dst: &AudioSpec) -> Result<Self, PlanError> {
        planner::plan(src, dst)
    }

    pub(crate) fn from_parts(
        src: AudioSpec,
        dst: AudioSpec,
        stages: Vec<Adapter>,
        size_multiplier: f64,
        peak_multiplier: f64,
        headroom_samples: usize,
        filter: Option<PolyphaseFilter>,
        min_stream_frames: usize,
    ) -> Self {
        debug_assert!(
            filter.is_some() || !stages.iter().any(Adapter::uses_filter),
            "plan has a polyphase stage but no filter"
        );
        Self {
            src,
            dst,
            stages,
            size_multiplier,
            peak_multiplier,
            headroom_samples,
            filter,
            min_stream_frames,
        }
    }

    /// Source description
    pub fn src(&self) -> &AudioSpec {
        &self.src
    }

    /// Destination description
    pub fn dst(&self) -> &AudioSpec {
        &self.dst
    }

    /// Stages in execution order
    pub fn stages(&self) -> &[Adapter] {
        &self.stages
    }

    /// Whether the plan leaves every buffer untouched
    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    /// Ratio of output to input length
    pub fn size_multiplier(&self) -> f64 {
        self.size_multiplier
    }

    /// Largest ratio of an intermediate length to the input length
    pub fn peak_multiplier(&self) -> f64 {
        self.peak_multiplier
    }

    /// Extra samples the rate stages may produce past the multiplied length
    pub fn headroom_samples(&self) -> usize {
        self.headroom_samples
    }

    /// Polyphase filter of the arbitrary-ratio stage, if any
    pub fn filter(&self) -> Option<&PolyphaseFilter> {
        self.filter.as_ref()
    }

    /// Smallest block, in source frames, accepted by [`Self::convert_stream`]
    pub fn min_stream_frames(&self) -> usize {
        self.min_stream_frames
    }

    /// Bytes a buffer must hold to convert `length` input bytes in place
    pub fn required_capacity(&self, length: usize) -> usize {
        (length as f64 * self.peak_multiplier).ceil() as usize + 2 * self.headroom_samples
    }

    /// Upper bound of the output length for `length` input bytes
    pub fn output_len_hint(&self, length: usize) -> usize {
        (length as f64 * self.size_multiplier).ceil() as usize + 2 * self.headroom_samples
    }

    fn check_buffer(&self, capacity: usize, length: usize) -> Result<(), ExecError> {
        if length > capacity {
            return Err(ExecError::LengthExceedsBuffer { length, capacity });
        }
        let needed = self.required_capacity(length);
        if capacity < needed {
            return Err(ExecError::BufferTooSmall {
                needed,
                actual: capacity,
            });
        }
        Ok(())
    }

    /// Convert the first `length` bytes of `buffer` in place
    ///
    /// Each call treats its block as a complete signal: rate stages ramp in
    /// from and out to silence at the block edges. Returns the new length.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::LengthExceedsBuffer`] or
    /// [`ExecError::BufferTooSmall`] before touching the buffer.
    pub fn convert(&self, buffer: &mut [u8], length: usize) -> Result<usize, ExecError> {
        self.check_buffer(buffer.len(), length)?;

        let mut ctx = StageContext::one_shot(self.filter.as_ref());
        let mut len = length;
        for stage in &self.stages {
            len = stage.apply(buffer, len, &mut ctx);
        }
        trace!(input = length, output = len, "converted block");
        Ok(len)
    }

    /// Convert one block of a continuous stream in place
    ///
    /// Rate stages continue from the history held in `state` and only emit
    /// outputs whose receptive field is complete, so concatenating the
    /// outputs of successive calls yields the one-shot conversion of the
    /// concatenated input, minus the trailing latency.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::StreamMismatch`] when `state` belongs to another
    /// plan, [`ExecError::BlockTooShort`] when the block holds fewer than
    /// [`Self::min_stream_frames`] frames, and the buffer errors of
    /// [`Self::convert`]. Nothing is modified on error.
    pub fn convert_stream(
        &self,
        state: &mut StreamState,
        buffer: &mut [u8],
        length: usize,
    ) -> Result<usize, ExecError> {
        state.check(self)?;
        self.check_buffer(buffer.len(), length)?;
        let frames = length / self.src.bytes_per_frame();
        if frames < self.min_stream_frames {
            return Err(ExecError::BlockTooShort {
                frames,
                required: self.min_stream_frames,
            });
        }

        let mut carries = state.carries_mut().iter_mut();
        let mut len = length;
        for stage in &self.stages {
            let carry = if stage.is_rate_stage() {
                carries.next()
            } else {
                None
            };
            let mut ctx = StageContext {
                filter: self.filter.as_ref(),
                carry,
            };
            len = stage.apply(buffer, len, &mut ctx);
        }
        state.finish_block();
        trace!(input = length, output = len, block = state.blocks(), "converted stream block");
        Ok(len)
    }
}

impl fmt::Display for ConversionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Conversion plan: {} -> {}", self.src, self.dst)?;
        writeln!(
            f,
            "  size multiplier {}, peak {}, headroom {} samples",
            self.size_multiplier, self.peak_multiplier, self.headroom_samples
        )?;
        if let Some(filter) = &self.filter {
            writeln!(f, "  filter: {}", filter)?;
        }
        if self.min_stream_frames > 0 {
            writeln!(f, "  min stream block: {} frames", self.min_stream_frames)?;
        }
        writeln!(f, "  stages:")?;
        if self.stages.is_empty() {
            writeln!(f, "    (identity)")?;
        }
        for stage in &self.stages {
            writeln!(f, "    {}", stage)?;
        }
        Ok(())
    }
}
