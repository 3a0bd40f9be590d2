//! Host glue around a plan and its buffer
//!
//! [`AudioConverter`] is the stateful front-end: build a plan once, then
//! repeatedly load a block of source bytes and convert it. In
//! [`ConversionMode::Loop`] the converter also owns the [`StreamState`] so
//! consecutive blocks are filtered as one stream.

use crate::config::{ConversionMode, ConverterConfig};
use crate::error::{ExecError, Result};
use crate::plan::ConversionPlan;
use crate::stream::StreamState;
use crate::types::AudioSpec;
use bytes::BytesMut;
use tracing::{debug, info};

/// Stateful converter owning a plan, a buffer and optional stream state
#[derive(Debug)]
pub struct AudioConverter {
    config: ConverterConfig,
    plan: Option<ConversionPlan>,
    buffer: Option<BytesMut>,
    pending: Option<usize>,
    state: Option<StreamState>,
}

impl AudioConverter {
    /// Create a converter without a plan
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            plan: None,
            buffer: None,
            pending: None,
            state: None,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Current plan, if built
    pub fn plan(&self) -> Option<&ConversionPlan> {
        self.plan.as_ref()
    }

    /// Stream state, present in loop mode once a plan is built
    pub fn stream(&self) -> Option<&StreamState> {
        self.state.as_ref()
    }

    /// Plan the conversion of `src` into `dst`, replacing any earlier plan
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConvertError::Plan`] when the pair is unsupported;
    /// the previous plan is kept in that case.
    pub fn build(&mut self, src: &AudioSpec, dst: &AudioSpec) -> Result<&ConversionPlan> {
        let plan = ConversionPlan::new(src, dst)?;

        if self.config.log_plan {
            info!(
                "Converting {} {}ch {}Hz -> {} {}ch {}Hz",
                src.format(),
                src.channels(),
                src.rate(),
                dst.format(),
                dst.channels(),
                dst.rate()
            );
            for (index, stage) in plan.stages().iter().enumerate() {
                info!("  stage {}: {}", index, stage);
            }
        }

        self.state = match self.config.mode {
            ConversionMode::Loop => Some(StreamState::new(&plan)),
            ConversionMode::OneShot => None,
        };
        self.pending = None;
        Ok(self.plan.insert(plan))
    }

    /// Forget the stream history, keeping the plan
    pub fn reset_stream(&mut self) {
        if let Some(state) = &mut self.state {
            state.reset();
        }
    }

    /// Copy one block of source bytes into the conversion buffer
    ///
    /// The buffer is grown to the capacity the plan needs for `input`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::NoPlan`] before a plan is built.
    pub fn load(&mut self, input: &[u8]) -> Result<()> {
        let plan = self.plan.as_ref().ok_or(ExecError::NoPlan)?;
        let capacity = plan.required_capacity(input.len());

        let buffer = self.buffer.get_or_insert_with(BytesMut::new);
        buffer.clear();
        buffer.reserve(capacity);
        buffer.extend_from_slice(input);
        buffer.resize(capacity, 0);
        self.pending = Some(input.len());

        debug!(input = input.len(), capacity, "loaded block");
        Ok(())
    }

    /// Copy 16-bit host-order samples into the conversion buffer
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_samples(&mut self, samples: &[i16]) -> Result<()> {
        self.load(crate::samples_as_bytes(samples))
    }

    /// Convert the loaded block and return the converted bytes
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::NoPlan`] without a plan, [`ExecError::NoBuffer`]
    /// when no block is loaded, and any error of the plan's execution.
    pub fn convert(&mut self) -> Result<&[u8]> {
        let plan = self.plan.as_ref().ok_or(ExecError::NoPlan)?;
        let buffer = self.buffer.as_mut().ok_or(ExecError::NoBuffer)?;
        let length = self.pending.ok_or(ExecError::NoBuffer)?;

        let len = match (self.config.mode, self.state.as_mut()) {
            (ConversionMode::Loop, Some(state)) => plan.convert_stream(state, &mut buffer[..], length)?,
            _ => plan.convert(&mut buffer[..], length)?,
        };
        self.pending = None;
        Ok(&buffer[..len])
    }

    /// Load `input`, convert it and return an owned copy of the result
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`] and [`Self::convert`].
    pub fn convert_bytes(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.load(input)?;
        Ok(self.convert()?.to_vec())
    }
}

impl Default for AudioConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}
