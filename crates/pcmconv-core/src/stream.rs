//! Streaming carry-over state
//!
//! A [`StreamState`] belongs to exactly one logical stream. It keeps, for
//! every rate stage of a plan, the tail of the previous block and the
//! stage's position in its filter period, so that successive blocks are
//! filtered as one continuous signal. Outputs are only emitted once their
//! whole receptive field has arrived, which gives every stage a fixed
//! latency of `after` input samples.

use crate::error::ExecError;
use crate::plan::ConversionPlan;
use crate::rate::engine::{lead_in, RateKernel};
use crate::types::AudioSpec;

/// Carry-over of one rate stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCarry {
    /// Last `before + after` input samples of each channel
    pub(crate) history: Vec<Vec<i16>>,
    /// Global index of the next input sample, reduced by whole periods
    pub(crate) consumed: i64,
    /// Global index of the next output sample, reduced by whole periods
    pub(crate) emitted: i64,
    /// Output the stream starts at, the same one a one-shot pass starts at
    start: i64,
}

impl StageCarry {
    fn new(kernel: &dyn RateKernel, channels: usize) -> Self {
        let start = lead_in(kernel);
        Self {
            history: vec![vec![0; kernel.history_len()]; channels],
            consumed: 0,
            emitted: start,
            start,
        }
    }

    /// Record a block of `frames` inputs whose outputs ended at `end`
    pub(crate) fn advance(&mut self, kernel: &dyn RateKernel, frames: usize, end: i64) {
        let (outputs, inputs) = kernel.period();
        self.consumed += frames as i64;
        self.emitted = end;

        let periods = self.emitted.div_euclid(outputs as i64);
        self.emitted -= periods * outputs as i64;
        self.consumed -= periods * inputs as i64;
    }

    fn reset(&mut self) {
        for channel in &mut self.history {
            channel.iter_mut().for_each(|s| *s = 0);
        }
        self.consumed = 0;
        self.emitted = self.start;
    }
}

/// Per-stream state for [`ConversionPlan::convert_stream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamState {
    src: AudioSpec,
    dst: AudioSpec,
    carries: Vec<StageCarry>,
    blocks: u64,
}

impl StreamState {
    /// Fresh state for a stream converted by `plan`
    pub fn new(plan: &ConversionPlan) -> Self {
        let carries = plan
            .stages()
            .iter()
            .filter_map(|stage| {
                let channels = stage.rate_channels()?;
                let kernel = stage.kernel(plan.filter())?;
                Some(StageCarry::new(kernel, channels.count()))
            })
            .collect();

        Self {
            src: *plan.src(),
            dst: *plan.dst(),
            carries,
            blocks: 0,
        }
    }

    /// Blocks converted so far
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Forget all history, as if the stream had just started
    pub fn reset(&mut self) {
        self.carries.iter_mut().for_each(StageCarry::reset);
        self.blocks = 0;
    }

    /// Check that this state was created for `plan`
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::StreamMismatch`] describing the first difference.
    pub fn check(&self, plan: &ConversionPlan) -> Result<(), ExecError> {
        if self.src != *plan.src() || self.dst != *plan.dst() {
            return Err(ExecError::StreamMismatch {
                details: format!(
                    "state is for {} -> {}, plan is {} -> {}",
                    self.src,
                    self.dst,
                    plan.src(),
                    plan.dst()
                ),
            });
        }

        let rate_stages: Vec<_> = plan
            .stages()
            .iter()
            .filter(|stage| stage.is_rate_stage())
            .collect();
        if rate_stages.len() != self.carries.len() {
            return Err(ExecError::StreamMismatch {
                details: format!(
                    "state carries {} rate stages, plan has {}",
                    self.carries.len(),
                    rate_stages.len()
                ),
            });
        }

        for (index, (stage, carry)) in rate_stages.iter().zip(&self.carries).enumerate() {
            let expected = match (stage.rate_channels(), stage.kernel(plan.filter())) {
                (Some(channels), Some(kernel)) => (channels.count(), kernel.history_len()),
                _ => {
                    return Err(ExecError::StreamMismatch {
                        details: format!("rate stage {} has no kernel", index),
                    })
                }
            };
            let shape_matches = carry.history.len() == expected.0
                && carry.history.iter().all(|h| h.len() == expected.1);
            if !shape_matches {
                return Err(ExecError::StreamMismatch {
                    details: format!("carry of rate stage {} ({}) has the wrong shape", index, stage),
                });
            }
        }

        Ok(())
    }

    pub(crate) fn carries_mut(&mut self) -> &mut [StageCarry] {
        &mut self.carries
    }

    pub(crate) fn finish_block(&mut self) {
        self.blocks += 1;
    }
}
