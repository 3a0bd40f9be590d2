//! Rate converter engine
//!
//! Every rate stage is a [`RateKernel`]: a periodic schedule of phases,
//! each consuming a fixed number of input samples, plus a convolution that
//! turns the receptive field around a base sample into one output sample.
//! The engine walks the outputs of one channel region by region, pulling
//! input through a [`RateConversionBuffer`] and writing results back into
//! the same channel in place.

use super::buffer::{ChannelView, Extension, RateConversionBuffer};
use std::ops::Range;
use tracing::trace;

/// Order in which outputs are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// First output first; used when the output is not longer than the input
    Forward,
    /// Last output first; used when the output grows past the input
    Backward,
}

/// A periodic resampling kernel
pub trait RateKernel {
    /// `(outputs, inputs)` per period
    fn period(&self) -> (usize, usize);

    /// Input samples consumed after emitting an output at `phase`
    fn step(&self, phase: usize) -> usize;

    /// Samples needed before and after the base sample
    fn reach(&self) -> (usize, usize);

    /// Processing order that keeps the in-place write behind the reads
    fn walk(&self) -> Walk;

    /// Compute one output from its receptive field
    ///
    /// `field` holds `before + after + 1` samples with the base sample at
    /// index `before`.
    fn convolve(&self, phase: usize, field: &[i16]) -> i16;

    /// Receptive field length
    fn field_len(&self) -> usize {
        let (before, after) = self.reach();
        before + after + 1
    }

    /// Samples of history a stream must keep between blocks
    fn history_len(&self) -> usize {
        let (before, after) = self.reach();
        before + after
    }

    /// Most outputs a one-shot pass adds to `ceil(frames * outputs / inputs)`
    /// while ramping in and out of the block
    fn ramp_len(&self) -> usize {
        let (outputs, inputs) = self.period();
        let (before, after) = self.reach();
        (before * outputs).div_ceil(inputs) + after * outputs / inputs
    }
}

pub(crate) fn floor_div(a: i64, b: i64) -> i64 {
    a.div_euclid(b)
}

pub(crate) fn ceil_div(a: i64, b: i64) -> i64 {
    -(-a).div_euclid(b)
}

/// Base input sample of output `j`, i.e. `floor(j * inputs / outputs)`
pub fn base_of<K: RateKernel + ?Sized>(kernel: &K, j: i64) -> i64 {
    let (outputs, inputs) = kernel.period();
    floor_div(j * inputs as i64, outputs as i64)
}

/// First output whose base sample is at or after `index`
pub fn first_output_from<K: RateKernel + ?Sized>(kernel: &K, index: i64) -> i64 {
    let (outputs, inputs) = kernel.period();
    ceil_div(index * outputs as i64, inputs as i64)
}

/// First output whose receptive field reaches input 0
pub fn lead_in<K: RateKernel + ?Sized>(kernel: &K) -> i64 {
    let (_, after) = kernel.reach();
    first_output_from(kernel, -(after as i64))
}

/// Outputs a one-shot pass over `frames` inputs produces
pub fn one_shot_len<K: RateKernel + ?Sized>(kernel: &K, frames: usize) -> usize {
    OutputSpan::one_shot(kernel, frames).len()
}

/// Phase position of the output being computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCursor {
    /// Phase within the period
    pub phase: usize,
    /// Global index of the base input sample
    pub base: i64,
}

impl PhaseCursor {
    /// Cursor for output `j`
    pub fn at<K: RateKernel + ?Sized>(kernel: &K, j: i64) -> Self {
        let (outputs, _) = kernel.period();
        Self {
            phase: j.rem_euclid(outputs as i64) as usize,
            base: base_of(kernel, j),
        }
    }

    /// Move to the next output
    pub fn advance<K: RateKernel + ?Sized>(&mut self, kernel: &K) {
        let (outputs, _) = kernel.period();
        self.base += kernel.step(self.phase) as i64;
        self.phase = (self.phase + 1) % outputs;
    }

    /// Move to the previous output
    pub fn retreat<K: RateKernel + ?Sized>(&mut self, kernel: &K) {
        let (outputs, _) = kernel.period();
        self.phase = (self.phase + outputs - 1) % outputs;
        self.base -= kernel.step(self.phase) as i64;
    }
}

/// Global output range a pass produces over one block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSpan {
    /// Global index of the block's first input sample
    pub origin: i64,
    /// First output to emit
    pub first: i64,
    /// One past the last output to emit
    pub end: i64,
}

impl OutputSpan {
    /// Span of a one-shot pass
    ///
    /// Runs from the first output whose field reaches input 0 to the last
    /// one whose field still reaches input `frames - 1`, so the block ramps
    /// in from and out to silence.
    pub fn one_shot<K: RateKernel + ?Sized>(kernel: &K, frames: usize) -> Self {
        if frames == 0 {
            return Self { origin: 0, first: 0, end: 0 };
        }
        let (before, _) = kernel.reach();
        Self {
            origin: 0,
            first: lead_in(kernel),
            end: first_output_from(kernel, (frames + before) as i64),
        }
    }

    /// Span of a streaming pass: outputs whose field lies inside the block
    /// or the carried history
    pub fn streaming<K: RateKernel + ?Sized>(
        kernel: &K,
        origin: i64,
        emitted: i64,
        frames: usize,
    ) -> Self {
        let (_, after) = kernel.reach();
        let last_base = origin + frames as i64 - 1 - after as i64;
        Self {
            origin,
            first: emitted,
            end: first_output_from(kernel, last_base + 1).max(emitted),
        }
    }

    /// Number of outputs
    pub fn len(&self) -> usize {
        (self.end - self.first).max(0) as usize
    }
}

/// Attack, core and decay output ranges of one pass
///
/// Ranges hold local output indices and are listed in processing order.
/// The attack is where processing enters the block, so for a backward walk
/// it is the high end of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regions {
    /// Outputs whose field reaches past the edge where processing starts
    pub attack: Range<usize>,
    /// Outputs whose field lies inside the live block
    pub core: Range<usize>,
    /// Outputs whose field reaches past the edge where processing ends
    pub decay: Range<usize>,
}

impl Regions {
    /// Split a span into regions for a block of `frames` inputs
    pub fn compute<K: RateKernel + ?Sized>(kernel: &K, span: &OutputSpan, frames: usize) -> Self {
        let (before, after) = kernel.reach();
        let clamp = |j: i64| (j.clamp(span.first, span.end.max(span.first)) - span.first) as usize;

        // Outputs below `low_end` read the lead, outputs from `high_start` read the runway
        let low_end = clamp(first_output_from(kernel, span.origin + before as i64));
        let high_start = clamp(first_output_from(
            kernel,
            span.origin + frames as i64 - after as i64,
        ))
        .max(low_end);
        let len = span.len();

        match kernel.walk() {
            Walk::Forward => Self {
                attack: 0..low_end,
                core: low_end..high_start,
                decay: high_start..len,
            },
            Walk::Backward => Self {
                attack: high_start..len,
                core: low_end..high_start,
                decay: 0..low_end,
            },
        }
    }
}

/// Run one channel through a kernel in place
///
/// `extension` supplies the samples around the live block and `span` the
/// outputs to produce. Output `first + k` is written to frame `k` of
/// `view`. Returns the number of outputs written.
pub fn run_pass<K: RateKernel + ?Sized>(
    kernel: &K,
    view: &mut ChannelView<'_>,
    extension: Extension<'_>,
    span: OutputSpan,
) -> usize {
    debug_assert!(
        view.capacity() >= span.len(),
        "{} outputs overrun a buffer of {} frames",
        span.len(),
        view.capacity()
    );
    let regions = Regions::compute(kernel, &span, extension.frames);
    trace!(
        attack = regions.attack.len(),
        core = regions.core.len(),
        decay = regions.decay.len(),
        frames = extension.frames,
        "rate pass"
    );

    let (before, _) = kernel.reach();
    let field_len = kernel.field_len();
    let mut window = RateConversionBuffer::new();

    match kernel.walk() {
        Walk::Forward => {
            let mut cursor = PhaseCursor::at(kernel, span.first);
            for region in [regions.attack, regions.core, regions.decay] {
                for k in region {
                    let start = cursor.base - span.origin - before as i64;
                    window.slide_forward(view, extension, start, field_len);
                    let value = kernel.convolve(cursor.phase, window.field(start, field_len));
                    view.set(k, value);
                    cursor.advance(kernel);
                }
            }
        }
        Walk::Backward => {
            let mut cursor = PhaseCursor::at(kernel, span.end - 1);
            for region in [regions.attack, regions.core, regions.decay] {
                for k in region.rev() {
                    let start = cursor.base - span.origin - before as i64;
                    window.slide_backward(view, extension, start, field_len);
                    let value = kernel.convolve(cursor.phase, window.field(start, field_len));
                    view.set(k, value);
                    cursor.retreat(kernel);
                }
            }
        }
    }

    span.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::fixed::{DoubleRate, HalfRate};

    /// Nearest-sample kernel used to check the walk bookkeeping
    struct Pick {
        outputs: usize,
        inputs: usize,
        walk: Walk,
    }

    impl RateKernel for Pick {
        fn period(&self) -> (usize, usize) {
            (self.outputs, self.inputs)
        }

        fn step(&self, phase: usize) -> usize {
            ((phase + 1) * self.inputs / self.outputs - phase * self.inputs / self.outputs) as usize
        }

        fn reach(&self) -> (usize, usize) {
            (3, 4)
        }

        fn walk(&self) -> Walk {
            self.walk
        }

        fn convolve(&self, _phase: usize, field: &[i16]) -> i16 {
            field[3]
        }
    }

    /// Counts the live samples in its field
    struct Coverage;

    impl RateKernel for Coverage {
        fn period(&self) -> (usize, usize) {
            (11, 8)
        }

        fn step(&self, phase: usize) -> usize {
            (phase + 1) * 8 / 11 - phase * 8 / 11
        }

        fn reach(&self) -> (usize, usize) {
            (3, 4)
        }

        fn walk(&self) -> Walk {
            Walk::Backward
        }

        fn convolve(&self, _phase: usize, field: &[i16]) -> i16 {
            field.iter().sum()
        }
    }

    fn samples_to_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
    }

    fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|c| i16::from_ne_bytes([c[0], c[1]]))
            .collect()
    }

    #[test]
    fn test_cursor_matches_base_formula() {
        let kernel = Pick { outputs: 11, inputs: 8, walk: Walk::Backward };
        let mut cursor = PhaseCursor::at(&kernel, 0);
        for j in 0..100 {
            assert_eq!(cursor, PhaseCursor::at(&kernel, j));
            cursor.advance(&kernel);
        }
        for j in (0..100).rev() {
            cursor.retreat(&kernel);
            assert_eq!(cursor, PhaseCursor::at(&kernel, j));
        }
    }

    #[test]
    fn test_one_shot_len() {
        assert_eq!(one_shot_len(&DoubleRate, 100), 200 + 62);
        assert_eq!(one_shot_len(&HalfRate, 101), 51 + 30);
        assert_eq!(one_shot_len(&HalfRate, 0), 0);
        let kernel = Pick { outputs: 8, inputs: 11, walk: Walk::Forward };
        assert_eq!(one_shot_len(&kernel, 110), 85);
        assert_eq!(one_shot_len(&kernel, 111), 85);
        assert_eq!(lead_in(&kernel), -2);
    }

    #[test]
    fn test_ramp_len_bounds_one_shot_growth() {
        let kernel = Pick { outputs: 8, inputs: 11, walk: Walk::Forward };
        for frames in 1..300usize {
            let grown = (frames * 8).div_ceil(11) + kernel.ramp_len();
            assert!(one_shot_len(&kernel, frames) <= grown, "{} frames", frames);
        }
        for frames in 1..300usize {
            assert!(one_shot_len(&DoubleRate, frames) <= 2 * frames + DoubleRate.ramp_len());
            assert!(one_shot_len(&HalfRate, frames) <= frames.div_ceil(2) + HalfRate.ramp_len());
        }
        assert_eq!(DoubleRate.ramp_len(), 62);
        assert_eq!(HalfRate.ramp_len(), 31);
    }

    #[test]
    fn test_one_shot_ramps_in_and_out() {
        let frames = 200;
        let span = OutputSpan::one_shot(&Coverage, frames);
        let mut bytes = samples_to_bytes(&vec![1i16; frames]);
        bytes.resize(span.len() * 2, 0);
        let mut view = ChannelView::new(&mut bytes, 1, 0);
        let written = run_pass(&Coverage, &mut view, Extension::silent(frames), span);
        let output = bytes_to_samples(&bytes[..written * 2]);

        // First and last outputs see a single live sample
        assert_eq!(output[0], 1);
        assert_eq!(output[written - 1], 1);
        let full = Coverage.field_len() as i16;
        let top = output.iter().position(|&c| c == full).unwrap();
        assert!(output[..top].windows(2).all(|w| w[0] <= w[1]), "{:?}", &output[..top]);
        let bottom = output.iter().rposition(|&c| c == full).unwrap();
        assert!(output[bottom..].windows(2).all(|w| w[0] >= w[1]));
        assert!(output[top..=bottom].iter().all(|&c| c == full));
    }

    #[test]
    fn test_regions_partition_outputs() {
        let kernel = Pick { outputs: 8, inputs: 11, walk: Walk::Forward };
        let span = OutputSpan::one_shot(&kernel, 200);
        let regions = Regions::compute(&kernel, &span, 200);
        assert_eq!(regions.attack.start, 0);
        assert_eq!(regions.attack.end, regions.core.start);
        assert_eq!(regions.core.end, regions.decay.start);
        assert_eq!(regions.decay.end, span.len());
        assert!(!regions.attack.is_empty());
        assert!(!regions.decay.is_empty());

        let kernel = Pick { outputs: 11, inputs: 8, walk: Walk::Backward };
        let span = OutputSpan::one_shot(&kernel, 200);
        let regions = Regions::compute(&kernel, &span, 200);
        assert_eq!(regions.decay.start, 0);
        assert_eq!(regions.decay.end, regions.core.start);
        assert_eq!(regions.core.end, regions.attack.start);
        assert_eq!(regions.attack.end, span.len());
    }

    #[test]
    fn test_regions_tiny_block() {
        let kernel = Pick { outputs: 1, inputs: 2, walk: Walk::Forward };
        let span = OutputSpan::one_shot(&kernel, 2);
        let regions = Regions::compute(&kernel, &span, 2);
        let total = regions.attack.len() + regions.core.len() + regions.decay.len();
        assert_eq!(total, span.len());
        assert_eq!(total, 5);
        assert!(regions.core.is_empty());
    }

    #[test]
    fn test_forward_pass_in_place() {
        // 11 inputs -> 8 outputs per period, nearest-lower sample
        let kernel = Pick { outputs: 8, inputs: 11, walk: Walk::Forward };
        let input: Vec<i16> = (0..1000).map(|i| i as i16).collect();
        let mut bytes = samples_to_bytes(&input);
        let mut view = ChannelView::new(&mut bytes, 1, 0);
        let span = OutputSpan::one_shot(&kernel, input.len());
        let written = run_pass(&kernel, &mut view, Extension::silent(input.len()), span);
        assert_eq!(written, 732);
        let output = bytes_to_samples(&bytes);
        for (k, &value) in output.iter().enumerate().take(written) {
            let base = base_of(&kernel, span.first + k as i64);
            let expected = if (0..1000).contains(&base) { base } else { 0 };
            assert_eq!(value as i64, expected, "output {}", k);
        }
    }

    #[test]
    fn test_backward_pass_in_place() {
        let kernel = Pick { outputs: 11, inputs: 8, walk: Walk::Backward };
        let input: Vec<i16> = (0..1000).map(|i| i as i16).collect();
        let span = OutputSpan::one_shot(&kernel, input.len());
        let mut bytes = samples_to_bytes(&input);
        bytes.resize(span.len() * 2, 0);
        let mut view = ChannelView::new(&mut bytes, 1, 0);
        let written = run_pass(&kernel, &mut view, Extension::silent(input.len()), span);
        assert_eq!(written, 1385);
        let output = bytes_to_samples(&bytes);
        for (k, &value) in output.iter().enumerate().take(written) {
            let base = base_of(&kernel, span.first + k as i64);
            let expected = if (0..1000).contains(&base) { base } else { 0 };
            assert_eq!(value as i64, expected, "output {}", k);
        }
    }

    #[test]
    fn test_streaming_span() {
        let kernel = HalfRate;
        // after = 31, so the first block of 100 can emit bases up to 68
        let span = OutputSpan::streaming(&kernel, 0, lead_in(&kernel), 100);
        assert_eq!(span.first, -15);
        assert_eq!(span.first, OutputSpan::one_shot(&kernel, 100).first);
        assert_eq!(span.end, 35);
        assert_eq!(span.len(), 50);
        let next = OutputSpan::streaming(&kernel, 100, span.end, 100);
        assert_eq!(next.first, 35);
        assert_eq!(next.end, 85);
    }
}
