//! Sample rate conversion
//!
//! Three kernels share one engine: the fixed [`DoubleRate`] and
//! [`HalfRate`] half-band stages and the arbitrary-ratio
//! [`PolyphaseFilter`]. The planner chains them so that the polyphase
//! stage only ever sees ratios in `[31/64, 64/31]`.

pub mod buffer;
pub mod engine;
pub mod filter;
pub mod fixed;
pub mod fraction;
pub mod tables;

pub use buffer::{ChannelView, Extension, RateConversionBuffer};
pub use engine::{run_pass, OutputSpan, PhaseCursor, RateKernel, Regions, Walk};
pub use filter::{Direction, FilterPhase, PolyphaseFilter, DOWNSAMPLE_SCALE, UPSAMPLE_SCALE};
pub use fixed::{DoubleRate, HalfRate};
pub use fraction::{Fraction, MAX_RATIO, MIN_RATIO};
pub use tables::{FILTER_HALF_LENGTH, FILTER_LENGTH, WINDOW_CAPACITY};
