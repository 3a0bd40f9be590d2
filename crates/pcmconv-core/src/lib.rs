//! # PCMConv-Core: PCM Format and Sample Rate Conversion
//!
//! This library converts buffers of uncompressed PCM audio between sample
//! encodings, channel layouts and sample rates. A conversion is planned
//! once as an ordered chain of in-place stages and then executed on any
//! number of buffers.
//!
//! ## Features
//!
//! - **Formats**: unsigned/signed 8-bit, unsigned/signed 16-bit in either
//!   byte order, and 32-bit float
//! - **Channels**: mono and stereo, mixed by averaging or duplicated
//! - **Rates**: exact doubling and halving with half-band filters, any
//!   other ratio with a Kaiser-windowed polyphase filter in Q14 fixed point
//! - **Streaming**: per-stream carry-over so consecutive blocks filter as
//!   one continuous signal
//!
//! ## Usage
//!
//! ```rust
//! use pcmconv_core::{AudioSpec, ConversionPlan, SampleFormat};
//!
//! let src = AudioSpec::new(SampleFormat::U8, 1, 8000);
//! let dst = AudioSpec::new(SampleFormat::S16_SYSTEM, 2, 8000);
//! let plan = ConversionPlan::new(&src, &dst)?;
//!
//! let mut buffer = vec![0x80u8; plan.required_capacity(160)];
//! let len = plan.convert(&mut buffer, 160)?;
//! assert_eq!(len, 640);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod config;
pub mod converter;
pub mod error;
pub mod format;
pub mod plan;
pub mod planner;
pub mod rate;
pub mod stream;
pub mod types;

// Re-export commonly used types
pub use adapter::{Adapter, Growth};
pub use config::{ConversionMode, ConverterConfig};
pub use converter::AudioConverter;
pub use error::{ConvertError, ErrorCategory, ExecError, PlanError, Result};
pub use plan::ConversionPlan;
pub use planner::plan;
pub use rate::{Fraction, PolyphaseFilter};
pub use stream::StreamState;
pub use types::{AudioSpec, ByteOrder, Channels, SampleFormat, SampleWidth, MAX_RATE, MIN_RATE};

/// Version information for the conversion library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the conversion library
///
/// Installs a `tracing` fmt subscriber unless one is already set and forces
/// the filter taper table. Safe to call multiple times.
///
/// # Errors
///
/// Currently infallible; the signature leaves room for fallible setup.
pub fn init() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    rate::filter::init_tables();

    tracing::info!("PCMConv-Core v{} initialized", VERSION);
    tracing::info!("Supported formats: {:?}", SampleFormat::ALL.map(SampleFormat::name));

    Ok(())
}

/// View 16-bit samples as raw bytes in host order
pub fn samples_as_bytes(samples: &[i16]) -> &[u8] {
    bytemuck::cast_slice(samples)
}

/// Copy host-order bytes into 16-bit samples, dropping a trailing odd byte
pub fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    let mut samples = vec![0i16; bytes.len() / 2];
    let n = samples.len() * 2;
    bytemuck::cast_slice_mut::<i16, u8>(&mut samples).copy_from_slice(&bytes[..n]);
    samples
}
