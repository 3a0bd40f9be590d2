//! Core audio format types
//!
//! An [`AudioSpec`] describes one side of a conversion: how a sample is
//! encoded, how many channels are interleaved per frame and at which rate
//! frames are produced. Specs are plain values; nothing is validated until
//! a plan is built from a pair of them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest sample rate accepted by the planner
pub const MIN_RATE: u32 = 1;

/// Highest sample rate accepted by the planner
pub const MAX_RATE: u32 = 1 << 18;

/// Byte order of multi-byte samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    /// Byte order of the host
    #[cfg(target_endian = "little")]
    pub const SYSTEM: ByteOrder = ByteOrder::Little;
    /// Byte order of the host
    #[cfg(target_endian = "big")]
    pub const SYSTEM: ByteOrder = ByteOrder::Big;

    /// Check whether this is the host byte order
    pub fn is_system(self) -> bool {
        self == Self::SYSTEM
    }
}

/// Width of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleWidth {
    /// 8-bit integer
    Bits8,
    /// 16-bit integer
    Bits16,
    /// 32-bit IEEE float
    Float32,
}

impl SampleWidth {
    /// Bytes per sample
    pub fn bytes(self) -> usize {
        match self {
            Self::Bits8 => 1,
            Self::Bits16 => 2,
            Self::Float32 => 4,
        }
    }
}

/// Supported sample encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    /// Unsigned 8-bit
    U8,
    /// Signed 8-bit
    S8,
    /// Unsigned 16-bit, little endian
    U16Lsb,
    /// Signed 16-bit, little endian
    S16Lsb,
    /// Unsigned 16-bit, big endian
    U16Msb,
    /// Signed 16-bit, big endian
    S16Msb,
    /// 32-bit float, host byte order
    F32,
}

impl SampleFormat {
    /// Signed 16-bit in host byte order, the rate stages' working format
    #[cfg(target_endian = "little")]
    pub const S16_SYSTEM: SampleFormat = SampleFormat::S16Lsb;
    /// Signed 16-bit in host byte order, the rate stages' working format
    #[cfg(target_endian = "big")]
    pub const S16_SYSTEM: SampleFormat = SampleFormat::S16Msb;

    /// All formats, in declaration order
    pub const ALL: [SampleFormat; 7] = [
        Self::U8,
        Self::S8,
        Self::U16Lsb,
        Self::S16Lsb,
        Self::U16Msb,
        Self::S16Msb,
        Self::F32,
    ];

    /// Diagnostic name
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "U8",
            Self::S8 => "S8",
            Self::U16Lsb => "U16LSB",
            Self::S16Lsb => "S16LSB",
            Self::U16Msb => "U16MSB",
            Self::S16Msb => "S16MSB",
            Self::F32 => "F32",
        }
    }

    /// Sample width
    pub fn width(self) -> SampleWidth {
        match self {
            Self::U8 | Self::S8 => SampleWidth::Bits8,
            Self::U16Lsb | Self::S16Lsb | Self::U16Msb | Self::S16Msb => SampleWidth::Bits16,
            Self::F32 => SampleWidth::Float32,
        }
    }

    /// Whether samples are signed (floats always are)
    pub fn is_signed(self) -> bool {
        !matches!(self, Self::U8 | Self::U16Lsb | Self::U16Msb)
    }

    /// Byte order; 8-bit and float samples report the host order
    pub fn byte_order(self) -> ByteOrder {
        match self {
            Self::U16Lsb | Self::S16Lsb => ByteOrder::Little,
            Self::U16Msb | Self::S16Msb => ByteOrder::Big,
            Self::U8 | Self::S8 | Self::F32 => ByteOrder::SYSTEM,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "u8" => Ok(Self::U8),
            "s8" => Ok(Self::S8),
            "u16" | "u16le" | "u16lsb" => Ok(Self::U16Lsb),
            "s16" | "s16le" | "s16lsb" => Ok(Self::S16Lsb),
            "u16be" | "u16msb" => Ok(Self::U16Msb),
            "s16be" | "s16msb" => Ok(Self::S16Msb),
            "f32" | "float" => Ok(Self::F32),
            "s16sys" => Ok(Self::S16_SYSTEM),
            other => Err(format!("unknown sample format '{}'", other)),
        }
    }
}

/// Channel layout handled by a rate stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channels {
    /// One channel
    Mono,
    /// Two interleaved channels
    Stereo,
}

impl Channels {
    /// Layout for a channel count, if supported
    pub fn from_count(count: u8) -> Option<Self> {
        match count {
            1 => Some(Self::Mono),
            2 => Some(Self::Stereo),
            _ => None,
        }
    }

    /// Number of interleaved channels
    pub fn count(self) -> usize {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Description of one side of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioSpec {
    format: SampleFormat,
    channels: u8,
    rate: u32,
}

impl AudioSpec {
    /// Create a new spec
    pub fn new(format: SampleFormat, channels: u8, rate: u32) -> Self {
        Self {
            format,
            channels,
            rate,
        }
    }

    /// Sample encoding
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Sample width
    pub fn width(&self) -> SampleWidth {
        self.format.width()
    }

    /// Whether samples are signed
    pub fn is_signed(&self) -> bool {
        self.format.is_signed()
    }

    /// Whether samples are 32-bit floats
    pub fn is_float(&self) -> bool {
        self.width() == SampleWidth::Float32
    }

    /// Byte order of the samples
    pub fn byte_order(&self) -> ByteOrder {
        self.format.byte_order()
    }

    /// Whether samples are stored in host byte order
    pub fn is_system_endian(&self) -> bool {
        self.byte_order().is_system()
    }

    /// Interleaved channel count
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Frames per second
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// Bytes per sample
    pub fn bytes_per_sample(&self) -> usize {
        self.width().bytes()
    }

    /// Bytes per frame
    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * self.channels as usize
    }
}

impl fmt::Display for AudioSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = match self.channels {
            1 => "mono".to_string(),
            2 => "stereo".to_string(),
            n => format!("{}ch", n),
        };
        write!(f, "{} {} {}Hz", self.format, layout, self.rate)
    }
}

/// Parses `FORMAT:CHANNELS:RATE`, e.g. `u8:1:8000`
impl FromStr for AudioSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(format!("expected FORMAT:CHANNELS:RATE, got '{}'", s));
        }
        let format = parts[0].parse::<SampleFormat>()?;
        let channels = parts[1]
            .parse::<u8>()
            .map_err(|e| format!("invalid channel count '{}': {}", parts[1], e))?;
        let rate = parts[2]
            .parse::<u32>()
            .map_err(|e| format!("invalid sample rate '{}': {}", parts[2], e))?;
        Ok(Self::new(format, channels, rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_properties() {
        assert_eq!(SampleFormat::U8.width(), SampleWidth::Bits8);
        assert!(!SampleFormat::U8.is_signed());
        assert!(SampleFormat::S16Msb.is_signed());
        assert!(SampleFormat::F32.is_signed());
        assert_eq!(SampleFormat::U16Msb.byte_order(), ByteOrder::Big);
        assert_eq!(SampleFormat::S8.byte_order(), ByteOrder::SYSTEM);
        assert_eq!(SampleFormat::S16_SYSTEM.byte_order(), ByteOrder::SYSTEM);
    }

    #[test]
    fn test_spec_sizes() {
        let spec = AudioSpec::new(SampleFormat::S16Lsb, 2, 44100);
        assert_eq!(spec.bytes_per_sample(), 2);
        assert_eq!(spec.bytes_per_frame(), 4);

        let spec = AudioSpec::new(SampleFormat::F32, 1, 48000);
        assert!(spec.is_float());
        assert!(spec.is_system_endian());
        assert_eq!(spec.bytes_per_frame(), 4);
    }

    #[test]
    fn test_spec_parsing() {
        let spec: AudioSpec = "u8:1:8000".parse().unwrap();
        assert_eq!(spec, AudioSpec::new(SampleFormat::U8, 1, 8000));

        let spec: AudioSpec = "S16BE:2:44100".parse().unwrap();
        assert_eq!(spec.format(), SampleFormat::S16Msb);

        assert!("s16:2".parse::<AudioSpec>().is_err());
        assert!("x9:1:8000".parse::<AudioSpec>().is_err());
        assert!("u8:one:8000".parse::<AudioSpec>().is_err());
    }

    #[test]
    fn test_spec_display() {
        let spec = AudioSpec::new(SampleFormat::U8, 1, 8000);
        assert_eq!(spec.to_string(), "U8 mono 8000Hz");
    }

    #[test]
    fn test_channels() {
        assert_eq!(Channels::from_count(1), Some(Channels::Mono));
        assert_eq!(Channels::from_count(2), Some(Channels::Stereo));
        assert_eq!(Channels::from_count(6), None);
        assert_eq!(Channels::Stereo.count(), 2);
    }
}
