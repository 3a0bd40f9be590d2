//! In-place sample format adapters
//!
//! Each adapter rewrites the first `len` bytes of a buffer and returns the
//! new payload length. Adapters that grow the payload walk backward so the
//! output never overtakes unread input; shrinking adapters walk forward.
//! 16-bit samples are read in host byte order unless stated otherwise.

use crate::rate::fixed::minus_5db;

/// Sign bit of two host-order 16-bit samples
pub const SIGN_MASK_16_SYSTEM: u32 = 0x8000_8000;

/// Sign bit of two byte-swapped 16-bit samples
pub const SIGN_MASK_16_SWAPPED: u32 = 0x0080_0080;

/// Sign bit of four 8-bit samples
pub const SIGN_MASK_8: u32 = 0x8080_8080;

fn read_i16(buf: &[u8], at: usize) -> i16 {
    i16::from_ne_bytes([buf[at], buf[at + 1]])
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_ne_bytes([buf[at], buf[at + 1]])
}

fn write_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_ne_bytes());
}

/// Convert 32-bit floats to signed 16-bit
///
/// Values are clamped to `[-1, 1]`, scaled by 32767 and truncated. Anything
/// below -1 maps to -32768.
pub fn cut_float_to_16(buf: &mut [u8], len: usize) -> usize {
    let samples = len / 4;
    for i in 0..samples {
        let at = 4 * i;
        let f = f32::from_ne_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        let v: i16 = if f > 1.0 {
            i16::MAX
        } else if f < -1.0 {
            i16::MIN
        } else {
            (f * 32767.0) as i16
        };
        buf[2 * i..2 * i + 2].copy_from_slice(&v.to_ne_bytes());
    }
    samples * 2
}

/// Convert signed 16-bit samples to 32-bit floats
pub fn expand_16_to_float(buf: &mut [u8], len: usize) -> usize {
    let samples = len / 2;
    for i in (0..samples).rev() {
        let f = read_i16(buf, 2 * i) as f32 * (1.0 / 32767.0);
        buf[4 * i..4 * i + 4].copy_from_slice(&f.to_ne_bytes());
    }
    samples * 4
}

/// Widen 8-bit samples to host-order 16-bit (`v << 8`)
pub fn widen_8_to_16_system(buf: &mut [u8], len: usize) -> usize {
    for i in (0..len).rev() {
        let v = (buf[i] as u16) << 8;
        write_u16(buf, 2 * i, v);
    }
    len * 2
}

/// Widen 8-bit samples to byte-swapped 16-bit
///
/// The sample byte lands in the low byte of the host-order word, which is
/// the high byte once read in the opposite order.
pub fn widen_8_to_16_swapped(buf: &mut [u8], len: usize) -> usize {
    for i in (0..len).rev() {
        let v = buf[i] as u16;
        write_u16(buf, 2 * i, v);
    }
    len * 2
}

/// Narrow host-order 16-bit samples to 8-bit (`v >> 8`)
pub fn narrow_16_system_to_8(buf: &mut [u8], len: usize) -> usize {
    let samples = len / 2;
    for i in 0..samples {
        buf[i] = (read_u16(buf, 2 * i) >> 8) as u8;
    }
    samples
}

/// Narrow byte-swapped 16-bit samples to 8-bit (`v & 0xff`)
pub fn narrow_16_swapped_to_8(buf: &mut [u8], len: usize) -> usize {
    let samples = len / 2;
    for i in 0..samples {
        buf[i] = (read_u16(buf, 2 * i) & 0xff) as u8;
    }
    samples
}

/// Swap the bytes of every 16-bit sample
pub fn swap_bytes_16(buf: &mut [u8], len: usize) -> usize {
    for pair in buf[..len].chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
    len
}

/// Flip sign bits by XOR with `mask`
///
/// Whole 32-bit words are flipped at once; trailing bytes use the byte of
/// the mask at the same position within the word.
pub fn flip_sign(buf: &mut [u8], len: usize, mask: u32) -> usize {
    let mask_bytes = mask.to_ne_bytes();
    let mut words = buf[..len].chunks_exact_mut(4);
    for word in &mut words {
        let v = u32::from_ne_bytes([word[0], word[1], word[2], word[3]]) ^ mask;
        word.copy_from_slice(&v.to_ne_bytes());
    }
    for (i, byte) in words.into_remainder().iter_mut().enumerate() {
        *byte ^= mask_bytes[i & 3];
    }
    len
}

/// Average signed 16-bit stereo frames into mono
pub fn stereo_to_mono_s16(buf: &mut [u8], len: usize) -> usize {
    let frames = len / 4;
    for i in 0..frames {
        let left = read_i16(buf, 4 * i) as i32;
        let right = read_i16(buf, 4 * i + 2) as i32;
        let v = ((left + right) >> 1) as i16;
        buf[2 * i..2 * i + 2].copy_from_slice(&v.to_ne_bytes());
    }
    frames * 2
}

/// Average unsigned 16-bit stereo frames into mono
pub fn stereo_to_mono_u16(buf: &mut [u8], len: usize) -> usize {
    let frames = len / 4;
    for i in 0..frames {
        let left = read_u16(buf, 4 * i) as u32;
        let right = read_u16(buf, 4 * i + 2) as u32;
        write_u16(buf, 2 * i, ((left + right) >> 1) as u16);
    }
    frames * 2
}

/// Average signed 8-bit stereo frames into mono
pub fn stereo_to_mono_s8(buf: &mut [u8], len: usize) -> usize {
    let frames = len / 2;
    for i in 0..frames {
        let left = buf[2 * i] as i8 as i16;
        let right = buf[2 * i + 1] as i8 as i16;
        buf[i] = ((left + right) >> 1) as i8 as u8;
    }
    frames
}

/// Average unsigned 8-bit stereo frames into mono
pub fn stereo_to_mono_u8(buf: &mut [u8], len: usize) -> usize {
    let frames = len / 2;
    for i in 0..frames {
        let left = buf[2 * i] as u16;
        let right = buf[2 * i + 1] as u16;
        buf[i] = ((left + right) >> 1) as u8;
    }
    frames
}

/// Duplicate 16-bit mono samples into stereo frames
pub fn mono_to_stereo_16(buf: &mut [u8], len: usize) -> usize {
    let samples = len / 2;
    for i in (0..samples).rev() {
        let (a, b) = (buf[2 * i], buf[2 * i + 1]);
        buf[4 * i..4 * i + 4].copy_from_slice(&[a, b, a, b]);
    }
    samples * 4
}

/// Duplicate 8-bit mono samples into stereo frames
pub fn mono_to_stereo_8(buf: &mut [u8], len: usize) -> usize {
    for i in (0..len).rev() {
        let v = buf[i];
        buf[2 * i] = v;
        buf[2 * i + 1] = v;
    }
    len * 2
}

/// Attenuate signed 16-bit samples by 5 dB
pub fn attenuate_5db(buf: &mut [u8], len: usize) -> usize {
    let samples = len / 2;
    for i in 0..samples {
        let v = minus_5db(read_i16(buf, 2 * i));
        buf[2 * i..2 * i + 2].copy_from_slice(&v.to_ne_bytes());
    }
    len
}
