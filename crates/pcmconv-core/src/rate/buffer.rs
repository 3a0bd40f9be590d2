//! Sliding rate conversion window
//!
//! Rate stages rewrite a channel in place, so every input sample must be
//! copied out of the caller's buffer before an output lands on top of it.
//! [`RateConversionBuffer`] is that copy: a fixed window over the extended
//! input sequence of one channel which slides in the walk direction and is
//! refilled eagerly up to its capacity.

use super::tables::WINDOW_CAPACITY;

/// One interleaved channel of a 16-bit host-order byte buffer
pub struct ChannelView<'a> {
    bytes: &'a mut [u8],
    stride: usize,
    channel: usize,
}

impl<'a> ChannelView<'a> {
    /// View `channel` of a buffer holding `stride` interleaved channels
    pub fn new(bytes: &'a mut [u8], stride: usize, channel: usize) -> Self {
        Self {
            bytes,
            stride,
            channel,
        }
    }

    /// Frames the underlying buffer can hold
    pub fn capacity(&self) -> usize {
        self.bytes.len() / (2 * self.stride)
    }

    fn offset(&self, frame: usize) -> usize {
        (frame * self.stride + self.channel) * 2
    }

    /// Read the sample of `frame`
    pub fn get(&self, frame: usize) -> i16 {
        let o = self.offset(frame);
        i16::from_ne_bytes([self.bytes[o], self.bytes[o + 1]])
    }

    /// Write the sample of `frame`
    pub fn set(&mut self, frame: usize, value: i16) {
        let o = self.offset(frame);
        self.bytes[o..o + 2].copy_from_slice(&value.to_ne_bytes());
    }

    /// Copy frames `range` out of the buffer
    pub fn copy_out(&self, range: std::ops::Range<usize>) -> Vec<i16> {
        range.map(|frame| self.get(frame)).collect()
    }
}

/// How a live block extends past its edges
///
/// Negative indices read the lead: the carried history of the previous
/// block in streaming mode, silence otherwise. Indices at or past
/// `frames` read silence.
#[derive(Debug, Clone, Copy)]
pub struct Extension<'l> {
    /// Samples preceding the block, the last one at index -1
    pub lead: &'l [i16],
    /// Live frames in the block
    pub frames: usize,
}

impl<'l> Extension<'l> {
    /// Block surrounded by silence
    pub fn silent(frames: usize) -> Self {
        Self { lead: &[], frames }
    }

    /// Block preceded by `lead`
    pub fn with_lead(lead: &'l [i16], frames: usize) -> Self {
        Self { lead, frames }
    }

    /// Sample at block-relative index `i`
    pub fn sample(&self, view: &ChannelView<'_>, i: i64) -> i16 {
        if i < 0 {
            let idx = self.lead.len() as i64 + i;
            if idx >= 0 {
                self.lead[idx as usize]
            } else {
                0
            }
        } else if (i as usize) < self.frames {
            view.get(i as usize)
        } else {
            0
        }
    }
}

/// Working window of one channel pass
pub struct RateConversionBuffer {
    samples: [i16; WINDOW_CAPACITY],
    /// Block-relative index of `samples[0]`
    lo: i64,
    len: usize,
}

impl RateConversionBuffer {
    /// Create an empty window
    pub fn new() -> Self {
        Self {
            samples: [0; WINDOW_CAPACITY],
            lo: 0,
            len: 0,
        }
    }

    /// Block-relative index one past the newest sample
    pub fn hi(&self) -> i64 {
        self.lo + self.len as i64
    }

    /// Make `[start, start + len)` resident when walking forward
    ///
    /// Samples below `start` are released, then the window is filled up to
    /// its capacity from the block.
    pub fn slide_forward(
        &mut self,
        view: &ChannelView<'_>,
        extension: Extension<'_>,
        start: i64,
        len: usize,
    ) {
        let end = start + len as i64;
        if self.len == 0 {
            self.lo = start;
        }
        if end <= self.hi() {
            return;
        }

        if end - self.lo > WINDOW_CAPACITY as i64 {
            let drop = ((start - self.lo).max(0) as usize).min(self.len);
            self.samples.copy_within(drop..self.len, 0);
            self.len -= drop;
            self.lo += drop as i64;
            if self.len == 0 {
                self.lo = start;
            }
        }

        while self.len < WINDOW_CAPACITY {
            self.samples[self.len] = extension.sample(view, self.hi());
            self.len += 1;
        }
    }

    /// Make `[start, start + len)` resident when walking backward
    ///
    /// Samples at or above `start + len` are released, then the window is
    /// filled down to its capacity from the block.
    pub fn slide_backward(
        &mut self,
        view: &ChannelView<'_>,
        extension: Extension<'_>,
        start: i64,
        len: usize,
    ) {
        let end = start + len as i64;
        if self.len == 0 {
            self.lo = end;
        }
        if start >= self.lo {
            return;
        }

        if self.hi() - start > WINDOW_CAPACITY as i64 {
            self.len = (end - self.lo).clamp(0, self.len as i64) as usize;
            if self.len == 0 {
                self.lo = end;
            }
        }

        let room = WINDOW_CAPACITY - self.len;
        self.samples.copy_within(0..self.len, room);
        let new_lo = self.lo - room as i64;
        for (idx, slot) in self.samples[..room].iter_mut().enumerate() {
            *slot = extension.sample(view, new_lo + idx as i64);
        }
        self.lo = new_lo;
        self.len = WINDOW_CAPACITY;
    }

    /// Resident samples `[start, start + len)`
    pub fn field(&self, start: i64, len: usize) -> &[i16] {
        let offset = (start - self.lo) as usize;
        &self.samples[offset..offset + len]
    }
}

impl Default for RateConversionBuffer {
    fn default() -> Self {
        Self::new()
    }
}
