//! Fixed-capacity circular buffer of 16-bit samples.

/// Circular buffer that overwrites its oldest sample when full.
///
/// Overwriting raises a sticky overflow flag that stays set until read with
/// [`RingBuffer::overflow`].
#[derive(Clone, Debug)]
pub struct RingBuffer<const N: usize> {
    data: [u16; N],
    head: usize,
    len: usize,
    overflow: bool,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        Self {
            data: [0; N],
            head: 0,
            len: 0,
            overflow: false,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of samples stored.
    pub fn available(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Store a sample, dropping the oldest one if the buffer is full.
    pub fn append(&mut self, value: u16) {
        if N == 0 {
            self.overflow = true;
            return;
        }
        let tail = (self.head + self.len) % N;
        self.data[tail] = value;
        if self.len == N {
            self.head = (self.head + 1) % N;
            self.overflow = true;
        } else {
            self.len += 1;
        }
    }

    /// Remove and return the oldest sample.
    pub fn get(&mut self) -> Option<u16> {
        if self.len == 0 {
            return None;
        }
        let value = self.data[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(value)
    }

    /// Oldest sample, left in place.
    pub fn peek(&self) -> Option<u16> {
        (self.len > 0).then(|| self.data[self.head])
    }

    /// Copy samples oldest-first into `out` without consuming them.
    ///
    /// Returns the number of samples copied.
    pub fn copy_to(&self, out: &mut [u16]) -> usize {
        let count = self.len.min(out.len());
        for (i, slot) in out.iter_mut().take(count).enumerate() {
            *slot = self.data[(self.head + i) % N];
        }
        count
    }

    /// Whether a sample was overwritten since the last call; clears the flag.
    pub fn overflow(&mut self) -> bool {
        core::mem::take(&mut self.overflow)
    }

    /// Mean of the stored samples, 0 when empty.
    pub fn average(&self) -> u16 {
        if self.len == 0 {
            return 0;
        }
        let sum: u32 = (0..self.len)
            .map(|i| self.data[(self.head + i) % N] as u32)
            .sum();
        (sum / self.len as u32) as u16
    }

    /// Drop every sample and the overflow flag.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.overflow = false;
    }
}
