//! Fixed-capacity ring of the most recently delivered bytes.
//!
//! A [`Lookback`] covers the byte range `start()..end()` of a remote file.
//! Appending moves `end()` forward and, once the ring is full, drags
//! `start()` along with it so that `end() - start() <= capacity()` always
//! holds.

/// Ring buffer tagged with the file offset of its oldest byte.
#[derive(Debug, Clone)]
pub struct Lookback {
    buf: Box<[u8]>,
    /// Index of the oldest byte in `buf`.
    head: usize,
    /// Number of valid bytes.
    len: usize,
    /// File offset of the oldest byte.
    start: u64,
}

impl Lookback {
    /// Create an empty buffer positioned at offset 0.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "lookback capacity must be non-zero");
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            start: 0,
        }
    }

    /// Maximum number of bytes retained.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of bytes currently retained.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no bytes are retained.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// File offset of the oldest retained byte.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// File offset one past the newest retained byte.
    pub fn end(&self) -> u64 {
        self.start + self.len as u64
    }

    /// Returns true if `offset` falls inside `start()..end()`.
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Drop all bytes and reposition the (empty) window at `offset`.
    pub fn reset(&mut self, offset: u64) {
        self.head = 0;
        self.len = 0;
        self.start = offset;
    }

    /// Record bytes delivered at `end()`, evicting the oldest on overflow.
    pub fn append(&mut self, data: &[u8]) {
        let cap = self.capacity();

        if data.len() >= cap {
            let end = self.end() + data.len() as u64;
            self.buf.copy_from_slice(&data[data.len() - cap..]);
            self.head = 0;
            self.len = cap;
            self.start = end - cap as u64;
            return;
        }

        for &byte in data {
            let tail = (self.head + self.len) % cap;
            self.buf[tail] = byte;
            if self.len == cap {
                self.head = (self.head + 1) % cap;
                self.start += 1;
            } else {
                self.len += 1;
            }
        }
    }

    /// Copy bytes starting at file `offset` into `out`.
    ///
    /// Returns `None` when `offset` is outside the window, otherwise the
    /// number of bytes copied (at least one unless `out` is empty).
    pub fn slice_from(&self, offset: u64, out: &mut [u8]) -> Option<usize> {
        if !self.contains(offset) {
            return None;
        }
        let cap = self.capacity();
        let skip = (offset - self.start) as usize;
        let n = out.len().min(self.len - skip);
        for (i, slot) in out[..n].iter_mut().enumerate() {
            *slot = self.buf[(self.head + skip + i) % cap];
        }
        Some(n)
    }
}
