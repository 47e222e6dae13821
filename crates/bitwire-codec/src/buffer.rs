use bytes::{Bytes, BytesMut};

/// A growable byte container that message views are laid over.
///
/// Views address the buffer by absolute offset. Growth always zero-fills, so a
/// view created over an undersized buffer reads zeros for the missing region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    inner: BytesMut,
}

impl Buffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with reserved capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: BytesMut::with_capacity(capacity),
        }
    }

    /// Create a buffer of `size` zero bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            inner: BytesMut::zeroed(size),
        }
    }

    /// Create a buffer holding a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        Self {
            inner: BytesMut::from(data),
        }
    }

    /// Number of used bytes.
    pub fn size(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Grow to at least `size` bytes, zero-filling the new region.
    ///
    /// Never shrinks.
    pub fn increase(&mut self, size: usize) {
        if size > self.inner.len() {
            self.inner.resize(size, 0);
        }
    }

    /// Mutable view from `offset` to the end.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the end of the buffer.
    pub fn data(&mut self, offset: usize) -> &mut [u8] {
        &mut self.inner[offset..]
    }

    /// Shared view from `offset` to the end.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the end of the buffer.
    pub fn const_data(&self, offset: usize) -> &[u8] {
        &self.inner[offset..]
    }

    /// Append bytes at the end.
    pub fn append(&mut self, data: &[u8]) {
        self.inner.extend_from_slice(data);
    }

    /// Drop all bytes, keeping the allocation.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// All used bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Freeze into an immutable, cheaply clonable byte handle.
    pub fn freeze(self) -> Bytes {
        self.inner.freeze()
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Self {
            inner: BytesMut::from(&data[..]),
        }
    }
}

impl From<BytesMut> for Buffer {
    fn from(inner: BytesMut) -> Self {
        Self { inner }
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.inner
    }
}
