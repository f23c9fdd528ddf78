/// Buffer trait, buffer descriptor and mapped ranges

use std::fmt;
use std::ops::{Deref, DerefMut};
use bitflags::bitflags;

use crate::error::Result;

bitflags! {
    /// Buffer usage flags, fixed at creation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex buffer
        const VERTEX   = 1 << 0;
        /// Index buffer
        const INDEX    = 1 << 1;
        /// Uniform/constant buffer
        const UNIFORM  = 1 << 2;
        /// Compute storage buffer (also used for indirect draw arguments)
        const COMPUTE  = 1 << 3;
        /// Source of a copy
        const COPY_SRC = 1 << 4;
        /// Destination of a copy
        const COPY_DST = 1 << 5;
    }
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    /// Size in bytes
    pub size: u64,
    /// Usage flags
    pub usage: BufferUsage,
    /// Initial contents, uploaded before first use (may be shorter than `size`)
    pub data: Option<&'a [u8]>,
    /// Debug label
    pub label: Option<&'a str>,
}

impl<'a> BufferDesc<'a> {
    /// Descriptor for an uninitialized buffer
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self { size, usage, data: None, label: None }
    }

    /// Set initial contents
    pub fn with_data(mut self, data: &'a [u8]) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the debug label
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }
}

/// Read-only properties of a created buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferInfo {
    /// Size in bytes
    pub size: u64,
    /// Usage flags
    pub usage: BufferUsage,
    /// Debug label
    pub label: Option<String>,
}

/// Host-writable view of `[offset, offset + size)` of a buffer
///
/// Valid until it is dropped. Drop it before the frame that reads the buffer
/// is finished: a mapping kept across `frame_finish` blocks the GPU timeline
/// from reading that memory.
pub struct MappedRange<'a> {
    offset: u64,
    bytes: Box<dyn DerefMut<Target = [u8]> + 'a>,
}

impl<'a> MappedRange<'a> {
    /// Wrap backend memory (used by backends)
    pub fn new(offset: u64, bytes: Box<dyn DerefMut<Target = [u8]> + 'a>) -> Self {
        Self { offset, bytes }
    }

    /// Offset of the first mapped byte within the buffer
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Deref for MappedRange<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for MappedRange<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl fmt::Debug for MappedRange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedRange")
            .field("offset", &self.offset)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types (e.g., HeadlessBuffer).
/// Backend memory is released on `destroy` (or drop). The caller must not
/// destroy a buffer that a recorded but unfinished frame still uses.
pub trait Buffer: Send + Sync {
    /// Get the read-only properties of this buffer
    fn info(&self) -> &BufferInfo;

    /// Map `[offset, offset + size)` for host writes
    ///
    /// Fails validation when the range is empty or exceeds the buffer.
    fn map(&self, offset: u64, size: u64) -> Result<MappedRange<'_>>;

    /// Declare the previous contents unneeded
    ///
    /// Advisory: the backend may hand out fresh storage so the next `map`
    /// does not wait for in-flight reads. After a discard the contents are
    /// unspecified (not guaranteed to be zero, not guaranteed to be the old
    /// data).
    fn discard(&self);

    /// Release the buffer
    fn destroy(self)
    where
        Self: Sized,
    {
        drop(self)
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
