/// HeadlessBuffer - host-memory implementation of the Buffer trait
///
/// The bytes live behind `Arc<RwLock<Vec<u8>>>`. Recorded commands clone the
/// `Arc`, so the GPU timeline reads the storage that was current when the
/// command was recorded. `discard` swaps in a new allocation and leaves the
/// old one to whatever frames still reference it.

use std::ops::{Deref, DerefMut, Range};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use prism_gpu::validation::validate_buffer_range;
use prism_gpu::{gpu_error, gpu_trace};
use prism_gpu::{Buffer, BufferDesc, BufferInfo, Error, MappedRange, Result};

use crate::headless_context::{HeadlessContext, SOURCE};
use crate::registry::{ResourceKey, ResourceKind};

/// Shared byte storage
pub(crate) type SharedBytes = Arc<RwLock<Vec<u8>>>;

/// Byte written over discarded storage when debug checks are on
pub const DISCARD_POISON: u8 = 0xCD;

/// Allocate `size` bytes set to `fill`, reporting allocation failure as `OutOfMemory`
pub(crate) fn allocate(size: u64, fill: u8) -> Result<Vec<u8>> {
    let len = usize::try_from(size).map_err(|_| Error::OutOfMemory)?;
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    bytes.resize(len, fill);
    Ok(bytes)
}

/// Write guard over one range of the storage
struct MappedBytes<G> {
    guard: G,
    range: Range<usize>,
}

impl<G: Deref<Target = Vec<u8>>> Deref for MappedBytes<G> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard[self.range.clone()]
    }
}

impl<G: DerefMut<Target = Vec<u8>>> DerefMut for MappedBytes<G> {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.guard[self.range.clone()]
    }
}

/// Host-memory buffer
pub struct HeadlessBuffer {
    /// Shared device context
    ctx: Arc<HeadlessContext>,
    /// Registry key
    key: ResourceKey,
    /// Read-only properties
    info: BufferInfo,
    /// Current storage (replaced by `discard`)
    memory: Mutex<SharedBytes>,
}

impl HeadlessBuffer {
    /// Allocate a buffer and copy the initial data in
    pub(crate) fn new(ctx: Arc<HeadlessContext>, desc: &BufferDesc) -> Result<Self> {
        let mut bytes = allocate(desc.size, 0)?;
        if let Some(data) = desc.data {
            bytes[..data.len()].copy_from_slice(data);
        }

        let key = ctx.register(ResourceKind::Buffer, desc.label);
        gpu_trace!(ctx.logger, SOURCE, "Created buffer {:?} ({} bytes)", desc.label, desc.size);

        Ok(Self {
            ctx,
            key,
            info: BufferInfo {
                size: desc.size,
                usage: desc.usage,
                label: desc.label.map(str::to_string),
            },
            memory: Mutex::new(Arc::new(RwLock::new(bytes))),
        })
    }

    /// Storage current at the time of the call
    pub(crate) fn snapshot(&self) -> SharedBytes {
        Arc::clone(&self.memory.lock())
    }

    /// Copy of `[offset, offset + size)` of the current storage
    ///
    /// Blocks while the range is mapped.
    pub fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>> {
        validate_buffer_range(self.info.size, offset, size)
            .inspect_err(|e| gpu_error!(self.ctx.logger, SOURCE, "Buffer read failed: {}", e))?;
        let storage = self.snapshot();
        let bytes = storage.read();
        Ok(bytes[offset as usize..(offset + size) as usize].to_vec())
    }
}

impl Buffer for HeadlessBuffer {
    fn info(&self) -> &BufferInfo {
        &self.info
    }

    fn map(&self, offset: u64, size: u64) -> Result<MappedRange<'_>> {
        validate_buffer_range(self.info.size, offset, size)
            .inspect_err(|e| gpu_error!(self.ctx.logger, SOURCE, "Buffer map failed: {}", e))?;

        let storage = self.snapshot();
        let mapped = MappedBytes {
            guard: storage.write_arc(),
            range: offset as usize..(offset + size) as usize,
        };
        Ok(MappedRange::new(offset, Box::new(mapped)))
    }

    fn discard(&self) {
        let fill = if self.ctx.debug { DISCARD_POISON } else { 0 };
        match allocate(self.info.size, fill) {
            Ok(bytes) => *self.memory.lock() = Arc::new(RwLock::new(bytes)),
            // Keep the old storage; discard is advisory
            Err(e) => gpu_error!(self.ctx.logger, SOURCE, "Buffer discard failed: {}", e),
        }
    }
}

impl Drop for HeadlessBuffer {
    fn drop(&mut self) {
        self.ctx.unregister(self.key);
    }
}
