//! GPU buffer resource.
//!
//! A [`Buffer`] keeps a CPU copy of its contents next to the GPU handle.
//! Writes land in the CPU copy and mark a dirty range, which [`Buffer::flush`]
//! uploads. The CPU copy is what the buffer is rebuilt from after a context
//! loss.

use std::ops::{Deref, DerefMut, Range};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use sprig_core::mesh::{IndexFormat, UsageHint, VertexLayout};

use crate::backend::{BufferHandle, GpuBackend};
use crate::device::GraphicsDevice;
use crate::drawable::Volatile;
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, BufferUsage};

/// How the elements of a buffer are interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferFormat {
    /// Vertices with the given layout.
    Vertex(Arc<VertexLayout>),
    /// Indices of the given width.
    Index(IndexFormat),
}

impl BufferFormat {
    /// Bytes per element.
    pub fn stride(&self) -> usize {
        match self {
            Self::Vertex(layout) => layout.stride(),
            Self::Index(format) => format.size(),
        }
    }
}

#[derive(Debug)]
struct BufferState {
    bytes: Vec<u8>,
    dirty: Option<Range<usize>>,
}

impl BufferState {
    fn mark_dirty(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        self.dirty = Some(match self.dirty.take() {
            Some(dirty) => dirty.start.min(range.start)..dirty.end.max(range.end),
            None => range,
        });
    }
}

/// A GPU buffer resource.
///
/// Buffers are created by [`GraphicsDevice`] and are reference-counted.
/// They hold a weak reference back to their parent device.
///
/// # Example
///
/// ```ignore
/// let buffer = device.create_vertex_buffer(VertexLayout::default_2d(), 4, UsageHint::Dynamic)?;
/// buffer.write(0, &vertex_bytes)?;
/// buffer.flush()?;
/// ```
pub struct Buffer {
    device: Weak<GraphicsDevice>,
    backend: Arc<dyn GpuBackend>,
    descriptor: BufferDescriptor,
    format: BufferFormat,
    element_count: usize,
    state: Mutex<BufferState>,
    // Kept apart from `state` so an open mapping never blocks unloading.
    handle: Mutex<Option<BufferHandle>>,
    mapped: AtomicBool,
}

impl Buffer {
    /// Create a new buffer and its GPU side (called by GraphicsDevice).
    pub(crate) fn new(
        device: &Arc<GraphicsDevice>,
        descriptor: BufferDescriptor,
        format: BufferFormat,
        bytes: Vec<u8>,
    ) -> Result<Self, GraphicsError> {
        let stride = format.stride();
        if stride == 0 || bytes.is_empty() || bytes.len() % stride != 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer of {} bytes does not hold whole elements of {stride} bytes",
                bytes.len()
            )));
        }

        let backend = Arc::clone(device.backend());
        let handle = backend.create_buffer(&descriptor, Some(&bytes))?;

        Ok(Self {
            device: Arc::downgrade(device),
            backend,
            element_count: bytes.len() / stride,
            descriptor,
            format,
            state: Mutex::new(BufferState { bytes, dirty: None }),
            handle: Mutex::new(Some(handle)),
            mapped: AtomicBool::new(false),
        })
    }

    /// Get the parent device, if it still exists.
    pub fn device(&self) -> Option<Arc<GraphicsDevice>> {
        self.device.upgrade()
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Get the buffer label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Get the usage flags.
    pub fn usage(&self) -> BufferUsage {
        self.descriptor.usage
    }

    /// Get the usage hint.
    pub fn hint(&self) -> UsageHint {
        self.descriptor.hint
    }

    /// How elements are interpreted.
    pub fn format(&self) -> &BufferFormat {
        &self.format
    }

    /// Vertex layout, for vertex buffers.
    pub fn layout(&self) -> Option<&Arc<VertexLayout>> {
        match &self.format {
            BufferFormat::Vertex(layout) => Some(layout),
            BufferFormat::Index(_) => None,
        }
    }

    /// Index width, for index buffers.
    pub fn index_format(&self) -> Option<IndexFormat> {
        match self.format {
            BufferFormat::Index(format) => Some(format),
            BufferFormat::Vertex(_) => None,
        }
    }

    /// Number of elements (vertices or indices).
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Bytes per element.
    pub fn stride(&self) -> usize {
        self.format.stride()
    }

    /// Current GPU handle, or `None` while unloaded.
    pub fn handle(&self) -> Option<BufferHandle> {
        *self.handle.lock()
    }

    /// Check if a mapping is open.
    pub fn is_mapped(&self) -> bool {
        self.mapped.load(Ordering::Acquire)
    }

    fn lock_unmapped(&self) -> Result<MutexGuard<'_, BufferState>, GraphicsError> {
        if self.is_mapped() {
            return Err(GraphicsError::InvalidOperation(format!(
                "buffer {:?} is mapped",
                self.descriptor.label
            )));
        }
        Ok(self.state.lock())
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<Range<usize>, GraphicsError> {
        let size = self.descriptor.size as usize;
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(offset..end),
            _ => Err(GraphicsError::OutOfBounds(format!(
                "{len} bytes at offset {offset} exceed buffer size {size}"
            ))),
        }
    }

    /// Copy `data` into the buffer at `offset`. Uploaded on the next flush.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), GraphicsError> {
        let range = self.check_range(offset, data.len())?;
        let mut state = self.lock_unmapped()?;
        state.bytes[range.clone()].copy_from_slice(data);
        state.mark_dirty(range);
        Ok(())
    }

    /// Copy bytes starting at `offset` into `out`.
    pub fn read(&self, offset: usize, out: &mut [u8]) -> Result<(), GraphicsError> {
        let range = self.check_range(offset, out.len())?;
        let state = self.lock_unmapped()?;
        out.copy_from_slice(&state.bytes[range]);
        Ok(())
    }

    /// Copy of the whole CPU-side contents.
    pub fn contents(&self) -> Result<Vec<u8>, GraphicsError> {
        Ok(self.lock_unmapped()?.bytes.clone())
    }

    /// Decoded contents of an index buffer.
    pub fn indices(&self) -> Result<Vec<u32>, GraphicsError> {
        let format = self.index_format().ok_or_else(|| {
            GraphicsError::InvalidOperation("not an index buffer".to_string())
        })?;
        Ok(format.decode(&self.lock_unmapped()?.bytes))
    }

    /// Upload the dirty range to the GPU.
    pub fn flush(&self) -> Result<(), GraphicsError> {
        let mut state = self.lock_unmapped()?;
        let Some(handle) = *self.handle.lock() else {
            // Rebuilt in full on the next load.
            state.dirty = None;
            return Ok(());
        };
        if let Some(range) = state.dirty.take() {
            log::trace!(
                "Buffer {:?}: flushing bytes {}..{}",
                self.descriptor.label,
                range.start,
                range.end
            );
            self.backend
                .write_buffer(handle, range.start as u64, &state.bytes[range])?;
        }
        Ok(())
    }

    /// Open a scoped mapping of the whole buffer.
    ///
    /// The mapping is flushed when closed with [`BufferMapping::unmap`] or
    /// dropped. Draws using this buffer fail while the mapping is open.
    pub fn map(&self) -> Result<BufferMapping<'_>, GraphicsError> {
        if self.mapped.swap(true, Ordering::AcqRel) {
            return Err(GraphicsError::InvalidOperation(format!(
                "buffer {:?} is already mapped",
                self.descriptor.label
            )));
        }
        Ok(BufferMapping {
            buffer: self,
            state: Some(self.state.lock()),
        })
    }
}

impl Volatile for Buffer {
    fn load_volatile(&self) -> Result<(), GraphicsError> {
        let mut state = self.lock_unmapped()?;
        let mut handle = self.handle.lock();
        if handle.is_none() {
            *handle = Some(
                self.backend
                    .create_buffer(&self.descriptor, Some(&state.bytes))?,
            );
            state.dirty = None;
            log::debug!("Buffer {:?}: reloaded", self.descriptor.label);
        }
        Ok(())
    }

    fn unload_volatile(&self) {
        if let Some(handle) = self.handle.lock().take() {
            self.backend.destroy_buffer(handle);
            log::debug!("Buffer {:?}: unloaded", self.descriptor.label);
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            self.backend.destroy_buffer(handle);
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.descriptor.size)
            .field("usage", &self.descriptor.usage)
            .field("element_count", &self.element_count)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Buffer is Send + Sync
static_assertions::assert_impl_all!(Buffer: Send, Sync);

/// Exclusive access to a buffer's bytes.
///
/// Closing the mapping flushes the modified range; dropping it without
/// [`unmap`](BufferMapping::unmap) flushes the whole buffer.
pub struct BufferMapping<'a> {
    buffer: &'a Buffer,
    state: Option<MutexGuard<'a, BufferState>>,
}

impl BufferMapping<'_> {
    /// Close the mapping, flushing only `range`.
    pub fn unmap(mut self, range: Range<usize>) -> Result<(), GraphicsError> {
        if range.start > range.end {
            return Err(GraphicsError::InvalidParameter(format!(
                "invalid unmap range {range:?}"
            )));
        }
        self.buffer.check_range(range.start, range.len())?;
        self.finish(range)
    }

    fn finish(&mut self, range: Range<usize>) -> Result<(), GraphicsError> {
        let Some(mut state) = self.state.take() else {
            return Ok(());
        };
        state.mark_dirty(range);
        drop(state);
        self.buffer.mapped.store(false, Ordering::Release);
        self.buffer.flush()
    }
}

impl Deref for BufferMapping<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self.state.as_deref() {
            Some(state) => &state.bytes,
            None => &[],
        }
    }
}

impl DerefMut for BufferMapping<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self.state.as_deref_mut() {
            Some(state) => &mut state.bytes,
            None => &mut [],
        }
    }
}

impl Drop for BufferMapping<'_> {
    fn drop(&mut self) {
        let len = self.buffer.descriptor.size as usize;
        if let Err(err) = self.finish(0..len) {
            log::warn!("Buffer {:?}: flush on unmap failed: {err}", self.buffer.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;
    use crate::capabilities::Capabilities;

    fn create_test_setup() -> (Arc<DummyBackend>, Arc<GraphicsDevice>) {
        let backend = Arc::new(DummyBackend::new(Capabilities::modern()));
        let device = GraphicsDevice::new(
            backend.clone(),
            Capabilities::modern(),
            Default::default(),
        );
        (backend, device)
    }

    #[test]
    fn test_write_and_flush() {
        let (backend, device) = create_test_setup();
        let buffer = device
            .create_index_buffer(&[0, 1, 2, 3], UsageHint::Static)
            .unwrap();
        assert_eq!(buffer.size(), 8);
        assert_eq!(buffer.index_format(), Some(IndexFormat::Uint16));

        buffer.write(2, &7u16.to_ne_bytes()).unwrap();
        let handle = buffer.handle().unwrap();
        assert_eq!(&backend.buffer_contents(handle).unwrap()[2..4], &1u16.to_ne_bytes());

        buffer.flush().unwrap();
        assert_eq!(&backend.buffer_contents(handle).unwrap()[2..4], &7u16.to_ne_bytes());
        assert_eq!(buffer.indices().unwrap(), vec![0, 7, 2, 3]);
    }

    #[test]
    fn test_write_out_of_bounds() {
        let (_backend, device) = create_test_setup();
        let buffer = device
            .create_index_buffer(&[0, 1], UsageHint::Static)
            .unwrap();
        let err = buffer.write(3, &[0, 0]).unwrap_err();
        assert!(matches!(err, GraphicsError::OutOfBounds(_)));
    }

    #[test]
    fn test_map_blocks_access_until_closed() {
        let (backend, device) = create_test_setup();
        let buffer = device
            .create_index_buffer(&[0, 1, 2, 3], UsageHint::Dynamic)
            .unwrap();
        let handle = buffer.handle().unwrap();

        let mut mapping = buffer.map().unwrap();
        mapping[0..2].copy_from_slice(&9u16.to_ne_bytes());
        mapping[6..8].copy_from_slice(&9u16.to_ne_bytes());
        assert!(buffer.is_mapped());
        assert!(buffer.map().is_err());
        assert!(buffer.flush().is_err());

        mapping.unmap(0..2).unwrap();
        assert!(!buffer.is_mapped());

        let uploaded = backend.buffer_contents(handle).unwrap();
        assert_eq!(&uploaded[0..2], &9u16.to_ne_bytes());
        assert_eq!(&uploaded[6..8], &3u16.to_ne_bytes());
    }

    #[test]
    fn test_dropped_mapping_flushes_everything() {
        let (backend, device) = create_test_setup();
        let buffer = device
            .create_index_buffer(&[0, 1], UsageHint::Dynamic)
            .unwrap();
        {
            let mut mapping = buffer.map().unwrap();
            mapping.fill(0xff);
        }
        let uploaded = backend.buffer_contents(buffer.handle().unwrap()).unwrap();
        assert_eq!(uploaded, vec![0xff; 4]);
    }

    #[test]
    fn test_context_loss_while_mapped() {
        let (backend, device) = create_test_setup();
        let buffer = device
            .create_index_buffer(&[0, 1], UsageHint::Dynamic)
            .unwrap();
        let handle = buffer.handle().unwrap();

        let mut mapping = buffer.map().unwrap();
        assert_eq!(buffer.handle(), Some(handle));

        device.unload_all();
        assert!(buffer.handle().is_none());
        assert_eq!(backend.live_buffer_count(), 0);
        assert!(device.reload_all().is_err());

        mapping[0..2].copy_from_slice(&4u16.to_ne_bytes());
        mapping.unmap(0..2).unwrap();

        device.reload_all().unwrap();
        let uploaded = backend.buffer_contents(buffer.handle().unwrap()).unwrap();
        assert_eq!(IndexFormat::Uint16.decode(&uploaded), vec![4, 1]);
    }

    #[test]
    fn test_unload_and_reload() {
        let (backend, device) = create_test_setup();
        let buffer = device
            .create_index_buffer(&[5, 6], UsageHint::Static)
            .unwrap();

        buffer.unload_volatile();
        assert!(buffer.handle().is_none());
        assert_eq!(backend.live_buffer_count(), 0);

        buffer.write(0, &8u16.to_ne_bytes()).unwrap();
        buffer.load_volatile().unwrap();
        let uploaded = backend.buffer_contents(buffer.handle().unwrap()).unwrap();
        assert_eq!(IndexFormat::Uint16.decode(&uploaded), vec![8, 6]);
    }
}
