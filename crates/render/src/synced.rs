use bytemuck::Pod;
use std::fmt::Debug;

/// Errors from batch storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    #[error("CPU and GPU copies were both written since the last sync")]
    Conflict,
    #[error("GPU buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("slot {slot} is out of range for a batch of capacity {capacity}")]
    SlotOutOfRange { slot: usize, capacity: usize },
}

/// The GPU side of a synced array, as far as this crate cares.
pub trait GpuBuffer: Debug + Send {
    fn write(&mut self, bytes: &[u8]);
    fn read(&self) -> Vec<u8>;
}

/// Host-memory stand-in for a GPU buffer. Used headless and in tests.
#[derive(Debug, Clone, Default)]
pub struct HostBuffer {
    bytes: Vec<u8>,
    writes: usize,
}

impl HostBuffer {
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0; len],
            writes: 0,
        }
    }

    /// Number of uploads received.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl GpuBuffer for HostBuffer {
    fn write(&mut self, bytes: &[u8]) {
        self.bytes.clear();
        self.bytes.extend_from_slice(bytes);
        self.writes += 1;
    }

    fn read(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Which way a sync moved data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    Upload,
    Download,
    Clean,
}

/// A fixed-length array mirrored between CPU memory and a GPU buffer.
///
/// CPU writes mark the GPU copy stale; [`SyncedArray::mark_gpu_written`]
/// marks the CPU copy stale. [`SyncedArray::sync`] copies the fresh side over
/// the stale one. Only one side may be written between syncs.
#[derive(Debug)]
pub struct SyncedArray<T: Pod> {
    step: usize,
    cpu: Vec<T>,
    gpu: Box<dyn GpuBuffer>,
    cpu_stale: bool,
    gpu_stale: bool,
}

impl<T: Pod + Debug> SyncedArray<T> {
    /// `len` elements of `step` components each, zeroed. The GPU side starts
    /// stale so the first sync uploads.
    pub fn new(len: usize, step: usize, gpu: Box<dyn GpuBuffer>) -> Self {
        Self {
            step,
            cpu: vec![T::zeroed(); len * step],
            gpu,
            cpu_stale: false,
            gpu_stale: true,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.cpu.len() / self.step
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn byte_len(&self) -> usize {
        std::mem::size_of_val(self.cpu.as_slice())
    }

    pub fn get(&self, idx: usize) -> Option<&[T]> {
        let start = idx.checked_mul(self.step)?;
        self.cpu.get(start..start + self.step)
    }

    /// Write one element. `value` must have `step` components.
    pub fn set(&mut self, idx: usize, value: &[T]) -> Result<(), BufferError> {
        debug_assert_eq!(value.len(), self.step, "component count mismatch");
        let len = self.len();
        let start = idx * self.step;
        let target = self
            .cpu
            .get_mut(start..start + self.step)
            .ok_or(BufferError::SlotOutOfRange {
                slot: idx,
                capacity: len,
            })?;
        target.copy_from_slice(value);
        self.gpu_stale = true;
        Ok(())
    }

    /// Record that the GPU side was written directly (e.g. by a compute pass).
    pub fn mark_gpu_written(&mut self) {
        self.cpu_stale = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.cpu_stale || self.gpu_stale
    }

    /// Copy the fresh side over the stale one.
    pub fn sync(&mut self) -> Result<SyncDirection, BufferError> {
        match (self.cpu_stale, self.gpu_stale) {
            (true, true) => Err(BufferError::Conflict),
            (false, true) => {
                self.upload();
                Ok(SyncDirection::Upload)
            }
            (true, false) => {
                self.download()?;
                Ok(SyncDirection::Download)
            }
            (false, false) => Ok(SyncDirection::Clean),
        }
    }

    /// Unconditionally push the CPU copy to the GPU.
    pub fn upload(&mut self) {
        self.gpu.write(bytemuck::cast_slice(&self.cpu));
        self.cpu_stale = false;
        self.gpu_stale = false;
    }

    /// Unconditionally pull the GPU copy into CPU memory.
    pub fn download(&mut self) -> Result<(), BufferError> {
        let bytes = self.gpu.read();
        let expected = self.byte_len();
        if bytes.len() != expected {
            tracing::warn!(expected, actual = bytes.len(), "GPU readback size mismatch");
            return Err(BufferError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        self.cpu = bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        self.cpu_stale = false;
        self.gpu_stale = false;
        Ok(())
    }

    pub fn gpu(&self) -> &dyn GpuBuffer {
        self.gpu.as_ref()
    }

    pub fn gpu_mut(&mut self) -> &mut dyn GpuBuffer {
        self.gpu.as_mut()
    }
}
