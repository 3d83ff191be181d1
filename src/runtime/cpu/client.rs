//! CPU client and its parallelism settings

use super::device::CpuDevice;

/// When and how the CPU kernels split work across the rayon pool
///
/// Work is split only for outputs of at least `min_len` elements, in chunks
/// of `chunk_size` elements. Without the `rayon` feature both values are
/// ignored and every kernel runs serially.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParallelismConfig {
    min_len: usize,
    chunk_size: usize,
}

impl ParallelismConfig {
    /// Default threshold below which kernels stay on the calling thread
    pub const DEFAULT_MIN_LEN: usize = 4096;
    /// Default number of elements per parallel task
    pub const DEFAULT_CHUNK_SIZE: usize = 4096;

    /// Create a config; a zero `chunk_size` is raised to 1
    pub fn new(min_len: usize, chunk_size: usize) -> Self {
        Self {
            min_len,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Never split work
    pub fn serial() -> Self {
        Self::new(usize::MAX, Self::DEFAULT_CHUNK_SIZE)
    }

    /// Minimum element count for parallel execution
    #[inline]
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Elements per parallel task
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// True when an output of `len` elements should be split
    #[inline]
    pub fn should_split(&self, len: usize) -> bool {
        cfg!(feature = "rayon") && len >= self.min_len
    }
}

impl Default for ParallelismConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_LEN, Self::DEFAULT_CHUNK_SIZE)
    }
}

/// CPU client for operation dispatch
#[derive(Clone, Debug)]
pub struct CpuClient {
    pub(crate) device: CpuDevice,
    pub(crate) parallelism: ParallelismConfig,
}

impl CpuClient {
    /// Create a new CPU client
    pub fn new(device: CpuDevice) -> Self {
        Self {
            device,
            parallelism: ParallelismConfig::default(),
        }
    }

    /// Replace the parallelism settings
    pub fn with_parallelism(mut self, parallelism: ParallelismConfig) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// The device this client runs on
    pub fn device(&self) -> &CpuDevice {
        &self.device
    }

    /// Current parallelism settings
    pub fn parallelism(&self) -> ParallelismConfig {
        self.parallelism
    }
}

impl Default for CpuClient {
    fn default() -> Self {
        Self::new(CpuDevice::new())
    }
}
