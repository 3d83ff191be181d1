//! CPU device implementation

use std::fmt;

/// CPU device (there's only one: the host CPU)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuDevice {
    id: usize,
}

impl CpuDevice {
    /// Create a new CPU device
    pub fn new() -> Self {
        Self { id: 0 }
    }

    /// Device index
    pub fn id(&self) -> usize {
        self.id
    }

    /// Device name
    pub fn name(&self) -> &'static str {
        "cpu"
    }
}

impl fmt::Display for CpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name(), self.id)
    }
}
