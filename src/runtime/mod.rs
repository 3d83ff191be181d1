//! Runtime backends for tensor computation
//!
//! Only the host CPU backend is provided. It owns the kernels and the client
//! that operation traits are implemented on.
//!
//! ```text
//! cpu
//! ├── CpuDevice          (the host CPU)
//! ├── CpuClient          (dispatches operations)
//! ├── ParallelismConfig  (rayon work splitting)
//! └── kernels            (typed and converting select loops)
//! ```

#[cfg(feature = "cpu")]
pub mod cpu;
