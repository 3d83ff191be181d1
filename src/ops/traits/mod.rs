//! Operation traits

mod conditional;

pub use conditional::ConditionalOps;
