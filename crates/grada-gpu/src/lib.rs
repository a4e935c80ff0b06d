//! GPU rendering backend for the grading kernel.
//!
//! Runs the same stage sequence as the CPU backend in a single fragment
//! shader pass over the source image.

pub mod backend;
pub mod context;
pub mod shader;
pub mod texture;
pub mod uniforms;

pub use backend::GpuBackend;
pub use context::GpuContext;
