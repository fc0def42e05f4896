//! Program loading.
//!
//! Provides the program description accepted by the kernel and the loader
//! that turns it into a process with code, stack and global data segments.

pub mod loader;

pub use loader::Program;
