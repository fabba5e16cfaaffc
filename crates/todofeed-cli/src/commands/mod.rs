//! Command implementations.

pub mod daemon;
pub mod render;
pub mod status;
pub mod sync;
