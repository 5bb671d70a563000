//! Core trait definitions

mod transport;

pub use transport::{FrameSink, FrameSource};
