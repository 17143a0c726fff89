//! Audio buffers, real-time render engine and output stream.
//!
//! Loops a clean recording under a noise bed whose level follows how close
//! the potentiometers are to their targets.

mod bounce;
mod buffers;
mod engine;
mod system;

// Re-export public types
pub use bounce::{bounce, BounceSummary};
pub use buffers::SignalBuffers;
pub use engine::{RenderEngine, RenderedBlock, SolvedNotice};
pub use system::{supervise, AudioSystem, StreamFormat};
