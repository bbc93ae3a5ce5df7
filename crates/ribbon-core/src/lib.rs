#![forbid(unsafe_code)]

//! Core: geometry, input events, and logging for the ribbon engine.
//!
//! # Role in the workspace
//! `ribbon-core` has no knowledge of components. It defines the pixel
//! geometry the measurement layer reports, the input events a host feeds to
//! the ribbon (resize, tab switch, data refresh, focus), the resize
//! reentrancy latch, and the logging entry points shared by the other crates.
//!
//! # How it fits in the system
//! `ribbon-layout` builds the component tree on top of these types and
//! `ribbon-runtime` consumes [`event::Event`] values to drive scale passes.

pub mod event;
pub mod geometry;
pub mod latch;
pub mod logging;

pub use event::Event;
pub use geometry::{Rect, Size};
pub use latch::{LatchGuard, ResizeLatch};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, info, info_span, trace, warn};
