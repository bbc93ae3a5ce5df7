#![forbid(unsafe_code)]

//! Reentrancy latch for resize handling.
//!
//! Reading rendered geometry can synchronously fire a resize notification
//! in some hosts. While a scale pass holds the latch, such notifications
//! are dropped instead of starting a nested pass.

use std::cell::Cell;
use std::rc::Rc;

/// Shared "currently handling resize" flag.
///
/// Clones observe the same flag, so the event source and the ribbon can
/// each hold one.
#[derive(Debug, Clone, Default)]
pub struct ResizeLatch {
    engaged: Rc<Cell<bool>>,
}

impl ResizeLatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_engaged(&self) -> bool {
        self.engaged.get()
    }

    /// Engage the latch until the guard drops.
    ///
    /// Returns `None` when it is already engaged.
    #[must_use]
    pub fn try_engage(&self) -> Option<LatchGuard> {
        if self.engaged.replace(true) {
            return None;
        }
        Some(LatchGuard {
            engaged: Rc::clone(&self.engaged),
        })
    }
}

/// Releases the latch on drop.
#[derive(Debug)]
pub struct LatchGuard {
    engaged: Rc<Cell<bool>>,
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.engaged.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_engage_is_refused() {
        let latch = ResizeLatch::new();
        let shared = latch.clone();
        let guard = latch.try_engage().unwrap();
        assert!(shared.is_engaged());
        assert!(shared.try_engage().is_none());
        drop(guard);
        assert!(!latch.is_engaged());
        assert!(shared.try_engage().is_some());
    }
}
