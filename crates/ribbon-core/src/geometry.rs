#![forbid(unsafe_code)]

//! Geometric primitives in host pixels.

use serde::{Deserialize, Serialize};

/// Width and height of a viewport or rendered box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when the host reports a collapsed (zero) dimension.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A rendered box as reported by the measurement layer.
///
/// Origin at top-left of the host document; `x`/`y` may be negative when an
/// element is scrolled or positioned off-screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box anchored at the document origin.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether this box is larger than `other` on either axis.
    ///
    /// Position is ignored; only the extents are compared.
    #[inline]
    pub const fn exceeds(&self, other: &Rect) -> bool {
        self.width > other.width || self.height > other.height
    }
}
