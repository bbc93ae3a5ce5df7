#![forbid(unsafe_code)]

//! Seams to the rendering host.
//!
//! The tree never touches a document directly: it asks a [`RenderHost`] to
//! create and rebuild elements and a [`Measure`] implementation for geometry.

use ribbon_core::geometry::{Rect, Size};

use crate::component::{ElementHandle, NodeView};

/// Creates and rebuilds host elements.
pub trait RenderHost {
    /// Create an empty element for `node`.
    fn create_element(&mut self, node: &NodeView<'_>) -> ElementHandle;

    /// Replace the content of `element` with `node`'s markup and `children`.
    fn rebuild(&mut self, element: ElementHandle, node: &NodeView<'_>, children: &[ElementHandle]);

    /// Locate a pre-rendered element for `node`, used when attaching.
    fn find_existing(&mut self, _node: &NodeView<'_>) -> Option<ElementHandle> {
        None
    }

    /// Toggle visibility of an element.
    fn set_hidden(&mut self, element: ElementHandle, hidden: bool);
}

/// Geometry queries against the host.
pub trait Measure {
    /// Size of the visible viewport.
    fn viewport(&self) -> Size;

    /// Bounding box of `element`, if it is laid out.
    fn element_box(&self, element: ElementHandle) -> Option<Rect>;
}

/// Both seams in one bound.
pub trait Host: RenderHost + Measure {}

impl<T: RenderHost + Measure + ?Sized> Host for T {}
