//! Host UI library abstraction.
//!
//! A [`UiBackend`] owns any number of immediate-mode contexts and one
//! "active context" pointer. Per-context state (IO, style, input queues) is
//! addressed with an explicit handle; drawing and layout calls go to the
//! active context, as immediate-mode libraries do.

use crate::draw::{DrawData, DrawIndex, DrawList};
use crate::input::{InputEvent, Io};
use egui::{Color32, Key, PointerButton, Pos2, Vec2};
use std::fmt;

/// Which windows a hover query considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverScope {
    /// The current window only
    CurrentWindow,
    /// The current window or any of its child windows
    ChildWindows,
    /// Any window of the context
    AnyWindow,
}

/// Layout of a child region opened in the active context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildRegion {
    /// Screen position of the child window
    pub window_pos: Pos2,
    /// Screen position where content starts (after padding)
    pub origin: Pos2,
    /// Content size available for drawing
    pub available: Vec2,
}

/// Services a host immediate-mode UI library provides to an embedded canvas.
pub trait UiBackend {
    /// Opaque context handle.
    type Context: Copy + Eq + fmt::Debug;
    /// Draw index width of the renderer.
    type Index: DrawIndex;
    /// Visual style, copied from outer to inner every frame.
    type Style: Clone;

    /// The active context, if any.
    fn current_context(&self) -> Option<Self::Context>;

    /// Make `ctx` the active context.
    fn set_current_context(&mut self, ctx: Option<Self::Context>);

    /// Create a context whose font atlas is shared with `share_fonts_with`.
    /// Does not change the active context.
    fn create_context(&mut self, share_fonts_with: Self::Context) -> Self::Context;

    /// Destroy a context that is not active.
    fn destroy_context(&mut self, ctx: Self::Context);

    /// IO state of `ctx`.
    fn io(&self, ctx: Self::Context) -> &Io;

    /// Mutable IO state of `ctx`.
    fn io_mut(&mut self, ctx: Self::Context) -> &mut Io;

    /// Style of `ctx`.
    fn style(&self, ctx: Self::Context) -> &Self::Style;

    /// Replace the style of `ctx`.
    fn set_style(&mut self, ctx: Self::Context, style: Self::Style);

    /// Events `ctx` resolved during its last frame.
    fn input_trail(&self, ctx: Self::Context) -> &[InputEvent];

    /// Replace the pending input of `ctx`; resolved at its next frame start.
    fn set_input_queue(&mut self, ctx: Self::Context, events: Vec<InputEvent>);

    /// Push a value onto the ID stack of the active context.
    fn push_id(&mut self, id: u64);

    /// Pop the ID stack of the active context.
    fn pop_id(&mut self);

    /// Open a child window filling at most `size` (zero axes fill the
    /// remaining space) with the given background.
    fn begin_child(&mut self, name: &str, size: Vec2, background: Color32) -> ChildRegion;

    /// Close the child window opened by [`UiBackend::begin_child`].
    fn end_child(&mut self);

    /// Rasterization density for glyphs drawn in the current window.
    fn set_font_density(&mut self, density: f32);

    /// Open an undecorated, transparent window covering the whole display.
    fn begin_wrapper_window(&mut self, name: &str);

    /// Close the window opened by [`UiBackend::begin_wrapper_window`].
    fn end_window(&mut self);

    /// Start a frame on the active context.
    fn new_frame(&mut self);

    /// Finish the active context's frame and hand over its geometry.
    fn render(&mut self) -> DrawData<Self::Index>;

    /// Draw list of the current window of the active context.
    fn window_draw_list(&mut self) -> &mut DrawList<Self::Index>;

    /// Whether the pointer is over a window in `scope`.
    fn is_window_hovered(&self, scope: HoverScope) -> bool;

    /// Whether a widget currently holds the input focus.
    fn is_any_item_active(&self) -> bool;

    /// Whether `key` went down this frame (no key repeat).
    fn is_key_pressed(&self, key: Key) -> bool;

    /// Whether `button` is held and dragging (zero threshold).
    fn is_mouse_dragging(&self, button: PointerButton) -> bool;
}
