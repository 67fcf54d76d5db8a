//! Nested canvas session.
//!
//! [`NestedCanvas`] owns the inner context and everything that survives
//! between frames. [`NestedCanvas::begin`] switches the host to the inner
//! context and returns a [`CanvasFrame`]; dropping the frame switches back,
//! splices the inner geometry into the host and updates zoom and scroll.

use crate::backend::{HoverScope, UiBackend};
use crate::compositor::{append_draw_list, CompositePath};
use crate::config::CanvasConfig;
use crate::geometry::CanvasTransform;
use crate::input::remap_pointer_events;
use crate::interaction::{InteractionInput, ZoomScroll};
use egui::{Pos2, Vec2};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, warn};

static NEXT_CANVAS_ID: AtomicU64 = AtomicU64::new(1);

/// Totals of the last splice into the host draw list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpliceStats {
    /// Inner draw lists appended
    pub lists: usize,
    /// Inner draw lists rejected by the compositor
    pub skipped: usize,
    /// Vertices appended
    pub vertices: usize,
    /// Indices appended
    pub indices: usize,
    /// Commands appended
    pub commands: usize,
}

/// An inner UI context embedded in a child region of the host.
pub struct NestedCanvas<B: UiBackend> {
    config: CanvasConfig,
    id: u64,
    inner: Option<B::Context>,
    /// Host context active at `begin()`; `Some` only inside a frame.
    outer: Option<B::Context>,
    window_pos: Pos2,
    origin: Pos2,
    size: Vec2,
    zoom: ZoomScroll,
    any_window_hovered: bool,
    any_item_active: bool,
    hovered: bool,
    wrapper_open: bool,
    last_splice: SpliceStats,
}

impl<B: UiBackend> NestedCanvas<B> {
    /// Create a canvas. The inner context is created on the first `begin()`.
    pub fn new(config: CanvasConfig) -> Self {
        let zoom = ZoomScroll::new(config.default_zoom);
        Self {
            config,
            id: NEXT_CANVAS_ID.fetch_add(1, Ordering::Relaxed),
            inner: None,
            outer: None,
            window_pos: Pos2::ZERO,
            origin: Pos2::ZERO,
            size: Vec2::ZERO,
            zoom,
            any_window_hovered: false,
            any_item_active: false,
            hovered: false,
            wrapper_open: false,
            last_splice: SpliceStats::default(),
        }
    }

    /// Current configuration
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    /// Mutable configuration, applied from the next frame on
    pub fn config_mut(&mut self) -> &mut CanvasConfig {
        &mut self.config
    }

    /// Space available to the canvas in outer pixels.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Current zoom.
    pub fn scale(&self) -> f32 {
        self.zoom.scale()
    }

    /// Zoom being approached.
    pub fn scale_target(&self) -> f32 {
        self.zoom.target()
    }

    /// Screen position of the canvas' local origin.
    pub fn origin(&self) -> Pos2 {
        self.origin
    }

    /// Screen position of the embedding window.
    pub fn window_pos(&self) -> Pos2 {
        self.window_pos
    }

    /// Whether the canvas owned the pointer last frame.
    pub fn hovered(&self) -> bool {
        self.hovered
    }

    /// Accumulated pan in canvas units.
    pub fn scroll(&self) -> Vec2 {
        self.zoom.scroll()
    }

    /// Overwrite the pan offset.
    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.zoom.set_scroll(scroll);
    }

    /// Canvas-to-screen mapping in effect for the current frame.
    pub fn transform(&self) -> CanvasTransform {
        CanvasTransform::new(self.origin, self.zoom.scale())
    }

    /// Handle of the inner context, once created.
    pub fn raw_context(&self) -> Option<B::Context> {
        self.inner
    }

    /// Totals of the most recent splice.
    pub fn last_splice(&self) -> SpliceStats {
        self.last_splice
    }

    /// Whether a frame is open.
    pub fn in_frame(&self) -> bool {
        self.outer.is_some()
    }

    /// Switch the host to the inner context and start an inner frame.
    ///
    /// The returned guard ends the frame when dropped.
    ///
    /// # Panics
    ///
    /// If the host has no active context.
    pub fn begin<'a>(&'a mut self, host: &'a mut B) -> CanvasFrame<'a, B> {
        self.enter(host);
        CanvasFrame { canvas: self, host }
    }

    /// Run `add_contents` inside a canvas frame.
    pub fn show<R>(
        &mut self,
        host: &mut B,
        add_contents: impl FnOnce(&mut CanvasFrame<'_, B>) -> R,
    ) -> R {
        let mut frame = self.begin(host);
        let result = add_contents(&mut frame);
        frame.end();
        result
    }

    /// Release the inner context.
    pub fn destroy(mut self, host: &mut B) {
        if let Some(inner) = self.inner.take() {
            debug_assert!(
                host.current_context() != Some(inner),
                "inner context destroyed while active"
            );
            host.destroy_context(inner);
            debug!(canvas = self.id, ?inner, "destroyed inner context");
        }
    }

    fn font_density(&self) -> f32 {
        (self.zoom.scale() * 100.0).round() / 100.0
    }

    fn enter(&mut self, host: &mut B) {
        debug_assert!(self.outer.is_none(), "begin() called inside an open frame");
        let Some(outer) = host.current_context() else {
            panic!("NestedCanvas::begin requires an active host context");
        };

        host.push_id(self.id);
        let region = host.begin_child("view_port", self.config.size, self.config.background);
        host.set_font_density(self.font_density());

        self.window_pos = region.window_pos;
        self.origin = region.origin;
        self.size = region.available;

        let inner = match self.inner {
            Some(ctx) => ctx,
            None => {
                let ctx = host.create_context(outer);
                debug!(canvas = self.id, ?ctx, "created inner context");
                self.inner = Some(ctx);
                ctx
            }
        };

        self.outer = Some(outer);
        host.set_current_context(Some(inner));

        let style = host.style(outer).clone();
        host.set_style(inner, style);

        // Last frame's resolved events; the outer queue is still pending.
        let mut events = host.input_trail(outer).to_vec();
        remap_pointer_events(&mut events, self.transform());
        host.set_input_queue(inner, events);

        let outer_io = host.io(outer);
        let (delta_time, ime) = (outer_io.delta_time, outer_io.ime);
        let (backend_flags, config_flags) = (outer_io.backend_flags, outer_io.config_flags);

        let scale = self.zoom.scale();
        let io = host.io_mut(inner);
        io.display_size = self.size / scale;
        io.delta_time = delta_time;
        io.ime = ime;
        io.trickle_input = false;
        io.backend_flags = backend_flags;
        io.config_flags = config_flags.without_windowing();

        host.new_frame();

        if self.config.extra_window_wrapper {
            host.begin_wrapper_window("viewport_container");
            host.set_font_density(self.font_density());
            self.wrapper_open = true;
        }
    }

    fn finish(&mut self, host: &mut B) {
        debug_assert!(self.outer.is_some(), "end() without a matching begin()");
        let (Some(outer), Some(inner)) = (self.outer.take(), self.inner) else {
            return;
        };

        self.any_window_hovered = host.is_window_hovered(HoverScope::AnyWindow);
        if self.wrapper_open && host.is_window_hovered(HoverScope::CurrentWindow) {
            self.any_window_hovered = false;
        }
        self.any_item_active = host.is_any_item_active();

        if self.wrapper_open {
            host.end_window();
            self.wrapper_open = false;
        }

        let draw_data = host.render();
        let inner_ime = host.io(inner).ime;

        host.set_current_context(Some(outer));

        let transform = self.transform();
        if inner_ime.visible {
            host.io_mut(outer).ime = inner_ime.to_screen(transform);
        }

        let path = CompositePath::for_backend(host.io(outer).backend_flags);
        let mut stats = SpliceStats::default();
        let dst = host.window_draw_list();
        dst.vtx_buffer.reserve(draw_data.total_vtx_count());
        dst.idx_buffer.reserve(draw_data.total_idx_count());

        for list in &draw_data.lists {
            match append_draw_list(dst, list, transform, path) {
                Ok(cursor) => {
                    dst.set_vtx_current_idx(cursor);
                    stats.lists += 1;
                    stats.vertices += list.vtx_buffer.len();
                    stats.indices += list.idx_buffer.len();
                    stats.commands += list.cmd_buffer.len();
                }
                Err(err) => {
                    error!(canvas = self.id, %err, "dropping inner draw list");
                    stats.skipped += 1;
                }
            }
        }
        debug_assert_eq!(stats.skipped, 0, "inner draw data rejected by the compositor");
        self.last_splice = stats;

        self.hovered = host.is_window_hovered(HoverScope::ChildWindows) && !self.any_window_hovered;

        let io = host.io(outer);
        let input = InteractionInput {
            hovered: self.hovered,
            any_item_active: self.any_item_active,
            mouse_pos: io.mouse_pos,
            mouse_delta: io.mouse_delta,
            mouse_wheel: io.mouse_wheel,
            window_pos: self.window_pos,
            reset_pressed: host.is_key_pressed(self.config.reset_zoom_key),
            pan_dragging: host.is_mouse_dragging(self.config.pan_button),
        };
        self.zoom.update(&self.config, &input);

        // Read by the inner context at its next frame start.
        let local_mouse = self.transform().to_local(input.mouse_pos);
        host.io_mut(inner).mouse_pos = local_mouse;

        host.end_child();
        host.pop_id();
    }

    /// Restore the host after caller code panicked inside a frame.
    fn abort(&mut self, host: &mut B) {
        if let Some(outer) = self.outer.take() {
            self.wrapper_open = false;
            host.set_current_context(Some(outer));
            host.end_child();
            host.pop_id();
            warn!(canvas = self.id, "canvas frame unwound; inner geometry discarded");
        }
    }
}

impl<B: UiBackend> Drop for NestedCanvas<B> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner {
            warn!(canvas = self.id, ?inner, "nested canvas dropped without destroy(); inner context leaked");
        }
    }
}

/// An open canvas frame. The host's active context is the inner one until
/// this guard is dropped.
pub struct CanvasFrame<'a, B: UiBackend> {
    canvas: &'a mut NestedCanvas<B>,
    host: &'a mut B,
}

impl<'a, B: UiBackend> CanvasFrame<'a, B> {
    /// Host, with the inner context active.
    pub fn ui(&mut self) -> &mut B {
        &mut *self.host
    }

    /// The canvas this frame belongs to.
    pub fn canvas(&self) -> &NestedCanvas<B> {
        &*self.canvas
    }

    /// Outer pointer movement this frame, in canvas units.
    pub fn screen_delta(&self) -> Vec2 {
        match self.canvas.outer {
            Some(outer) => self
                .canvas
                .transform()
                .to_local_delta(self.host.io(outer).mouse_delta),
            None => Vec2::ZERO,
        }
    }

    /// End the frame now.
    pub fn end(self) {}
}

impl<B: UiBackend> Drop for CanvasFrame<'_, B> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.canvas.abort(self.host);
        } else {
            self.canvas.finish(self.host);
        }
    }
}
