//! Headless Backend - a GPU-less immediate-mode host
//!
//! Implements [`UiBackend`] with just enough of an immediate-mode library to
//! drive nested canvases in tests and benchmarks:
//! - a slot table of contexts sharing a reference-counted font atlas
//! - input queues resolved into [`Io`] at frame start, then kept as the trail
//! - a window stack with per-window draw lists and vertical child layout
//! - hover resolved at frame start from the previous frame's windows, topmost first
//!
//! The implicit root window of each context is never hoverable, so only
//! windows the caller opened can claim the pointer.

use crate::backend::{ChildRegion, HoverScope, UiBackend};
use crate::draw::{DrawData, DrawIndex, DrawList};
use crate::flags::{BackendFlags, ConfigFlags};
use crate::input::{InputEvent, Io};
use egui::{Color32, Key, PointerButton, Pos2, Rect, TextureId, Vec2, NUM_POINTER_BUTTONS};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::trace;

/// Handle of a headless context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(usize);

/// Glyph atlas shared between contexts.
#[derive(Debug, PartialEq)]
pub struct FontAtlas {
    /// Texture holding the glyphs; every window draws with it bound
    pub texture_id: TextureId,
}

impl Default for FontAtlas {
    fn default() -> Self {
        Self {
            texture_id: TextureId::Managed(0),
        }
    }
}

/// Visual style of a headless context.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessStyle {
    /// Padding inside top-level windows
    pub window_padding: Vec2,
    /// Vertical gap between stacked children
    pub item_spacing: f32,
}

impl Default for HeadlessStyle {
    fn default() -> Self {
        Self {
            window_padding: Vec2::splat(8.0),
            item_spacing: 4.0,
        }
    }
}

struct Window<I: DrawIndex> {
    id: u64,
    rect: Rect,
    /// Ids from the root down to this window, inclusive.
    ancestry: Vec<u64>,
    cursor: Pos2,
    font_density: f32,
    draw_list: DrawList<I>,
}

#[derive(Debug, Clone, Default)]
struct HoveredWindow {
    id: u64,
    ancestry: Vec<u64>,
}

struct HeadlessContext<I: DrawIndex> {
    io: Io,
    style: HeadlessStyle,
    fonts: Arc<FontAtlas>,
    input_queue: Vec<InputEvent>,
    input_trail: Vec<InputEvent>,
    buttons_down: [bool; NUM_POINTER_BUTTONS],
    keys_down: HashSet<Key>,
    keys_pressed: HashSet<Key>,
    windows: Vec<Window<I>>,
    window_stack: Vec<usize>,
    /// Rects of last frame's hoverable windows in submission order.
    last_frame_windows: Vec<(Rect, Vec<u64>)>,
    hovered: Option<HoveredWindow>,
    id_stack: Vec<u64>,
    item_active: bool,
    frame_count: u64,
}

impl<I: DrawIndex> HeadlessContext<I> {
    fn new(fonts: Arc<FontAtlas>, display_size: Vec2, backend_flags: BackendFlags) -> Self {
        Self {
            io: Io {
                display_size,
                backend_flags,
                ..Default::default()
            },
            style: HeadlessStyle::default(),
            fonts,
            input_queue: Vec::new(),
            input_trail: Vec::new(),
            buttons_down: [false; NUM_POINTER_BUTTONS],
            keys_down: HashSet::new(),
            keys_pressed: HashSet::new(),
            windows: Vec::new(),
            window_stack: Vec::new(),
            last_frame_windows: Vec::new(),
            hovered: None,
            id_stack: Vec::new(),
            item_active: false,
            frame_count: 0,
        }
    }

    fn resolve_input(&mut self) {
        let previous_mouse = self.io.mouse_pos;
        self.io.mouse_wheel = 0.0;
        self.io.mouse_wheel_h = 0.0;
        self.keys_pressed.clear();

        let mut changed_buttons = [false; NUM_POINTER_BUTTONS];
        let mut resolved = 0;
        for event in &self.input_queue {
            match event {
                InputEvent::MousePos(pos) => self.io.mouse_pos = *pos,
                InputEvent::MouseButton { button, down } => {
                    let slot = *button as usize;
                    // Trickling defers a second change of the same button.
                    if self.io.trickle_input && changed_buttons[slot] {
                        break;
                    }
                    changed_buttons[slot] = true;
                    self.buttons_down[slot] = *down;
                }
                InputEvent::MouseWheel(delta) => {
                    self.io.mouse_wheel += delta.y;
                    self.io.mouse_wheel_h += delta.x;
                }
                InputEvent::Key { key, down, .. } => {
                    if *down {
                        if self.keys_down.insert(*key) {
                            self.keys_pressed.insert(*key);
                        }
                    } else {
                        self.keys_down.remove(key);
                    }
                }
                InputEvent::Focus(false) => {
                    self.buttons_down = [false; NUM_POINTER_BUTTONS];
                    self.keys_down.clear();
                }
                InputEvent::Focus(true) | InputEvent::Text(_) => {}
            }
            resolved += 1;
        }

        self.input_trail = self.input_queue.drain(..resolved).collect();
        self.io.mouse_delta = self.io.mouse_pos - previous_mouse;
    }

    fn resolve_hover(&mut self) {
        self.hovered = None;
        if self.io.config_flags.contains(ConfigFlags::NO_MOUSE) {
            return;
        }
        let mouse = self.io.mouse_pos;
        self.hovered = self
            .last_frame_windows
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(mouse))
            .map(|(_, ancestry)| HoveredWindow {
                id: ancestry.last().copied().unwrap_or_default(),
                ancestry: ancestry.clone(),
            });
    }

    fn window_id(&self, parent: Option<u64>, name: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        parent.hash(&mut hasher);
        self.id_stack.last().hash(&mut hasher);
        name.hash(&mut hasher);
        hasher.finish()
    }

    fn push_window(&mut self, name: &str, rect: Rect, parent: Option<usize>) -> usize {
        let parent_window = parent.map(|p| &self.windows[p]);
        let id = self.window_id(parent_window.map(|w| w.id), name);
        let mut ancestry = parent_window.map(|w| w.ancestry.clone()).unwrap_or_default();
        ancestry.push(id);

        let mut draw_list = DrawList::new(self.io.backend_flags.has_vtx_offset());
        draw_list.set_texture(self.fonts.texture_id);
        self.windows.push(Window {
            id,
            rect,
            ancestry,
            cursor: rect.min,
            font_density: 1.0,
            draw_list,
        });
        let index = self.windows.len() - 1;
        self.window_stack.push(index);
        index
    }

    fn current_window(&self) -> &Window<I> {
        let index = *self
            .window_stack
            .last()
            .unwrap_or_else(|| panic!("no window open; call new_frame() first"));
        &self.windows[index]
    }

    fn current_window_mut(&mut self) -> &mut Window<I> {
        let index = *self
            .window_stack
            .last()
            .unwrap_or_else(|| panic!("no window open; call new_frame() first"));
        &mut self.windows[index]
    }
}

/// GPU-less [`UiBackend`] with index type `I`.
pub struct HeadlessBackend<I: DrawIndex = u16> {
    contexts: Vec<Option<HeadlessContext<I>>>,
    current: Option<ContextId>,
}

impl<I: DrawIndex> HeadlessBackend<I> {
    /// Create a backend with one active root context.
    pub fn new(display_size: Vec2, backend_flags: BackendFlags) -> Self {
        let root = HeadlessContext::new(Arc::new(FontAtlas::default()), display_size, backend_flags);
        Self {
            contexts: vec![Some(root)],
            current: Some(ContextId(0)),
        }
    }

    /// The context created by [`HeadlessBackend::new`].
    pub fn root_context(&self) -> ContextId {
        ContextId(0)
    }

    /// Number of live contexts.
    pub fn context_count(&self) -> usize {
        self.contexts.iter().filter(|c| c.is_some()).count()
    }

    /// Font atlas used by `ctx`.
    pub fn fonts(&self, ctx: ContextId) -> &Arc<FontAtlas> {
        &self.ctx(ctx).fonts
    }

    /// Frames started on `ctx`.
    pub fn frame_count(&self, ctx: ContextId) -> u64 {
        self.ctx(ctx).frame_count
    }

    /// Append an event to the pending queue of `ctx`.
    pub fn queue_event(&mut self, ctx: ContextId, event: InputEvent) {
        self.ctx_mut(ctx).input_queue.push(event);
    }

    /// Events of `ctx` not yet resolved.
    pub fn pending_events(&self, ctx: ContextId) -> &[InputEvent] {
        &self.ctx(ctx).input_queue
    }

    /// Mark a widget of the active context as holding focus this frame.
    pub fn set_item_active(&mut self, active: bool) {
        self.current_mut().item_active = active;
    }

    /// Glyph density of the current window.
    pub fn font_density(&self) -> f32 {
        self.current().current_window().font_density
    }

    /// Rectangle of the current window.
    pub fn window_rect(&self) -> Rect {
        self.current().current_window().rect
    }

    /// Draw a filled rectangle in the current window.
    pub fn add_rect_filled(&mut self, rect: Rect, color: Color32) {
        self.window_draw_list().add_rect_filled(rect, color);
    }

    fn ctx(&self, ctx: ContextId) -> &HeadlessContext<I> {
        match self.contexts.get(ctx.0) {
            Some(Some(c)) => c,
            _ => panic!("{ctx:?} does not exist"),
        }
    }

    fn ctx_mut(&mut self, ctx: ContextId) -> &mut HeadlessContext<I> {
        match self.contexts.get_mut(ctx.0) {
            Some(Some(c)) => c,
            _ => panic!("{ctx:?} does not exist"),
        }
    }

    fn current(&self) -> &HeadlessContext<I> {
        let id = self.current.unwrap_or_else(|| panic!("no active context"));
        self.ctx(id)
    }

    fn current_mut(&mut self) -> &mut HeadlessContext<I> {
        let id = self.current.unwrap_or_else(|| panic!("no active context"));
        self.ctx_mut(id)
    }
}

impl<I: DrawIndex> UiBackend for HeadlessBackend<I> {
    type Context = ContextId;
    type Index = I;
    type Style = HeadlessStyle;

    fn current_context(&self) -> Option<ContextId> {
        self.current
    }

    fn set_current_context(&mut self, ctx: Option<ContextId>) {
        self.current = ctx;
    }

    fn create_context(&mut self, share_fonts_with: ContextId) -> ContextId {
        let fonts = Arc::clone(&self.ctx(share_fonts_with).fonts);
        let context = HeadlessContext::new(fonts, Vec2::ZERO, BackendFlags::empty());
        let slot = match self.contexts.iter().position(Option::is_none) {
            Some(free) => {
                self.contexts[free] = Some(context);
                free
            }
            None => {
                self.contexts.push(Some(context));
                self.contexts.len() - 1
            }
        };
        ContextId(slot)
    }

    fn destroy_context(&mut self, ctx: ContextId) {
        debug_assert!(self.current != Some(ctx), "destroying the active context");
        if let Some(slot) = self.contexts.get_mut(ctx.0) {
            *slot = None;
        }
    }

    fn io(&self, ctx: ContextId) -> &Io {
        &self.ctx(ctx).io
    }

    fn io_mut(&mut self, ctx: ContextId) -> &mut Io {
        &mut self.ctx_mut(ctx).io
    }

    fn style(&self, ctx: ContextId) -> &HeadlessStyle {
        &self.ctx(ctx).style
    }

    fn set_style(&mut self, ctx: ContextId, style: HeadlessStyle) {
        self.ctx_mut(ctx).style = style;
    }

    fn input_trail(&self, ctx: ContextId) -> &[InputEvent] {
        &self.ctx(ctx).input_trail
    }

    fn set_input_queue(&mut self, ctx: ContextId, events: Vec<InputEvent>) {
        self.ctx_mut(ctx).input_queue = events;
    }

    fn push_id(&mut self, id: u64) {
        self.current_mut().id_stack.push(id);
    }

    fn pop_id(&mut self) {
        let popped = self.current_mut().id_stack.pop();
        debug_assert!(popped.is_some(), "pop_id() without push_id()");
    }

    fn begin_child(&mut self, name: &str, size: Vec2, background: Color32) -> ChildRegion {
        let ctx = self.current_mut();
        let spacing = ctx.style.item_spacing;
        let parent_index = *ctx
            .window_stack
            .last()
            .unwrap_or_else(|| panic!("begin_child() outside a frame"));

        let parent = &mut ctx.windows[parent_index];
        let available = (parent.rect.max - parent.cursor).max(Vec2::ZERO);
        let size = Vec2::new(
            if size.x > 0.0 { size.x } else { available.x },
            if size.y > 0.0 { size.y } else { available.y },
        );
        let rect = Rect::from_min_size(parent.cursor, size);
        parent.cursor.y += size.y + spacing;

        let index = ctx.push_window(name, rect, Some(parent_index));
        let child = &mut ctx.windows[index];
        if background.a() > 0 {
            child.draw_list.add_rect_filled(rect, background);
        }

        ChildRegion {
            window_pos: rect.min,
            origin: rect.min,
            available: size,
        }
    }

    fn end_child(&mut self) {
        let ctx = self.current_mut();
        debug_assert!(ctx.window_stack.len() > 1, "end_child() without begin_child()");
        ctx.window_stack.pop();
    }

    fn set_font_density(&mut self, density: f32) {
        self.current_mut().current_window_mut().font_density = density;
    }

    fn begin_wrapper_window(&mut self, name: &str) {
        let ctx = self.current_mut();
        let rect = Rect::from_min_size(Pos2::ZERO, ctx.io.display_size);
        ctx.push_window(name, rect, None);
    }

    fn end_window(&mut self) {
        let ctx = self.current_mut();
        debug_assert!(ctx.window_stack.len() > 1, "end_window() without a window");
        ctx.window_stack.pop();
    }

    fn new_frame(&mut self) {
        let ctx = self.current_mut();
        ctx.resolve_input();
        ctx.resolve_hover();

        ctx.windows.clear();
        ctx.window_stack.clear();
        ctx.item_active = false;
        ctx.frame_count += 1;

        let padding = ctx.style.window_padding;
        let display = Rect::from_min_size(Pos2::ZERO, ctx.io.display_size);
        let root = ctx.push_window("root", display, None);
        ctx.windows[root].cursor = display.min + padding;
        trace!(frame = ctx.frame_count, events = ctx.input_trail.len(), "headless frame started");
    }

    fn render(&mut self) -> DrawData<I> {
        let ctx = self.current_mut();
        debug_assert_eq!(ctx.window_stack.len(), 1, "render() with windows still open");
        ctx.window_stack.clear();

        // Root (index 0) is implicit and never hovered.
        ctx.last_frame_windows = ctx
            .windows
            .iter()
            .skip(1)
            .map(|w| (w.rect, w.ancestry.clone()))
            .collect();

        let lists = ctx
            .windows
            .iter_mut()
            .map(|w| std::mem::take(&mut w.draw_list))
            .filter(|list| !list.is_empty())
            .collect();

        DrawData {
            lists,
            display_pos: Pos2::ZERO,
            display_size: ctx.io.display_size,
        }
    }

    fn window_draw_list(&mut self) -> &mut DrawList<I> {
        &mut self.current_mut().current_window_mut().draw_list
    }

    fn is_window_hovered(&self, scope: HoverScope) -> bool {
        let ctx = self.current();
        let Some(hovered) = &ctx.hovered else {
            return false;
        };
        match scope {
            HoverScope::AnyWindow => true,
            HoverScope::CurrentWindow => hovered.id == ctx.current_window().id,
            HoverScope::ChildWindows => hovered.ancestry.contains(&ctx.current_window().id),
        }
    }

    fn is_any_item_active(&self) -> bool {
        self.current().item_active
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        self.current().keys_pressed.contains(&key)
    }

    fn is_mouse_dragging(&self, button: PointerButton) -> bool {
        self.current().buttons_down[button as usize]
    }
}
