//! Draw Data - vertex, index and command buffers produced by a context
//!
//! A [`DrawList`] is the append-only geometry of one window for one frame.
//! Its `vtx_current_idx` cursor counts the vertices of the *current segment*
//! when the renderer supports per-command vertex offsets, and the absolute
//! vertex count otherwise. Indices written by primitives are relative to that
//! cursor, which is what keeps 16-bit indices valid on large meshes.

use egui::epaint::Vertex;
use egui::{Color32, Pos2, Rect, TextureId};
use std::fmt;

/// Number of vertices a 16-bit index segment can address.
pub const SEGMENT_VERTEX_LIMIT: u32 = 1 << 16;

/// UV of the opaque white texel in the font atlas.
pub const WHITE_UV: Pos2 = Pos2::ZERO;

/// Index width of a draw list.
pub trait DrawIndex: Copy + Default + fmt::Debug + Eq + Send + Sync + 'static {
    /// Largest representable index.
    const MAX: u32;

    /// Narrow a `u32` index. Values above [`Self::MAX`] are a caller bug.
    fn from_u32(value: u32) -> Self;

    /// Widen to `u32`.
    fn to_u32(self) -> u32;

    /// Whether vertex counts per segment are capped by the index width.
    fn is_narrow() -> bool {
        Self::MAX < u32::MAX
    }
}

impl DrawIndex for u16 {
    const MAX: u32 = u16::MAX as u32;

    #[inline]
    fn from_u32(value: u32) -> Self {
        debug_assert!(value <= <Self as DrawIndex>::MAX, "index {value} does not fit 16 bits");
        value as u16
    }

    #[inline]
    fn to_u32(self) -> u32 {
        u32::from(self)
    }
}

impl DrawIndex for u32 {
    const MAX: u32 = u32::MAX;

    #[inline]
    fn from_u32(value: u32) -> Self {
        value
    }

    #[inline]
    fn to_u32(self) -> u32 {
        self
    }
}

/// One draw call: a run of indices sharing clip rect, texture and vertex base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCmd {
    /// Scissor rectangle in screen coordinates.
    pub clip_rect: Rect,
    /// Texture sampled by this command.
    pub texture_id: TextureId,
    /// First vertex of this command's segment. Added to every index by
    /// renderers with [`crate::BackendFlags::RENDERER_HAS_VTX_OFFSET`].
    pub vtx_offset: u32,
    /// First index of this command in the index buffer.
    pub idx_offset: u32,
    /// Number of indices (a multiple of 3).
    pub elem_count: u32,
}

impl DrawCmd {
    /// Range of this command in the index buffer.
    #[inline]
    pub fn idx_range(&self) -> std::ops::Range<usize> {
        let start = self.idx_offset as usize;
        start..start + self.elem_count as usize
    }
}

/// Append-only geometry for one window.
#[derive(Debug, Clone)]
pub struct DrawList<I: DrawIndex> {
    /// Vertex buffer
    pub vtx_buffer: Vec<Vertex>,
    /// Index buffer
    pub idx_buffer: Vec<I>,
    /// Draw commands, in submission order
    pub cmd_buffer: Vec<DrawCmd>,
    vtx_current_idx: u32,
    allow_vtx_offset: bool,
    clip_stack: Vec<Rect>,
    texture_id: TextureId,
}

impl<I: DrawIndex> Default for DrawList<I> {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<I: DrawIndex> DrawList<I> {
    /// Create an empty list. `allow_vtx_offset` mirrors the renderer capability.
    pub fn new(allow_vtx_offset: bool) -> Self {
        Self {
            vtx_buffer: Vec::new(),
            idx_buffer: Vec::new(),
            cmd_buffer: Vec::new(),
            vtx_current_idx: 0,
            allow_vtx_offset,
            clip_stack: Vec::new(),
            texture_id: TextureId::default(),
        }
    }

    /// Drop all geometry, keeping allocations.
    pub fn clear(&mut self) {
        self.vtx_buffer.clear();
        self.idx_buffer.clear();
        self.cmd_buffer.clear();
        self.vtx_current_idx = 0;
        self.clip_stack.clear();
        self.texture_id = TextureId::default();
    }

    /// Whether the list holds nothing drawable.
    pub fn is_empty(&self) -> bool {
        self.vtx_buffer.is_empty() || self.cmd_buffer.is_empty()
    }

    /// Whether new segments may start at a non-zero vertex offset.
    pub fn allows_vtx_offset(&self) -> bool {
        self.allow_vtx_offset
    }

    /// Vertices in the current segment (vertex-offset mode) or in total (legacy mode).
    pub fn vtx_current_idx(&self) -> u32 {
        self.vtx_current_idx
    }

    /// Move the cursor. Callers splicing foreign geometry must leave it at
    /// the vertex count of the last segment they wrote.
    pub fn set_vtx_current_idx(&mut self, value: u32) {
        self.vtx_current_idx = value;
    }

    /// Vertex offset new commands are recorded against.
    fn current_vtx_offset(&self) -> u32 {
        if self.allow_vtx_offset {
            (self.vtx_buffer.len() as u32).saturating_sub(self.vtx_current_idx)
        } else {
            0
        }
    }

    /// Active clip rectangle.
    pub fn clip_rect(&self) -> Rect {
        self.clip_stack.last().copied().unwrap_or(Rect::EVERYTHING)
    }

    /// Push a clip rectangle, intersected with the current one.
    pub fn push_clip_rect(&mut self, rect: Rect) {
        let clipped = rect.intersect(self.clip_rect());
        self.clip_stack.push(clipped);
    }

    /// Pop the last pushed clip rectangle.
    pub fn pop_clip_rect(&mut self) {
        self.clip_stack.pop();
    }

    /// Texture used by subsequent primitives.
    pub fn set_texture(&mut self, texture_id: TextureId) {
        self.texture_id = texture_id;
    }

    /// Make room for a primitive and account its indices to a command.
    ///
    /// With narrow indices and vertex-offset support, a new segment starts
    /// before the cursor would reach [`SEGMENT_VERTEX_LIMIT`].
    pub fn prim_reserve(&mut self, idx_count: usize, vtx_count: usize) {
        if I::is_narrow()
            && self.allow_vtx_offset
            && self.vtx_current_idx as usize + vtx_count >= SEGMENT_VERTEX_LIMIT as usize
        {
            self.vtx_current_idx = 0;
        }

        let clip_rect = self.clip_rect();
        let texture_id = self.texture_id;
        let vtx_offset = self.current_vtx_offset();
        let idx_end = self.idx_buffer.len() as u32;

        let extend_last = self.cmd_buffer.last().is_some_and(|cmd| {
            cmd.clip_rect == clip_rect
                && cmd.texture_id == texture_id
                && cmd.vtx_offset == vtx_offset
                && cmd.idx_offset + cmd.elem_count == idx_end
        });

        if extend_last {
            if let Some(cmd) = self.cmd_buffer.last_mut() {
                cmd.elem_count += idx_count as u32;
            }
        } else {
            self.cmd_buffer.push(DrawCmd {
                clip_rect,
                texture_id,
                vtx_offset,
                idx_offset: idx_end,
                elem_count: idx_count as u32,
            });
        }

        self.vtx_buffer.reserve(vtx_count);
        self.idx_buffer.reserve(idx_count);
    }

    fn write_vertices(&mut self, positions: &[Pos2], color: Color32) {
        self.vtx_buffer
            .extend(positions.iter().map(|&pos| Vertex {
                pos,
                uv: WHITE_UV,
                color,
            }));
    }

    fn write_indices(&mut self, relative: &[u32]) {
        let base = self.vtx_current_idx;
        self.idx_buffer
            .extend(relative.iter().map(|&i| I::from_u32(base + i)));
    }

    /// Solid axis-aligned rectangle.
    pub fn add_rect_filled(&mut self, rect: Rect, color: Color32) {
        self.prim_reserve(6, 4);
        self.write_indices(&[0, 1, 2, 0, 2, 3]);
        self.write_vertices(
            &[rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom()],
            color,
        );
        self.vtx_current_idx += 4;
    }

    /// Solid triangle.
    pub fn add_triangle_filled(&mut self, a: Pos2, b: Pos2, c: Pos2, color: Color32) {
        self.prim_reserve(3, 3);
        self.write_indices(&[0, 1, 2]);
        self.write_vertices(&[a, b, c], color);
        self.vtx_current_idx += 3;
    }
}

/// All draw lists produced by one frame of one context.
#[derive(Debug, Clone)]
pub struct DrawData<I: DrawIndex> {
    /// Lists in back-to-front order
    pub lists: Vec<DrawList<I>>,
    /// Top-left of the rendered viewport
    pub display_pos: Pos2,
    /// Size of the rendered viewport
    pub display_size: egui::Vec2,
}

impl<I: DrawIndex> Default for DrawData<I> {
    fn default() -> Self {
        Self {
            lists: Vec::new(),
            display_pos: Pos2::ZERO,
            display_size: egui::Vec2::ZERO,
        }
    }
}

impl<I: DrawIndex> DrawData<I> {
    /// Sum of vertex counts over all lists.
    pub fn total_vtx_count(&self) -> usize {
        self.lists.iter().map(|l| l.vtx_buffer.len()).sum()
    }

    /// Sum of index counts over all lists.
    pub fn total_idx_count(&self) -> usize {
        self.lists.iter().map(|l| l.idx_buffer.len()).sum()
    }

    /// Sum of command counts over all lists.
    pub fn total_cmd_count(&self) -> usize {
        self.lists.iter().map(|l| l.cmd_buffer.len()).sum()
    }
}
