//! Draw-data compositor.
//!
//! Splices a draw list produced by the inner context into a list owned by
//! the outer context, moving every position through a [`CanvasTransform`].
//! Two strategies exist and share no logic: renderers that honor
//! `DrawCmd::vtx_offset` get a bulk index copy with command fix-ups, legacy
//! renderers get indices rebased to absolute values one by one.

use crate::draw::{DrawIndex, DrawList};
use crate::flags::BackendFlags;
use crate::geometry::CanvasTransform;
use egui::epaint::Vertex;
use thiserror::Error;

/// Faults raised while splicing. Both indicate a backend flag mismatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompositeError {
    /// A legacy renderer was handed a segmented list.
    #[error("command {command} has vtx_offset {vtx_offset} but the renderer lacks vertex-offset support")]
    NonZeroVtxOffset {
        /// Index of the offending command in the source list
        command: usize,
        /// Its vertex offset
        vtx_offset: u32,
    },

    /// Rebased indices would not fit the index type.
    #[error("rebased index {max_index} exceeds index limit {limit}; enable vertex offsets or use 32-bit indices")]
    IndexOverflow {
        /// Largest index the splice would produce
        max_index: u64,
        /// Largest index the destination can store
        limit: u64,
    },
}

/// Splice strategy, chosen from the outer renderer's capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositePath {
    /// Indices stay segment-relative; commands carry the vertex base.
    VtxOffset,
    /// Vertex base is baked into every index.
    Legacy,
}

impl CompositePath {
    /// Select the path a renderer with these flags can draw.
    pub fn for_backend(flags: BackendFlags) -> Self {
        if flags.has_vtx_offset() {
            Self::VtxOffset
        } else {
            Self::Legacy
        }
    }
}

/// Append `src` to `dst` in screen space.
///
/// Returns the value the destination's vertex cursor must hold afterwards:
/// the vertex count of the last segment written (vertex-offset path) or the
/// absolute vertex count (legacy path). An empty `src` leaves `dst` untouched
/// and returns its current cursor. On error `dst` is not modified.
pub fn append_draw_list<I: DrawIndex>(
    dst: &mut DrawList<I>,
    src: &DrawList<I>,
    transform: CanvasTransform,
    path: CompositePath,
) -> Result<u32, CompositeError> {
    if src.is_empty() {
        return Ok(dst.vtx_current_idx());
    }

    if path == CompositePath::Legacy {
        validate_legacy(dst, src)?;
    }

    let vtx_start = dst.vtx_buffer.len() as u32;
    let idx_start = dst.idx_buffer.len() as u32;

    dst.cmd_buffer.reserve(src.cmd_buffer.len());
    transform_vertices(&mut dst.vtx_buffer, &src.vtx_buffer, transform);

    let cursor = match path {
        CompositePath::VtxOffset => splice_with_vtx_offset(dst, src, transform, vtx_start, idx_start),
        CompositePath::Legacy => splice_legacy(dst, src, transform, vtx_start, idx_start),
    };

    tracing::trace!(
        vertices = src.vtx_buffer.len(),
        indices = src.idx_buffer.len(),
        commands = src.cmd_buffer.len(),
        ?path,
        "spliced inner draw list"
    );

    Ok(cursor)
}

#[inline]
fn transform_vertices(dst: &mut Vec<Vertex>, src: &[Vertex], transform: CanvasTransform) {
    dst.extend(src.iter().map(|v| Vertex {
        pos: transform.apply(v.pos),
        uv: v.uv,
        color: v.color,
    }));
}

fn validate_legacy<I: DrawIndex>(dst: &DrawList<I>, src: &DrawList<I>) -> Result<(), CompositeError> {
    if let Some((command, cmd)) = src
        .cmd_buffer
        .iter()
        .enumerate()
        .find(|(_, cmd)| cmd.vtx_offset != 0)
    {
        return Err(CompositeError::NonZeroVtxOffset {
            command,
            vtx_offset: cmd.vtx_offset,
        });
    }

    // Every command has a zero offset, so the base is the destination size.
    let max_index = dst.vtx_buffer.len() as u64 + src.vtx_buffer.len() as u64 - 1;
    let limit = u64::from(I::MAX);
    if max_index > limit {
        return Err(CompositeError::IndexOverflow { max_index, limit });
    }
    Ok(())
}

fn splice_with_vtx_offset<I: DrawIndex>(
    dst: &mut DrawList<I>,
    src: &DrawList<I>,
    transform: CanvasTransform,
    vtx_start: u32,
    idx_start: u32,
) -> u32 {
    dst.idx_buffer.extend_from_slice(&src.idx_buffer);

    let src_vtx_len = src.vtx_buffer.len() as u32;
    let mut cached_vtx_offset = None;
    let mut segment_vtx_count = 0;

    for (ci, &cmd) in src.cmd_buffer.iter().enumerate() {
        // Commands arrive in non-decreasing vtx_offset order; only rescan
        // when a new segment begins.
        if cached_vtx_offset != Some(cmd.vtx_offset) {
            cached_vtx_offset = Some(cmd.vtx_offset);
            let next_offset = src.cmd_buffer[ci + 1..]
                .iter()
                .map(|next| next.vtx_offset)
                .find(|&offset| offset > cmd.vtx_offset)
                .unwrap_or(src_vtx_len);
            segment_vtx_count = next_offset - cmd.vtx_offset;
        }

        let mut out = cmd;
        out.clip_rect = transform.apply_rect(cmd.clip_rect);
        out.vtx_offset += vtx_start;
        out.idx_offset += idx_start;
        dst.cmd_buffer.push(out);
    }

    segment_vtx_count
}

fn splice_legacy<I: DrawIndex>(
    dst: &mut DrawList<I>,
    src: &DrawList<I>,
    transform: CanvasTransform,
    vtx_start: u32,
    idx_start: u32,
) -> u32 {
    let dst_idx_base = idx_start as usize;
    dst.idx_buffer
        .resize(dst_idx_base + src.idx_buffer.len(), I::default());

    for &cmd in &src.cmd_buffer {
        let base = vtx_start + cmd.vtx_offset;
        let range = cmd.idx_range();
        let out_range = dst_idx_base + range.start..dst_idx_base + range.end;
        for (di, &si) in dst.idx_buffer[out_range]
            .iter_mut()
            .zip(&src.idx_buffer[range])
        {
            *di = I::from_u32(si.to_u32() + base);
        }

        let mut out = cmd;
        out.clip_rect = transform.apply_rect(cmd.clip_rect);
        out.vtx_offset = 0;
        out.idx_offset += idx_start;
        dst.cmd_buffer.push(out);
    }

    vtx_start + src.vtx_buffer.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::DrawCmd;
    use egui::{pos2, Color32, Pos2, Rect, TextureId};

    fn vertex(x: f32, y: f32) -> Vertex {
        Vertex {
            pos: pos2(x, y),
            uv: pos2(x * 0.25, 0.5),
            color: Color32::from_rgba_unmultiplied(10, 20, 30, 200),
        }
    }

    fn cmd(vtx_offset: u32, idx_offset: u32, elem_count: u32) -> DrawCmd {
        DrawCmd {
            clip_rect: Rect::from_min_max(pos2(0.0, 0.0), pos2(50.0, 25.0)),
            texture_id: TextureId::Managed(0),
            vtx_offset,
            idx_offset,
            elem_count,
        }
    }

    fn triangle_list<I: DrawIndex>() -> DrawList<I> {
        let mut list = DrawList::new(true);
        list.vtx_buffer = vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)];
        list.idx_buffer = [0, 1, 2].into_iter().map(I::from_u32).collect();
        list.cmd_buffer = vec![cmd(0, 0, 3)];
        list
    }

    fn transform() -> CanvasTransform {
        CanvasTransform::new(pos2(10.0, 10.0), 2.0)
    }

    #[test]
    fn test_vertices_are_transformed() {
        let src = triangle_list::<u16>();
        let mut dst = DrawList::<u16>::new(true);
        append_draw_list(&mut dst, &src, transform(), CompositePath::VtxOffset).unwrap();

        let positions: Vec<Pos2> = dst.vtx_buffer.iter().map(|v| v.pos).collect();
        assert_eq!(positions, vec![pos2(10.0, 10.0), pos2(12.0, 10.0), pos2(10.0, 12.0)]);
        for (d, s) in dst.vtx_buffer.iter().zip(&src.vtx_buffer) {
            assert_eq!(d.uv, s.uv);
            assert_eq!(d.color, s.color);
        }
        assert_eq!(dst.cmd_buffer[0].clip_rect.min, pos2(10.0, 10.0));
        assert_eq!(dst.cmd_buffer[0].clip_rect.max, pos2(110.0, 60.0));
    }

    #[test]
    fn test_empty_source_is_noop() {
        let mut src = triangle_list::<u16>();
        src.cmd_buffer.clear();
        let mut dst = triangle_list::<u16>();
        dst.set_vtx_current_idx(3);

        let cursor = append_draw_list(&mut dst, &src, transform(), CompositePath::VtxOffset).unwrap();
        assert_eq!(cursor, 3);
        assert_eq!(dst.vtx_buffer.len(), 3);
        assert_eq!(dst.cmd_buffer.len(), 1);

        let empty = DrawList::<u16>::new(true);
        append_draw_list(&mut dst, &empty, transform(), CompositePath::Legacy).unwrap();
        assert_eq!(dst.idx_buffer.len(), 3);
    }

    #[test]
    fn test_offsets_shift_by_destination_size() {
        let src = triangle_list::<u16>();
        let mut dst = DrawList::<u16>::new(true);
        dst.vtx_buffer = (0..100).map(|i| vertex(i as f32, 0.0)).collect();
        dst.idx_buffer = vec![0; 30];
        dst.cmd_buffer = vec![cmd(0, 0, 30)];

        let cursor = append_draw_list(&mut dst, &src, transform(), CompositePath::VtxOffset).unwrap();
        let appended = dst.cmd_buffer[1];
        assert_eq!(appended.vtx_offset, 100);
        assert_eq!(appended.idx_offset, 30);
        // Indices are copied verbatim.
        assert_eq!(dst.idx_buffer[30..], [0, 1, 2]);
        assert_eq!(cursor, 3);
    }

    #[test]
    fn test_consecutive_appends_stack_up() {
        let mut first = DrawList::<u16>::new(true);
        first.vtx_buffer = (0..100).map(|i| vertex(i as f32, 0.0)).collect();
        first.idx_buffer = vec![0, 1, 2, 97, 98, 99];
        first.cmd_buffer = vec![cmd(0, 0, 6)];
        let second = triangle_list::<u16>();

        let mut dst = DrawList::<u16>::new(true);
        let cursor = append_draw_list(&mut dst, &first, transform(), CompositePath::VtxOffset).unwrap();
        dst.set_vtx_current_idx(cursor);
        assert_eq!(dst.vtx_current_idx(), 100);
        assert_eq!(dst.cmd_buffer[0].vtx_offset, 0);

        let cursor = append_draw_list(&mut dst, &second, transform(), CompositePath::VtxOffset).unwrap();
        dst.set_vtx_current_idx(cursor);

        assert_eq!(dst.vtx_buffer.len(), 103);
        assert_eq!(dst.cmd_buffer.len(), 2);
        assert_eq!(dst.cmd_buffer[1].vtx_offset, 100);
        assert_eq!(dst.cmd_buffer[1].idx_offset, 6);
        assert_eq!(dst.vtx_current_idx(), 3);

        // Primitives drawn afterwards continue the spliced segment.
        dst.add_rect_filled(Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)), Color32::RED);
        let last = dst.cmd_buffer[dst.cmd_buffer.len() - 1];
        assert_eq!(last.vtx_offset, 100);
        assert_eq!(dst.idx_buffer[last.idx_range()], [3, 4, 5, 3, 5, 6]);
    }

    #[test]
    fn test_cursor_tracks_last_segment_only() {
        // Two segments: 70000 vertices would overflow 16 bits as a total.
        let mut src = DrawList::<u16>::new(true);
        src.vtx_buffer = vec![vertex(0.0, 0.0); 70_000];
        src.idx_buffer = vec![0, 1, 2, 0, 1, 2, 0, 1, 2];
        src.cmd_buffer = vec![cmd(0, 0, 3), cmd(0, 3, 3), cmd(60_000, 6, 3)];

        let mut dst = DrawList::<u16>::new(true);
        let cursor = append_draw_list(&mut dst, &src, transform(), CompositePath::VtxOffset).unwrap();

        assert_eq!(cursor, 10_000);
        let offsets: Vec<u32> = dst.cmd_buffer.iter().map(|c| c.vtx_offset).collect();
        assert_eq!(offsets, vec![0, 0, 60_000]);
    }

    #[test]
    fn test_legacy_bakes_vertex_base() {
        let src = triangle_list::<u16>();
        let mut dst = DrawList::<u16>::new(false);
        dst.vtx_buffer = (0..100).map(|i| vertex(i as f32, 0.0)).collect();
        dst.idx_buffer = vec![0; 6];
        dst.cmd_buffer = vec![cmd(0, 0, 6)];

        let cursor = append_draw_list(&mut dst, &src, transform(), CompositePath::Legacy).unwrap();
        assert_eq!(dst.idx_buffer[6..], [100, 101, 102]);
        assert_eq!(dst.cmd_buffer[1].vtx_offset, 0);
        assert_eq!(dst.cmd_buffer[1].idx_offset, 6);
        assert_eq!(cursor, 103);
    }

    #[test]
    fn test_legacy_rejects_vtx_offset() {
        let mut src = triangle_list::<u32>();
        src.cmd_buffer.push(cmd(2, 0, 3));
        let mut dst = DrawList::<u32>::new(false);

        let err = append_draw_list(&mut dst, &src, transform(), CompositePath::Legacy).unwrap_err();
        assert_eq!(
            err,
            CompositeError::NonZeroVtxOffset {
                command: 1,
                vtx_offset: 2
            }
        );
        assert!(dst.vtx_buffer.is_empty());
    }

    #[test]
    fn test_legacy_reports_index_overflow() {
        let src = triangle_list::<u16>();
        let mut dst = DrawList::<u16>::new(false);
        dst.vtx_buffer = vec![vertex(0.0, 0.0); 65_534];

        let err = append_draw_list(&mut dst, &src, transform(), CompositePath::Legacy).unwrap_err();
        assert_eq!(
            err,
            CompositeError::IndexOverflow {
                max_index: 65_536,
                limit: 65_535
            }
        );
        assert_eq!(dst.vtx_buffer.len(), 65_534);
    }

    #[test]
    fn test_wide_indices_accept_large_legacy_base() {
        let src = triangle_list::<u32>();
        let mut dst = DrawList::<u32>::new(false);
        dst.vtx_buffer = vec![vertex(0.0, 0.0); 70_000];

        append_draw_list(&mut dst, &src, transform(), CompositePath::Legacy).unwrap();
        assert_eq!(dst.idx_buffer[..], [70_000, 70_001, 70_002]);
    }

    #[test]
    fn test_path_follows_backend_flags() {
        assert_eq!(
            CompositePath::for_backend(BackendFlags::RENDERER_HAS_VTX_OFFSET),
            CompositePath::VtxOffset
        );
        assert_eq!(
            CompositePath::for_backend(BackendFlags::RENDERER_HAS_TEXTURES),
            CompositePath::Legacy
        );
    }
}
