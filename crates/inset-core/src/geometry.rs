//! Mapping between inner canvas space and outer screen space.

use egui::{Pos2, Rect, Vec2};

/// Affine map `screen = local * scale + origin`.
///
/// `origin` is the top-left screen position of the embedding region and
/// `scale` the current zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    /// Screen position of the canvas' local `(0, 0)`.
    pub origin: Pos2,
    /// Zoom factor applied to every local coordinate.
    pub scale: f32,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CanvasTransform {
    /// No offset, unit scale.
    pub const IDENTITY: Self = Self {
        origin: Pos2::ZERO,
        scale: 1.0,
    };

    /// Create a new transform
    pub fn new(origin: Pos2, scale: f32) -> Self {
        Self { origin, scale }
    }

    /// Local canvas position to screen position.
    #[inline]
    pub fn apply(&self, local: Pos2) -> Pos2 {
        Pos2::new(
            local.x * self.scale + self.origin.x,
            local.y * self.scale + self.origin.y,
        )
    }

    /// Transform both corners of a rectangle.
    #[inline]
    pub fn apply_rect(&self, local: Rect) -> Rect {
        Rect::from_min_max(self.apply(local.min), self.apply(local.max))
    }

    /// Screen position to local canvas position.
    #[inline]
    pub fn to_local(&self, screen: Pos2) -> Pos2 {
        ((screen - self.origin) / self.scale).to_pos2()
    }

    /// Screen-space distance to local distance.
    #[inline]
    pub fn to_local_delta(&self, screen_delta: Vec2) -> Vec2 {
        screen_delta / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_apply_scales_then_offsets() {
        let t = CanvasTransform::new(pos2(10.0, 10.0), 2.0);
        assert_eq!(t.apply(pos2(1.0, 0.0)), pos2(12.0, 10.0));
        assert_eq!(t.apply(pos2(0.0, 1.0)), pos2(10.0, 12.0));
    }

    #[test]
    fn test_to_local_inverts_apply() {
        let t = CanvasTransform::new(pos2(-35.5, 120.0), 0.75);
        let p = pos2(13.25, -8.0);
        let back = t.to_local(t.apply(p));
        assert!((back - p).length() < 1e-4);
    }

    #[test]
    fn test_apply_rect_transforms_corners() {
        let t = CanvasTransform::new(pos2(5.0, 0.0), 0.5);
        let r = t.apply_rect(Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 40.0)));
        assert_eq!(r.min, pos2(5.0, 0.0));
        assert_eq!(r.max, pos2(55.0, 20.0));
    }
}
