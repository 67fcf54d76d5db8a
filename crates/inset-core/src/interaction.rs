//! Zoom and pan state of a nested canvas.
//!
//! Scroll is kept in canvas units. The canvas point under a screen position
//! `p` is `(p - window_pos) / scale - scroll`, and every zoom step adjusts
//! `scroll` so that point does not move under the pointer.

use crate::config::CanvasConfig;
use egui::{Pos2, Vec2};

/// Remaining zoom difference (times smoothness) below which smoothing snaps.
pub const ZOOM_EPSILON: f32 = 0.015;

/// Pointer and focus state sampled from the outer context after compositing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionInput {
    /// The canvas owns the pointer this frame
    pub hovered: bool,
    /// An inner widget holds the input focus
    pub any_item_active: bool,
    /// Screen pointer position
    pub mouse_pos: Pos2,
    /// Screen pointer movement since last frame
    pub mouse_delta: Vec2,
    /// Vertical wheel notches this frame
    pub mouse_wheel: f32,
    /// Screen position of the embedding window, the zoom anchor reference
    pub window_pos: Pos2,
    /// The reset key went down this frame
    pub reset_pressed: bool,
    /// The pan button is held and dragging
    pub pan_dragging: bool,
}

/// Current zoom, zoom target and scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomScroll {
    scale: f32,
    target: f32,
    scroll: Vec2,
}

impl Default for ZoomScroll {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl ZoomScroll {
    /// Start at `zoom` with no scroll.
    pub fn new(zoom: f32) -> Self {
        Self {
            scale: zoom,
            target: zoom,
            scroll: Vec2::ZERO,
        }
    }

    /// Zoom applied this frame.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Zoom being approached.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Accumulated pan in canvas units.
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    /// Overwrite the pan offset.
    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.scroll = scroll;
    }

    /// Whether the current zoom still moves towards the target.
    pub fn is_animating(&self) -> bool {
        self.scale != self.target
    }

    /// Canvas position under a screen position.
    pub fn canvas_point(&self, screen: Pos2, window_pos: Pos2) -> Pos2 {
        ((screen - window_pos) / self.scale - self.scroll).to_pos2()
    }

    /// Advance one frame.
    pub fn update(&mut self, config: &CanvasConfig, input: &InteractionInput) {
        let anchor = input.mouse_pos - input.window_pos;
        let wheel = input.mouse_wheel;

        if config.zoom_enabled && input.hovered && wheel != 0.0 && !wheel.is_nan() {
            // Inverted bounds settle on zoom_max; NaN bounds are ignored.
            self.target = (self.target + wheel / config.zoom_divisions)
                .max(config.zoom_min)
                .min(config.zoom_max);

            if config.zoom_smoothness == 0.0 {
                self.zoom_to(self.target, anchor);
            }
        }

        // A zero smoothness never reaches the division below.
        if config.zoom_smoothness > 0.0 {
            let threshold = ZOOM_EPSILON / config.zoom_smoothness;
            if (self.target - self.scale).abs() >= threshold {
                let step = (self.target - self.scale) / config.zoom_smoothness;
                self.zoom_to(self.scale + step, anchor);

                if (self.target - self.scale).abs() < threshold {
                    self.zoom_to(self.target, anchor);
                }
            }
        }

        if input.reset_pressed {
            self.target = config.default_zoom;
            if config.zoom_smoothness == 0.0 {
                self.zoom_to(self.target, anchor);
            }
        }

        if input.hovered && !input.any_item_active && input.pan_dragging {
            self.scroll += input.mouse_delta / self.scale;
        }
    }

    /// Change the zoom keeping the canvas point at `anchor` fixed.
    fn zoom_to(&mut self, scale: f32, anchor: Vec2) {
        self.scroll += anchor / scale - anchor / self.scale;
        self.scale = scale;
    }
}
