//! Input events and per-context IO state.

use crate::flags::{BackendFlags, ConfigFlags};
use crate::geometry::CanvasTransform;
use egui::{Key, Modifiers, PointerButton, Pos2, Vec2};

/// A single input event as queued by a platform backend.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Absolute pointer position
    MousePos(Pos2),
    /// Pointer button press or release
    MouseButton {
        /// Button that changed
        button: PointerButton,
        /// `true` on press
        down: bool,
    },
    /// Wheel movement in notches
    MouseWheel(Vec2),
    /// Key press or release
    Key {
        /// Key that changed
        key: Key,
        /// `true` on press
        down: bool,
        /// Modifiers held at the time
        modifiers: Modifiers,
    },
    /// Committed text
    Text(String),
    /// Host window focus change
    Focus(bool),
}

impl InputEvent {
    /// Screen position carried by the event, if any.
    pub fn pointer_pos(&self) -> Option<Pos2> {
        match self {
            Self::MousePos(pos) => Some(*pos),
            _ => None,
        }
    }
}

/// Map absolute pointer positions into the canvas' local space.
///
/// Only [`InputEvent::MousePos`] carries a screen position; every other event
/// passes through unchanged.
pub fn remap_pointer_events(events: &mut [InputEvent], transform: CanvasTransform) {
    for event in events.iter_mut() {
        if let InputEvent::MousePos(pos) = event {
            *pos = transform.to_local(*pos);
        }
    }
}

/// Text-input (IME) placement requested by the focused widget.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImeData {
    /// Whether a composition window should be shown
    pub visible: bool,
    /// Caret position
    pub input_pos: Pos2,
    /// Height of the text line at the caret
    pub line_height: f32,
}

impl ImeData {
    /// Move a canvas-local request into screen space.
    pub fn to_screen(self, transform: CanvasTransform) -> Self {
        Self {
            visible: self.visible,
            input_pos: transform.apply(self.input_pos),
            line_height: self.line_height * transform.scale,
        }
    }
}

/// Resolved per-frame IO of one context.
#[derive(Debug, Clone, PartialEq)]
pub struct Io {
    /// Size of the context's virtual display
    pub display_size: Vec2,
    /// Seconds since the previous frame
    pub delta_time: f32,
    /// Pointer position
    pub mouse_pos: Pos2,
    /// Pointer movement since the previous frame
    pub mouse_delta: Vec2,
    /// Vertical wheel movement this frame
    pub mouse_wheel: f32,
    /// Horizontal wheel movement this frame
    pub mouse_wheel_h: f32,
    /// Renderer/platform capabilities
    pub backend_flags: BackendFlags,
    /// Application feature toggles
    pub config_flags: ConfigFlags,
    /// Spread rapid press/release pairs over several frames
    pub trickle_input: bool,
    /// Latest IME placement request
    pub ime: ImeData,
}

impl Default for Io {
    fn default() -> Self {
        Self {
            display_size: Vec2::ZERO,
            delta_time: 1.0 / 60.0,
            mouse_pos: Pos2::ZERO,
            mouse_delta: Vec2::ZERO,
            mouse_wheel: 0.0,
            mouse_wheel_h: 0.0,
            backend_flags: BackendFlags::empty(),
            config_flags: ConfigFlags::empty(),
            trickle_input: true,
            ime: ImeData::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{pos2, vec2};

    #[test]
    fn test_only_positions_are_remapped() {
        let mut events = vec![
            InputEvent::MousePos(pos2(110.0, 60.0)),
            InputEvent::MouseButton {
                button: PointerButton::Primary,
                down: true,
            },
            InputEvent::MouseWheel(vec2(0.0, 1.0)),
            InputEvent::MousePos(pos2(10.0, 10.0)),
        ];
        remap_pointer_events(&mut events, CanvasTransform::new(pos2(10.0, 10.0), 2.0));

        assert_eq!(events[0], InputEvent::MousePos(pos2(50.0, 25.0)));
        assert_eq!(events[2], InputEvent::MouseWheel(vec2(0.0, 1.0)));
        assert_eq!(events[3].pointer_pos(), Some(Pos2::ZERO));
        assert_eq!(events[1].pointer_pos(), None);
    }

    #[test]
    fn test_ime_maps_to_screen() {
        let ime = ImeData {
            visible: true,
            input_pos: pos2(4.0, 8.0),
            line_height: 14.0,
        };
        let screen = ime.to_screen(CanvasTransform::new(pos2(100.0, 0.0), 0.5));
        assert_eq!(screen.input_pos, pos2(102.0, 4.0));
        assert_eq!(screen.line_height, 7.0);
        assert!(screen.visible);
    }
}
