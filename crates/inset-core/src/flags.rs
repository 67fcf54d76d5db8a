//! Backend capability and configuration flags.
//!
//! The inner context has no platform backend of its own, so it reports
//! whatever the outer backend reports. These flags decide which compositing
//! path runs at the end of a frame.

use bitflags::bitflags;

bitflags! {
    /// Capabilities declared by the platform and renderer backends.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BackendFlags: u32 {
        /// Platform backend can display mouse cursors.
        const HAS_MOUSE_CURSORS = 1 << 1;
        /// Platform backend can warp the OS mouse position.
        const HAS_SET_MOUSE_POS = 1 << 2;
        /// Renderer honors `DrawCmd::vtx_offset`, allowing large meshes with 16-bit indices.
        const RENDERER_HAS_VTX_OFFSET = 1 << 3;
        /// Renderer supports dynamically created texture handles.
        const RENDERER_HAS_TEXTURES = 1 << 4;
        /// Platform backend can create additional OS windows.
        const PLATFORM_HAS_VIEWPORTS = 1 << 10;
    }
}

bitflags! {
    /// Application-level configuration of a context.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ConfigFlags: u32 {
        /// Keyboard navigation.
        const NAV_ENABLE_KEYBOARD = 1 << 0;
        /// Gamepad navigation.
        const NAV_ENABLE_GAMEPAD = 1 << 1;
        /// Ignore mouse position and buttons.
        const NO_MOUSE = 1 << 4;
        /// Window docking.
        const DOCKING_ENABLE = 1 << 7;
        /// Multi-viewport (windows outside the main OS window).
        const VIEWPORTS_ENABLE = 1 << 10;
    }
}

impl ConfigFlags {
    /// Features that need an OS window of their own.
    pub const WINDOWING: Self = Self::DOCKING_ENABLE.union(Self::VIEWPORTS_ENABLE);

    /// The flags an embedded context may keep.
    pub fn without_windowing(self) -> Self {
        self.difference(Self::WINDOWING)
    }
}

impl BackendFlags {
    /// Whether the renderer can interpret per-command vertex offsets.
    pub fn has_vtx_offset(self) -> bool {
        self.contains(Self::RENDERER_HAS_VTX_OFFSET)
    }
}
