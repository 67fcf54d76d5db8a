//! Inset Core - nested immediate-mode canvases
//!
//! This crate embeds one immediate-mode UI context inside a child region of
//! another, already running context:
//! - Context switching with a scoped guard that always restores the host
//! - Input forwarding with pointer remapping into canvas space
//! - Splicing of the inner draw data into the host draw list
//! - Smoothed, pointer-anchored zoom and drag panning
//!
//! The host library is reached through the [`UiBackend`] trait. A GPU-less
//! implementation lives in [`headless`].

#![warn(missing_docs)]

use thiserror::Error;

pub mod backend;
pub mod canvas;
pub mod compositor;
pub mod config;
pub mod draw;
pub mod flags;
pub mod geometry;
pub mod headless;
pub mod input;
pub mod interaction;
pub mod logging;

// Host contract
pub use backend::{ChildRegion, HoverScope, UiBackend};

// Canvas session
pub use canvas::{CanvasFrame, NestedCanvas, SpliceStats};
pub use config::CanvasConfig;
pub use interaction::{InteractionInput, ZoomScroll};

// Draw data & compositing
pub use compositor::{append_draw_list, CompositeError, CompositePath};
pub use draw::{DrawCmd, DrawData, DrawIndex, DrawList, SEGMENT_VERTEX_LIMIT};
pub use geometry::CanvasTransform;

// Input
pub use flags::{BackendFlags, ConfigFlags};
pub use input::{remap_pointer_events, ImeData, InputEvent, Io};

// Logging
pub use logging::LogConfig;

/// Errors surfaced by configuration and compositing
#[derive(Error, Debug)]
pub enum InsetError {
    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Draw data could not be spliced
    #[error("Composite error: {0}")]
    Composite(#[from] CompositeError),
}

/// Result type for inset operations
pub type Result<T> = std::result::Result<T, InsetError>;
