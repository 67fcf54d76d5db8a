//! Inset Demo - drives a nested canvas on the headless host
//!
//! Lays out a grid of nodes inside a zoomable canvas, feeds it a scripted
//! pointer session (hover, wheel zoom, middle-button pan, reset) and logs how
//! much geometry each frame splices into the host.

mod logging_setup;

use anyhow::{Context, Result};
use clap::Parser;
use egui::{pos2, vec2, Color32, Key, Modifiers, PointerButton, Pos2, Rect, Vec2};
use inset_core::headless::HeadlessBackend;
use inset_core::{
    BackendFlags, CanvasConfig, DrawIndex, InputEvent, LogConfig, NestedCanvas, UiBackend,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

const NODE_SIZE: Vec2 = Vec2::new(100.0, 60.0);
const NODE_SPACING: Vec2 = Vec2::new(140.0, 90.0);
const HEADER_HEIGHT: f32 = 14.0;

#[derive(Parser, Debug)]
#[command(name = "inset-demo", about = "Headless nested canvas stress driver")]
struct Cli {
    /// Frames to run
    #[arg(long, default_value_t = 240)]
    frames: u32,

    /// Nodes drawn inside the canvas
    #[arg(long, default_value_t = 500)]
    nodes: usize,

    /// Pretend the renderer lacks vertex-offset support
    #[arg(long)]
    legacy: bool,

    /// Use 32-bit indices
    #[arg(long)]
    wide_indices: bool,

    /// Canvas configuration (TOML)
    #[arg(long, env = "INSET_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "INSET_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Also write logs to ./logs
    #[arg(long)]
    log_file: bool,
}

#[derive(Debug, Default)]
struct RunTotals {
    vertices: usize,
    indices: usize,
    commands: usize,
    skipped: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: cli.log_level.clone(),
        file_output: cli.log_file,
        ..Default::default()
    };
    let _log_guard = logging_setup::init(&log_config)?;

    let config = match &cli.config {
        Some(path) => CanvasConfig::load(path)
            .with_context(|| format!("Failed to load canvas config {}", path.display()))?,
        None => CanvasConfig::default(),
    };

    let mut flags = BackendFlags::HAS_MOUSE_CURSORS;
    if !cli.legacy {
        flags |= BackendFlags::RENDERER_HAS_VTX_OFFSET;
    }

    info!(
        frames = cli.frames,
        nodes = cli.nodes,
        legacy = cli.legacy,
        wide_indices = cli.wide_indices,
        "starting nested canvas run"
    );

    if cli.wide_indices {
        run::<u32>(&cli, config, flags)
    } else {
        run::<u16>(&cli, config, flags)
    }
}

fn run<I: DrawIndex>(cli: &Cli, config: CanvasConfig, flags: BackendFlags) -> Result<()> {
    let mut host = HeadlessBackend::<I>::new(vec2(1280.0, 720.0), flags);
    let root = host.root_context();
    let mut canvas = NestedCanvas::new(config);
    let mut totals = RunTotals::default();
    let started = Instant::now();

    for frame in 0..cli.frames {
        for event in scripted_input(frame) {
            host.queue_event(root, event);
        }

        host.new_frame();
        host.add_rect_filled(
            Rect::from_min_size(Pos2::ZERO, vec2(1280.0, 24.0)),
            Color32::from_gray(40),
        );
        canvas.show(&mut host, |frame| {
            let scroll = frame.canvas().scroll();
            draw_nodes(frame.ui(), cli.nodes, scroll);
        });
        let data = host.render();

        let stats = canvas.last_splice();
        totals.vertices += stats.vertices;
        totals.indices += stats.indices;
        totals.commands += stats.commands;
        totals.skipped += stats.skipped;

        debug!(
            frame,
            scale = canvas.scale(),
            hovered = canvas.hovered(),
            spliced_vertices = stats.vertices,
            host_vertices = data.total_vtx_count(),
            host_commands = data.total_cmd_count(),
            "frame composited"
        );
    }

    let elapsed = started.elapsed();
    info!(
        frames = cli.frames,
        vertices = totals.vertices,
        indices = totals.indices,
        commands = totals.commands,
        skipped = totals.skipped,
        final_scale = canvas.scale(),
        scroll = ?canvas.scroll(),
        elapsed_ms = elapsed.as_millis() as u64,
        "run finished"
    );

    canvas.destroy(&mut host);
    Ok(())
}

/// Node grid in canvas units, shifted by the pan offset.
fn draw_nodes<B>(ui: &mut B, count: usize, scroll: Vec2)
where
    B: UiBackend,
{
    let columns = (count as f32).sqrt().ceil().max(1.0) as usize;
    let list = ui.window_draw_list();

    for n in 0..count {
        let cell = vec2((n % columns) as f32, (n / columns) as f32);
        let min = pos2(cell.x * NODE_SPACING.x, cell.y * NODE_SPACING.y) + scroll;
        let body = Rect::from_min_size(min, NODE_SIZE);
        let header = Rect::from_min_size(min, vec2(NODE_SIZE.x, HEADER_HEIGHT));

        list.add_rect_filled(body, Color32::from_gray(60));
        list.add_rect_filled(header, Color32::from_rgb(70, 110, 160));

        let pin = pos2(body.right(), body.center().y);
        list.add_triangle_filled(
            pin + vec2(-6.0, -5.0),
            pin + vec2(-6.0, 5.0),
            pin + vec2(2.0, 0.0),
            Color32::from_rgb(220, 180, 60),
        );
    }
}

/// Pointer session replayed every 120 frames.
fn scripted_input(frame: u32) -> Vec<InputEvent> {
    let pointer = pos2(640.0, 360.0);
    match frame % 120 {
        0 => vec![InputEvent::MousePos(pointer)],
        f @ 10..=40 if f % 6 == 0 => vec![InputEvent::MouseWheel(vec2(0.0, 1.0))],
        50 => vec![InputEvent::MouseButton {
            button: PointerButton::Middle,
            down: true,
        }],
        f @ 51..=80 => {
            let step = (f - 50) as f32;
            vec![InputEvent::MousePos(pointer + vec2(step * 4.0, step * 2.0))]
        }
        81 => vec![InputEvent::MouseButton {
            button: PointerButton::Middle,
            down: false,
        }],
        100 => vec![InputEvent::Key {
            key: Key::R,
            down: true,
            modifiers: Modifiers::NONE,
        }],
        101 => vec![InputEvent::Key {
            key: Key::R,
            down: false,
            modifiers: Modifiers::NONE,
        }],
        _ => Vec::new(),
    }
}
