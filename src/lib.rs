//! Scenograph is a programmatic authoring engine for time-based vector
//! animations.
//!
//! A [`Scene`] owns a tree of graphical entities: leaf curves carrying
//! time-parameterized effects, and containers aggregating them. Time
//! windows stay consistent as the graph is edited in either direction
//! (leaf edits re-aggregate ancestors, container edits re-anchor
//! descendants), and sampling the graph at a tick yields the paint
//! primitives that drive frame-by-frame export.
//!
//! Rasterization, text-to-path conversion, and video encoding are
//! collaborator boundaries: [`Rasterizer`], [`MarkupSource`], and
//! [`FrameSink`].
#![forbid(unsafe_code)]

pub mod animation;
pub mod assets;
pub mod effects;
pub mod encode;
pub mod eval;
pub mod foundation;
pub mod scene;
pub mod session;

pub use crate::foundation::core::{
    Canvas, Cardinal, Cardinals, DrawStyle, Epoch, Fps, Point, Rect, Rgba8, Tick, Vec2,
};
pub use crate::foundation::error::{ScenographError, ScenographResult};

pub use crate::animation::lerp::Lerp;
pub use crate::animation::pace::Pace;
pub use crate::effects::apply::AttachedEffect;
pub use crate::effects::spec::{DistributionOrder, EffectKind, EffectSpec, Stage, ToolMask};
pub use crate::scene::curve::{CurveEnd, Decoration, DecorationKind};
pub use crate::scene::graph::{ContainerKind, NodeId, Scene, SyncStats, TimeRef};
pub use crate::scene::shapes::Outline;

pub use crate::assets::markup::{Glyph, GlyphSheet, MarkupSource};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::png_seq::PngSequenceSink;
pub use crate::encode::sink::{FrameRgba, FrameSink, InMemorySink, SinkConfig};
pub use crate::eval::avatar::{Avatar, PaintPrim};
pub use crate::session::export::{ExportOpts, ExportSession, ExportStats, Rasterizer};
