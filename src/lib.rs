//! movepath moves an object layer along an authored path across a range of animation frames.
//!
//! A path is a list of control points, each carrying position, opacity, size, rotation, a
//! four-corner perspective warp, a feather radius and per-attribute acceleration. Points may
//! be pinned to output frames (keyframes), splitting the path into segments.
//!
//! # Pipeline overview
//!
//! 1. **Schedule**: `PathModel + frame count -> TimingTable` (when the object reaches each point)
//! 2. **Iterate**: `TimingTable -> TweenTick` per real frame and tween sub-step, with the source
//!    layer / frame index stepping alongside
//! 3. **Resolve**: `TweenTick -> ResolvedAttributes` (pure, acceleration-aware interpolation)
//! 4. **Apply**: `ResolvedAttributes -> RasterBackend` calls (keying, selection, scale, warp,
//!    rotate, place, clip), plus tween and trace compositing
//!
//! Pixel work is delegated to a host implementing [`RasterBackend`]; the engine decides which
//! operations run, in which order, with which parameters. [`QueryEngine`] runs steps 1-3 only
//! and reports segment motion statistics without touching any image.
//!
//! Paths and settings persist as point files ([`parse_points`] / [`format_points`]) or XML
//! parameter files ([`MoveParameters`]).
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

mod animation;
mod foundation;
mod io;
mod path;
mod query;
mod render;
mod resolve;
mod schedule;
mod settings;

pub use animation::accel::{Accel, remap};
pub use foundation::core::{Canvas, FrameSpan, Point, Vec2};
pub use foundation::error::{MovePathError, MovePathResult};
pub use foundation::math::{mix, mix_point};
pub use io::pointfile::{
    HAS_ACCEL, HAS_KEYFRAME, HAS_PERSPECTIVE, format_points, indicator_of, load_points,
    parse_points, save_points,
};
pub use io::xml::{MoveParameters, XML_VERSION};
pub use path::model::{MAX_POINTS, PathModel};
pub use path::point::{AccelGroup, ControlPoint, Perspective};
pub use query::engine::{QueryEngine, QueryResult};
pub use render::applier::{
    ApplyContext, ApplyOutcome, FitOptions, FitSizes, TransformApplier, TransformOrder,
    scaled_size,
};
pub use render::backend::{
    ImageId, LayerBounds, LayerId, LayerProps, RasterBackend, SelectionSource,
};
pub use render::compositor::{FrameLayers, TweenTraceCompositor, tween_opacity};
pub use render::pipeline::{
    MovementState, RenderPass, RenderProgress, RenderReport, SingleFrameRequest, SourceBinding,
    render_single_frame,
};
pub use render::source_cache::SourceFrameCache;
pub use resolve::resolver::{MovementLineSelection, ParameterResolver, ResolvedAttributes};
pub use schedule::stepper::{SourceStepper, StepMode};
pub use schedule::timing::{Segment, SegmentScheduler, TimingTable, ValidationReport};
pub use schedule::tween::{FrameTicks, FrameTweenIterator, TweenTick};
pub use settings::values::{
    BlueBoxMode, BlueBoxSettings, MoveSettings, PaintMode, SelectionMode, SourceHandle,
};
