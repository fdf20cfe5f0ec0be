#![forbid(unsafe_code)]

//! Layout engine, drag controller, and auto-align for the pinboard board.
//!
//! - [`engine`]: the per-board working set with mode-specific placement.
//! - [`drag`]: the exclusive pointer-drag state machine driving the engine.
//! - [`align`]: one-shot column tidy-up of a board snapshot.
//! - [`config`]: tunables for all of the above.

pub mod align;
pub mod config;
pub mod drag;
pub mod engine;
pub mod mode;

pub use pinboard_core::geometry::{Delta, LayoutItem, Point, Rect, Size};
pub use pinboard_core::pointer::PointerId;

pub use align::{AlignConfig, AlignPlan, AlignedItem, MeasureHeight, NoMeasurement, auto_align};
pub use config::{GeometryConfig, GridConfig, LayoutConfig, LayoutConfigError, SpawnConfig};
pub use drag::{
    CancelReason, DragController, DragEffect, DragNoopReason, DragSession, DragState,
    DragTransition,
};
pub use engine::{
    DynLayoutEngine, FreeLayoutEngine, FreePlacement, GridLayoutEngine, GridPlacement,
    LayoutEngine, PlacementPolicy, create_layout_engine,
};
pub use mode::LayoutMode;
