#![forbid(unsafe_code)]

//! Board integration for pinboard.
//!
//! Holds the persisted board and widget records, the persistence
//! collaborator contract, and [`BoardSession`], which drives the layout
//! engine and drag controller for the active board and writes committed
//! geometry back through a [`PositionStore`].

pub mod board;
pub mod session;
pub mod store;

pub use board::{Board, WidgetInstance, WidgetState, layout_items};
pub use pinboard_layout::LayoutMode;
pub use session::BoardSession;
pub use store::{GeometryUpdate, MemoryPositionStore, PositionStore, StoreError};
