#![forbid(unsafe_code)]

//! Core: geometry model, pointer identifiers, and numeric sanitisation.
//!
//! # Role in pinboard
//! `pinboard-core` is the plain-data layer. It owns the board-local geometry
//! types every other crate speaks ([`Point`], [`Delta`], [`Size`], [`Rect`],
//! [`LayoutItem`]) and the helpers that turn untrusted numbers coming from
//! persisted widget state into safe values.
//!
//! # How it fits in the system
//! The layout solvers (`pinboard-layout`) own a working set of
//! [`LayoutItem`]s and mutate it in response to pointer input. The board
//! integration layer (`pinboard-board`) converts persisted widget instances
//! into items and writes committed geometry back out. Nothing in this crate
//! has behavior beyond arithmetic.

pub mod geometry;
pub mod pointer;
pub mod sanitize;

#[cfg(feature = "logging")]
pub mod logging;

pub use geometry::{Delta, LayoutItem, Point, Rect, Size};
pub use pointer::PointerId;
