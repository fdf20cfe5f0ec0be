#![forbid(unsafe_code)]

//! Pointer identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hardware pointer identifier as reported by the host input layer.
///
/// Mouse input typically reports a single fixed id; touch and pen input
/// report one id per contact. The drag controller binds exactly one id to
/// an active drag and ignores every other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointerId(u32);

impl PointerId {
    /// Conventional id for a mouse.
    pub const MOUSE: Self = Self(1);

    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pointer#{}", self.0)
    }
}
