#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placement discipline selected per board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Positions snap to a fixed step.
    #[default]
    Grid,
    /// Positions follow the pointer, floored to whole pixels.
    Free,
}

impl LayoutMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Grid => Self::Free,
            Self::Free => Self::Grid,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Free => "free",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
