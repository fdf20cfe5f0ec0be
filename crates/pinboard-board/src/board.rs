#![forbid(unsafe_code)]

//! Board and widget-instance records as the rest of the application
//! persists them.

use pinboard_core::geometry::{LayoutItem, Point, Size};
use pinboard_layout::LayoutMode;
use serde::{Deserialize, Serialize};

/// Opaque widget content. The layout stack never inspects it.
pub type WidgetState = serde_json::Map<String, serde_json::Value>;

fn default_zoom() -> f64 {
    1.0
}

/// One 2-D canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub layout_mode: LayoutMode,
    #[serde(default)]
    pub locked: bool,
    /// Device pixels per content pixel.
    #[serde(default = "default_zoom")]
    pub zoom: f64,
}

impl Board {
    /// A new unlocked grid board at 100% zoom.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            layout_mode: LayoutMode::default(),
            locked: false,
            zoom: default_zoom(),
        }
    }

    #[must_use]
    pub fn with_layout_mode(mut self, mode: LayoutMode) -> Self {
        self.layout_mode = mode;
        self
    }

    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    #[must_use]
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Zoom factor usable as a divisor; anything non-finite or non-positive
    /// reads as 1.
    #[must_use]
    pub fn effective_zoom(&self) -> f64 {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            self.zoom
        } else {
            1.0
        }
    }
}

/// A placed occurrence of a widget definition on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInstance {
    pub id: String,
    pub board_id: String,
    pub definition_id: String,
    #[serde(default)]
    pub state: WidgetState,
    pub position: Point,
    pub size: Size,
    #[serde(default)]
    pub z_index: u32,
    #[serde(default)]
    pub locked: bool,
}

impl WidgetInstance {
    /// The geometry the layout stack sees.
    pub fn layout_item(&self) -> LayoutItem {
        LayoutItem::new(self.id.clone(), self.position, self.size).with_locked(self.locked)
    }
}

/// Convert persisted instances to layout items, preserving order.
pub fn layout_items(widgets: &[WidgetInstance]) -> Vec<LayoutItem> {
    widgets.iter().map(WidgetInstance::layout_item).collect()
}
