#![forbid(unsafe_code)]

//! Persistence collaborator for committed geometry.
//!
//! The layout stack writes through [`PositionStore`] and never reads back:
//! local engine state is authoritative for rendering, the store only has to
//! converge. Upserts are idempotent, so replaying the same update is
//! harmless.

use std::fmt;

use pinboard_core::geometry::{LayoutItem, Point, Size};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Latest geometry for one widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryUpdate {
    pub widget_id: String,
    pub position: Point,
    pub size: Size,
}

impl GeometryUpdate {
    pub fn from_item(item: &LayoutItem) -> Self {
        Self {
            widget_id: item.id.clone(),
            position: item.position,
            size: item.size,
        }
    }
}

/// Errors reported by a [`PositionStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The widget has no stored record.
    UnknownWidget(String),
    /// The backing store cannot be reached.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownWidget(id) => write!(f, "unknown widget: {id}"),
            Self::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Idempotent sink for widget geometry.
pub trait PositionStore {
    /// Insert or overwrite the geometry of `update.widget_id`.
    fn upsert_geometry(&mut self, update: &GeometryUpdate) -> Result<(), StoreError>;

    /// Drop the record of a deleted widget.
    fn remove_widget(&mut self, widget_id: &str) -> Result<(), StoreError>;
}

/// In-process store keeping the latest geometry per widget.
///
/// Can be switched offline to exercise the failure path.
#[derive(Debug, Default)]
pub struct MemoryPositionStore {
    records: FxHashMap<String, GeometryUpdate>,
    writes: usize,
    offline: bool,
}

impl MemoryPositionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest geometry stored for `widget_id`.
    pub fn get(&self, widget_id: &str) -> Option<&GeometryUpdate> {
        self.records.get(widget_id)
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Successful upserts since creation.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline {
            Err(StoreError::Unavailable("memory store offline".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl PositionStore for MemoryPositionStore {
    fn upsert_geometry(&mut self, update: &GeometryUpdate) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.records.insert(update.widget_id.clone(), update.clone());
        self.writes += 1;
        Ok(())
    }

    fn remove_widget(&mut self, widget_id: &str) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.records
            .remove(widget_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::UnknownWidget(widget_id.to_owned()))
    }
}
