#![forbid(unsafe_code)]

//! Authoritative in-memory geometry for one board.
//!
//! [`LayoutEngine`] owns the working set of [`LayoutItem`]s for the active
//! board session and exposes move, resize, hit-test, and serialize. The only
//! thing that differs between the board's two layout modes is how a moved
//! item's candidate position is transformed; that is the
//! [`PlacementPolicy`] hook. Everything else (lock vetoes, clamping, size
//! floors, deterministic serialization) is implemented once here.
//!
//! # Invariants
//!
//! 1. Every stored size is `>= min_size` on both axes.
//! 2. Every stored position is finite and in the non-negative quadrant.
//! 3. A locked item, or any item while the board is locked, never changes
//!    position or size through [`move_item`](LayoutEngine::move_item) or
//!    [`resize`](LayoutEngine::resize).
//! 4. [`serialize`](LayoutEngine::serialize) output depends only on the
//!    stored set, never on load order.
//!
//! # Failure Modes
//!
//! There are none that surface as errors. Unknown ids and lock vetoes
//! return `None` with no side effect; non-finite numbers are replaced by
//! floors or zero.

use std::fmt;

use pinboard_core::geometry::{Delta, LayoutItem, Point, Size};
use pinboard_core::sanitize;
use rustc_hash::FxHashMap;

use crate::align::{AlignConfig, AlignPlan, MeasureHeight, auto_align};
use crate::config::LayoutConfig;
use crate::mode::LayoutMode;

/// Snap step used when a grid policy is constructed with an unusable step.
pub const DEFAULT_GRID_STEP: f64 = 8.0;

/// Minimum width/height of any stored item unless configured otherwise.
pub const DEFAULT_MIN_SIZE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Placement policies
// ---------------------------------------------------------------------------

/// Position transform applied to every move.
///
/// Implementations only map `current + delta` to a candidate position. The
/// engine clamps the result into the non-negative quadrant afterwards.
pub trait PlacementPolicy: fmt::Debug {
    /// The board layout mode this policy implements.
    fn mode(&self) -> LayoutMode;

    /// Candidate position for an item at `current` displaced by `delta`.
    fn place(&self, current: Point, delta: Delta) -> Point;
}

impl<P: PlacementPolicy + ?Sized> PlacementPolicy for Box<P> {
    fn mode(&self) -> LayoutMode {
        (**self).mode()
    }

    fn place(&self, current: Point, delta: Delta) -> Point {
        (**self).place(current, delta)
    }
}

/// Unconstrained placement: follows the pointer, floored to whole pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreePlacement;

impl PlacementPolicy for FreePlacement {
    fn mode(&self) -> LayoutMode {
        LayoutMode::Free
    }

    fn place(&self, current: Point, delta: Delta) -> Point {
        let next = current + delta;
        Point::new(next.x.floor(), next.y.floor())
    }
}

/// Grid-snapped placement: rounds each axis to the nearest multiple of `step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPlacement {
    step: f64,
}

impl GridPlacement {
    /// Create a grid policy. A non-finite or non-positive step falls back to
    /// [`DEFAULT_GRID_STEP`].
    #[must_use]
    pub fn new(step: f64) -> Self {
        let step = if step.is_finite() && step > 0.0 {
            step
        } else {
            tracing::debug!(
                target: "pinboard.engine",
                step,
                fallback = DEFAULT_GRID_STEP,
                "unusable grid step replaced"
            );
            DEFAULT_GRID_STEP
        };
        Self { step }
    }

    /// Configured snap step.
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    #[inline]
    fn snap(&self, value: f64) -> f64 {
        (value / self.step).round() * self.step
    }
}

impl Default for GridPlacement {
    fn default() -> Self {
        Self {
            step: DEFAULT_GRID_STEP,
        }
    }
}

impl PlacementPolicy for GridPlacement {
    fn mode(&self) -> LayoutMode {
        LayoutMode::Grid
    }

    fn place(&self, current: Point, delta: Delta) -> Point {
        let next = current + delta;
        Point::new(self.snap(next.x), self.snap(next.y))
    }
}

// ---------------------------------------------------------------------------
// LayoutEngine
// ---------------------------------------------------------------------------

/// Engine using [`FreePlacement`].
pub type FreeLayoutEngine = LayoutEngine<FreePlacement>;

/// Engine using [`GridPlacement`].
pub type GridLayoutEngine = LayoutEngine<GridPlacement>;

/// Engine whose policy is chosen at runtime from the board's layout mode.
pub type DynLayoutEngine = LayoutEngine<Box<dyn PlacementPolicy>>;

/// Build the engine for a board's layout mode.
#[must_use]
pub fn create_layout_engine(mode: LayoutMode, config: &LayoutConfig) -> DynLayoutEngine {
    let policy: Box<dyn PlacementPolicy> = match mode {
        LayoutMode::Grid => Box::new(GridPlacement::new(config.grid.step)),
        LayoutMode::Free => Box::new(FreePlacement),
    };
    LayoutEngine::with_min_size(policy, config.geometry.min_size)
}

/// Owns the positioned items of one board session.
#[derive(Debug, Clone)]
pub struct LayoutEngine<P> {
    policy: P,
    items: FxHashMap<String, LayoutItem>,
    min_size: f64,
    board_locked: bool,
}

impl<P: Default> Default for LayoutEngine<P> {
    fn default() -> Self {
        Self::new(P::default())
    }
}

impl<P> LayoutEngine<P> {
    /// Create an empty engine with the default size floor.
    #[must_use]
    pub fn new(policy: P) -> Self {
        Self::with_min_size(policy, DEFAULT_MIN_SIZE)
    }

    /// Create an empty engine with an explicit size floor. A non-finite or
    /// non-positive floor falls back to [`DEFAULT_MIN_SIZE`].
    #[must_use]
    pub fn with_min_size(policy: P, min_size: f64) -> Self {
        let min_size = if min_size.is_finite() && min_size > 0.0 {
            min_size
        } else {
            DEFAULT_MIN_SIZE
        };
        Self {
            policy,
            items: FxHashMap::default(),
            min_size,
            board_locked: false,
        }
    }

    /// The placement policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Configured size floor.
    #[must_use]
    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    /// Number of loaded items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up one item.
    pub fn get(&self, id: &str) -> Option<&LayoutItem> {
        self.items.get(id)
    }

    /// Whether the board-wide lock is set.
    #[must_use]
    pub fn is_board_locked(&self) -> bool {
        self.board_locked
    }

    /// Set the board-wide lock. While set, every item behaves as locked.
    pub fn set_board_locked(&mut self, locked: bool) {
        self.board_locked = locked;
    }

    /// Replace the entire working set.
    ///
    /// Positions are clamped into the non-negative quadrant and sizes are
    /// floored; when an id repeats, the last occurrence wins.
    pub fn load(&mut self, items: impl IntoIterator<Item = LayoutItem>) {
        let items = items.into_iter();
        let mut next = FxHashMap::with_capacity_and_hasher(items.size_hint().0, Default::default());
        let mut duplicates = 0usize;
        for item in items {
            let item = self.sanitized(item);
            if next.insert(item.id.clone(), item).is_some() {
                duplicates += 1;
            }
        }
        self.items = next;
        tracing::debug!(
            target: "pinboard.engine",
            items = self.items.len(),
            duplicates,
            "layout loaded"
        );
    }

    /// Add or replace one item without reloading the rest.
    pub fn insert(&mut self, item: LayoutItem) -> LayoutItem {
        let item = self.sanitized(item);
        self.items.insert(item.id.clone(), item.clone());
        item
    }

    /// Drop one item, e.g. after the widget was deleted elsewhere.
    pub fn remove(&mut self, id: &str) -> Option<LayoutItem> {
        self.items.remove(id)
    }

    /// Set or clear the per-item lock. Works on locked items.
    pub fn set_locked(&mut self, id: &str, locked: bool) -> Option<LayoutItem> {
        let item = self.items.get_mut(id)?;
        item.locked = locked;
        Some(item.clone())
    }

    /// Change an item's size, floored to the configured minimum.
    ///
    /// Returns `None` without side effects if the id is unknown or the item
    /// (or the board) is locked.
    pub fn resize(&mut self, id: &str, size: Size) -> Option<LayoutItem> {
        let min_size = self.min_size;
        let item = self.movable_mut(id, "resize")?;
        item.size = sanitize::size(size, min_size);
        Some(item.clone())
    }

    /// First item whose bounding box contains `point`, edges inclusive.
    ///
    /// When several items overlap the point, the one with the smallest id is
    /// returned so the answer does not depend on hash iteration order.
    pub fn hit_test(&self, point: Point) -> Option<&LayoutItem> {
        self.items
            .values()
            .filter(|item| item.bounds().contains(point))
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    /// All items sorted by id ascending.
    #[must_use]
    pub fn serialize(&self) -> Vec<LayoutItem> {
        let mut out: Vec<LayoutItem> = self.items.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Write an auto-align result back into the working set.
    ///
    /// Placements for unknown or locked items are skipped.
    fn apply_alignment(&mut self, plan: &AlignPlan) {
        let min_size = self.min_size;
        for placement in &plan.placements {
            let Some(item) = self.movable_mut(&placement.id, "align") else {
                continue;
            };
            item.position = sanitize::position(placement.position);
            item.size = sanitize::size(placement.size, min_size);
        }
    }

    /// Compute an auto-align plan from the loaded snapshot and apply it.
    ///
    /// While the board is locked nothing moves and the plan is empty.
    pub fn auto_align<M>(&mut self, measure: &M, config: &AlignConfig) -> AlignPlan
    where
        M: MeasureHeight + ?Sized,
    {
        if self.board_locked {
            tracing::trace!(target: "pinboard.engine", "auto-align skipped: board locked");
            return AlignPlan::default();
        }
        let snapshot = self.serialize();
        let plan = auto_align(&snapshot, measure, config);
        self.apply_alignment(&plan);
        plan
    }

    fn sanitized(&self, mut item: LayoutItem) -> LayoutItem {
        item.position = sanitize::position(item.position);
        item.size = sanitize::size(item.size, self.min_size);
        item
    }

    fn movable_mut(&mut self, id: &str, op: &'static str) -> Option<&mut LayoutItem> {
        let board_locked = self.board_locked;
        let Some(item) = self.items.get_mut(id) else {
            tracing::trace!(target: "pinboard.engine", op, id, "ignored: unknown item");
            return None;
        };
        if board_locked || item.locked {
            tracing::trace!(
                target: "pinboard.engine",
                op,
                id,
                board_locked,
                "ignored: locked"
            );
            return None;
        }
        Some(item)
    }
}

impl<P: PlacementPolicy> LayoutEngine<P> {
    /// The layout mode of the active policy.
    #[must_use]
    pub fn mode(&self) -> LayoutMode {
        self.policy.mode()
    }

    /// Displace one item by `delta`.
    ///
    /// The policy transforms `position + delta`, the result is clamped to the
    /// non-negative quadrant, stored, and returned by value. Returns `None`
    /// without side effects if the id is unknown or the item (or the board)
    /// is locked.
    pub fn move_item(&mut self, id: &str, delta: Delta) -> Option<LayoutItem> {
        let candidate = {
            let item = self.movable_mut(id, "move")?;
            item.position
        };
        let next = sanitize::position(self.policy.place(candidate, delta));
        let item = self.items.get_mut(id)?;
        item.position = next;
        Some(item.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, x: f64, y: f64, w: f64, h: f64) -> LayoutItem {
        LayoutItem::new(id, Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn grid_move_snaps_to_step() {
        let mut engine = GridLayoutEngine::new(GridPlacement::new(10.0));
        engine.load([item("a", 0.0, 0.0, 10.0, 10.0)]);

        let moved = engine.move_item("a", Delta::new(8.0, 17.0)).expect("moved");
        assert_eq!(moved.position, Point::new(10.0, 20.0));
        assert_eq!(engine.get("a").map(|i| i.position), Some(Point::new(10.0, 20.0)));
    }

    #[test]
    fn grid_default_step_is_eight() {
        let mut engine = GridLayoutEngine::default();
        engine.load([item("a", 0.0, 0.0, 10.0, 10.0)]);
        let moved = engine.move_item("a", Delta::new(5.0, 3.0)).expect("moved");
        assert_eq!(moved.position, Point::new(8.0, 0.0));
        assert_eq!(engine.mode(), LayoutMode::Grid);
    }

    #[test]
    fn grid_rejects_unusable_step() {
        assert_eq!(GridPlacement::new(0.0).step(), DEFAULT_GRID_STEP);
        assert_eq!(GridPlacement::new(f64::NAN).step(), DEFAULT_GRID_STEP);
        assert_eq!(GridPlacement::new(-3.0).step(), DEFAULT_GRID_STEP);
    }

    #[test]
    fn free_move_and_hit_test() {
        let mut engine = FreeLayoutEngine::default();
        engine.load([item("a", 10.0, 10.0, 100.0, 100.0)]);

        let moved = engine.move_item("a", Delta::new(5.0, 7.0)).expect("moved");
        assert_eq!(moved.position, Point::new(15.0, 17.0));

        let hit = engine.hit_test(Point::new(20.0, 20.0)).expect("hit");
        assert_eq!(hit.id, "a");
        assert_eq!(engine.mode(), LayoutMode::Free);
    }

    #[test]
    fn free_move_floors_fractional_results() {
        let mut engine = FreeLayoutEngine::default();
        engine.load([item("a", 10.0, 10.0, 20.0, 20.0)]);
        let moved = engine.move_item("a", Delta::new(0.7, -0.2)).expect("moved");
        assert_eq!(moved.position, Point::new(10.0, 9.0));
    }

    #[test]
    fn moves_clamp_to_non_negative_quadrant() {
        let mut free = FreeLayoutEngine::default();
        free.load([item("a", 5.0, 5.0, 20.0, 20.0)]);
        let moved = free.move_item("a", Delta::new(-50.0, -1.0)).expect("moved");
        assert_eq!(moved.position, Point::new(0.0, 4.0));

        let mut grid = GridLayoutEngine::default();
        grid.load([item("a", 0.0, 0.0, 20.0, 20.0)]);
        let moved = grid.move_item("a", Delta::new(-3.0, -100.0)).expect("moved");
        assert_eq!(moved.position, Point::new(0.0, 0.0));
        assert!(moved.position.x.is_sign_positive());
    }

    #[test]
    fn unknown_id_is_a_silent_noop() {
        let mut engine = FreeLayoutEngine::default();
        engine.load([item("a", 1.0, 1.0, 10.0, 10.0)]);
        let before = engine.serialize();

        assert!(engine.move_item("missing", Delta::new(1.0, 1.0)).is_none());
        assert!(engine.resize("missing", Size::new(5.0, 5.0)).is_none());
        assert_eq!(engine.serialize(), before);
    }

    #[test]
    fn locked_item_is_immutable() {
        let mut engine = FreeLayoutEngine::default();
        engine.load([item("a", 1.0, 1.0, 10.0, 10.0).with_locked(true)]);
        let before = engine.serialize();

        assert!(engine.move_item("a", Delta::new(4.0, 4.0)).is_none());
        assert!(engine.resize("a", Size::new(50.0, 50.0)).is_none());
        assert_eq!(engine.serialize(), before);

        // Still participates in hit testing.
        assert_eq!(engine.hit_test(Point::new(2.0, 2.0)).map(|i| i.id.as_str()), Some("a"));
    }

    #[test]
    fn board_lock_vetoes_every_item() {
        let mut engine = GridLayoutEngine::default();
        engine.load([item("a", 0.0, 0.0, 10.0, 10.0)]);
        engine.set_board_locked(true);
        assert!(engine.move_item("a", Delta::new(16.0, 16.0)).is_none());
        assert!(engine.resize("a", Size::new(40.0, 40.0)).is_none());

        engine.set_board_locked(false);
        assert!(engine.move_item("a", Delta::new(16.0, 16.0)).is_some());
    }

    #[test]
    fn set_locked_toggles_item_lock_mid_session() {
        let mut engine = FreeLayoutEngine::default();
        engine.load([item("a", 0.0, 0.0, 10.0, 10.0)]);
        assert!(engine.set_locked("a", true).is_some_and(|i| i.locked));
        assert!(engine.move_item("a", Delta::new(1.0, 1.0)).is_none());
        assert!(engine.set_locked("a", false).is_some());
        assert!(engine.move_item("a", Delta::new(1.0, 1.0)).is_some());
        assert!(engine.set_locked("missing", true).is_none());
    }

    #[test]
    fn resize_floors_to_min_size() {
        let mut engine = FreeLayoutEngine::default();
        engine.load([item("a", 0.0, 0.0, 10.0, 10.0)]);
        let resized = engine.resize("a", Size::new(0.0, -4.0)).expect("resized");
        assert_eq!(resized.size, Size::new(1.0, 1.0));

        let resized = engine.resize("a", Size::new(f64::NAN, 30.0)).expect("resized");
        assert_eq!(resized.size, Size::new(1.0, 30.0));
    }

    #[test]
    fn load_sanitizes_corrupted_geometry() {
        let mut engine = LayoutEngine::with_min_size(FreePlacement, 4.0);
        engine.load([item("a", f64::NAN, -20.0, f64::INFINITY, 2.0)]);
        let a = engine.get("a").expect("loaded");
        assert_eq!(a.position, Point::new(0.0, 0.0));
        assert_eq!(a.size, Size::new(4.0, 4.0));
    }

    #[test]
    fn load_replaces_working_set_and_last_duplicate_wins() {
        let mut engine = FreeLayoutEngine::default();
        engine.load([item("old", 0.0, 0.0, 1.0, 1.0)]);
        engine.load([
            item("a", 0.0, 0.0, 1.0, 1.0),
            item("a", 9.0, 9.0, 1.0, 1.0),
        ]);
        assert_eq!(engine.len(), 1);
        assert!(engine.get("old").is_none());
        assert_eq!(engine.get("a").map(|i| i.position), Some(Point::new(9.0, 9.0)));
    }

    #[test]
    fn serialize_is_sorted_and_order_independent() {
        let mut a = GridLayoutEngine::default();
        a.load([item("b", 0.0, 0.0, 1.0, 1.0), item("a", 0.0, 0.0, 1.0, 1.0)]);
        let ids: Vec<_> = a.serialize().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["a", "b"]);

        let mut b = GridLayoutEngine::default();
        b.load([item("a", 0.0, 0.0, 1.0, 1.0), item("b", 0.0, 0.0, 1.0, 1.0)]);
        assert_eq!(a.serialize(), b.serialize());
        assert_eq!(a.serialize(), a.serialize());
    }

    #[test]
    fn hit_test_misses_and_overlaps() {
        let mut engine = FreeLayoutEngine::default();
        engine.load([
            item("b", 0.0, 0.0, 50.0, 50.0),
            item("a", 25.0, 25.0, 50.0, 50.0),
        ]);
        assert!(engine.hit_test(Point::new(200.0, 200.0)).is_none());
        assert_eq!(engine.hit_test(Point::new(30.0, 30.0)).map(|i| i.id.as_str()), Some("a"));
        assert_eq!(engine.hit_test(Point::new(50.0, 0.0)).map(|i| i.id.as_str()), Some("b"));
    }

    #[test]
    fn insert_and_remove_single_items() {
        let mut engine = FreeLayoutEngine::default();
        let stored = engine.insert(item("a", -5.0, 3.0, 0.0, 10.0));
        assert_eq!(stored.position, Point::new(0.0, 3.0));
        assert_eq!(stored.size, Size::new(1.0, 10.0));
        assert_eq!(engine.len(), 1);
        assert!(engine.remove("a").is_some());
        assert!(engine.is_empty());
        assert!(engine.remove("a").is_none());
    }

    #[test]
    fn create_layout_engine_follows_mode_and_config() {
        let mut config = LayoutConfig::default();
        config.grid.step = 10.0;
        let mut grid = create_layout_engine(LayoutMode::Grid, &config);
        grid.load([item("a", 0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(grid.mode(), LayoutMode::Grid);
        assert_eq!(
            grid.move_item("a", Delta::new(8.0, 17.0)).map(|i| i.position),
            Some(Point::new(10.0, 20.0))
        );

        let mut free = create_layout_engine(LayoutMode::Free, &config);
        free.load([item("a", 0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(free.mode(), LayoutMode::Free);
        assert_eq!(
            free.move_item("a", Delta::new(8.0, 17.0)).map(|i| i.position),
            Some(Point::new(8.0, 17.0))
        );
    }

    #[test]
    fn alignment_skips_unknown_and_locked_ids() {
        use crate::align::AlignedItem;

        let mut engine = FreeLayoutEngine::default();
        engine.load([
            item("a", 300.0, 300.0, 200.0, 100.0),
            item("pinned", 700.0, 40.0, 200.0, 100.0).with_locked(true),
        ]);
        let placement = |id: &str| AlignedItem {
            id: id.to_owned(),
            position: Point::new(24.0, 24.0),
            size: Size::new(240.0, 180.0),
        };
        let plan = AlignPlan {
            placements: vec![placement("a"), placement("pinned"), placement("ghost")],
            columns: 1,
        };

        engine.apply_alignment(&plan);
        assert_eq!(
            engine.get("a").map(|i| (i.position, i.size)),
            Some((Point::new(24.0, 24.0), Size::new(240.0, 180.0)))
        );
        assert_eq!(engine.get("pinned").map(|i| i.position), Some(Point::new(700.0, 40.0)));
        assert!(engine.get("ghost").is_none());
        assert_eq!(engine.len(), 2);
    }
}
