#![forbid(unsafe_code)]

//! One open board: engine, drag controller, and persistence wired together.
//!
//! [`BoardSession`] is the boundary the UI event loop talks to. It converts
//! device-space pointer samples to board content space, feeds them through
//! the [`DragController`], and upserts every position the controller
//! reports. Persistence is fire-and-forget: a failed write is logged and
//! the local engine stays authoritative.
//!
//! Switching boards, toggling the layout mode, and removing the widget under
//! an active drag all end the drag first, so a session never refers to an
//! item the engine no longer holds.

use pinboard_core::geometry::{LayoutItem, Point, Size};
use pinboard_core::pointer::PointerId;
use pinboard_layout::{
    AlignPlan, CancelReason, DragController, DragEffect, DragTransition, DynLayoutEngine,
    LayoutConfig, LayoutMode, MeasureHeight, create_layout_engine,
};

use crate::board::{Board, WidgetInstance, WidgetState};
use crate::store::{GeometryUpdate, PositionStore};

/// Live state for the active board.
#[derive(Debug)]
pub struct BoardSession<S> {
    board: Board,
    config: LayoutConfig,
    engine: DynLayoutEngine,
    drag: DragController,
    store: S,
}

impl<S: PositionStore> BoardSession<S> {
    /// Open `board` and load the widgets that belong to it.
    ///
    /// Instances whose `board_id` does not match are skipped.
    pub fn open(board: Board, widgets: &[WidgetInstance], config: LayoutConfig, store: S) -> Self {
        let engine = build_engine(&board, widgets, &config);
        Self {
            board,
            config,
            engine,
            drag: DragController::new(),
            store,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn engine(&self) -> &DynLayoutEngine {
        &self.engine
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Deterministic snapshot of every item on the board.
    #[must_use]
    pub fn items(&self) -> Vec<LayoutItem> {
        self.engine.serialize()
    }

    /// Replace the active board. Any drag in progress is canceled (and its
    /// position persisted) before the new widgets are loaded.
    pub fn switch_board(&mut self, board: Board, widgets: &[WidgetInstance]) -> Option<DragTransition> {
        let canceled = self.cancel_active_drag();
        self.engine = build_engine(&board, widgets, &self.config);
        tracing::debug!(
            target: "pinboard.board",
            from = %self.board.id,
            to = %board.id,
            items = self.engine.len(),
            "board switched"
        );
        self.board = board;
        canceled
    }

    /// Flip grid/free and rebuild the engine from the current snapshot.
    ///
    /// Positions are carried over as-is; the new policy applies from the
    /// next move.
    pub fn toggle_layout_mode(&mut self) -> LayoutMode {
        self.cancel_active_drag();
        let mode = self.board.layout_mode.toggled();
        let snapshot = self.engine.serialize();
        let mut engine = create_layout_engine(mode, &self.config);
        engine.load(snapshot);
        engine.set_board_locked(self.board.locked);
        self.engine = engine;
        self.board.layout_mode = mode;
        tracing::debug!(target: "pinboard.board", board = %self.board.id, %mode, "layout mode toggled");
        mode
    }

    /// Lock or unlock the whole board. An active drag stays open but every
    /// further move is rejected while locked.
    pub fn set_board_locked(&mut self, locked: bool) {
        self.board.locked = locked;
        self.engine.set_board_locked(locked);
        tracing::debug!(target: "pinboard.board", board = %self.board.id, locked, "board lock changed");
    }

    /// Lock or unlock one widget.
    pub fn set_widget_locked(&mut self, widget_id: &str, locked: bool) -> Option<LayoutItem> {
        self.engine.set_locked(widget_id, locked)
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.board.zoom = zoom;
    }

    pub fn pointer_down(&mut self, widget_id: &str, pointer_id: PointerId, device: Point) -> DragTransition {
        let point = self.content_point(device);
        self.drag.pointer_down(&self.engine, widget_id, pointer_id, point)
    }

    pub fn pointer_move(&mut self, pointer_id: PointerId, device: Point) -> DragTransition {
        let point = self.content_point(device);
        let transition = self.drag.pointer_move(&mut self.engine, pointer_id, point);
        self.persist(&transition);
        transition
    }

    pub fn pointer_up(&mut self, pointer_id: PointerId) -> DragTransition {
        let transition = self.drag.pointer_up(pointer_id);
        self.persist(&transition);
        transition
    }

    pub fn pointer_cancel(&mut self, pointer_id: PointerId) -> DragTransition {
        let transition = self.drag.cancel(pointer_id, CancelReason::PointerCancel);
        self.persist(&transition);
        transition
    }

    /// The pointer left the board surface; ends the drag like a cancel.
    pub fn pointer_leave(&mut self, pointer_id: PointerId) -> DragTransition {
        let transition = self.drag.cancel(pointer_id, CancelReason::PointerLeave);
        self.persist(&transition);
        transition
    }

    /// Reflow every unlocked widget into columns and persist the result.
    ///
    /// Returns `None` without touching anything while a drag is open.
    pub fn auto_align<M>(&mut self, measure: &M) -> Option<AlignPlan>
    where
        M: MeasureHeight + ?Sized,
    {
        if self.drag.is_active() {
            tracing::trace!(target: "pinboard.board", "auto-align refused: drag in progress");
            return None;
        }
        let plan = self.engine.auto_align(measure, &self.config.align);
        for placement in &plan.placements {
            if let Some(item) = self.engine.get(&placement.id) {
                let update = GeometryUpdate::from_item(item);
                self.write(&update);
            }
        }
        Some(plan)
    }

    /// Cascade position for the next new widget.
    #[must_use]
    pub fn spawn_position(&self) -> Point {
        let spawn = &self.config.spawn;
        let offset = spawn.origin + self.engine.len() as f64 * spawn.cascade_step;
        Point::new(offset, offset)
    }

    /// Place a new instance of `definition_id` at the cascade position with
    /// the default size, above every existing widget.
    ///
    /// Returns `None`, leaving the board untouched, when `widget_id` is
    /// already on the board.
    pub fn add_widget(
        &mut self,
        widget_id: impl Into<String>,
        definition_id: impl Into<String>,
    ) -> Option<WidgetInstance> {
        let widget_id = widget_id.into();
        if self.engine.get(&widget_id).is_some() {
            tracing::trace!(target: "pinboard.board", widget = %widget_id, "add refused: id in use");
            return None;
        }
        let count = self.engine.len();
        let position = self.spawn_position();
        let size = Size::new(self.config.spawn.default_width, self.config.spawn.default_height);
        let item = self.engine.insert(LayoutItem::new(widget_id, position, size));
        let widget = WidgetInstance {
            id: item.id.clone(),
            board_id: self.board.id.clone(),
            definition_id: definition_id.into(),
            state: WidgetState::new(),
            position: item.position,
            size: item.size,
            z_index: u32::try_from(count + 1).unwrap_or(u32::MAX),
            locked: false,
        };
        tracing::debug!(
            target: "pinboard.board",
            widget = %widget.id,
            definition = %widget.definition_id,
            z_index = widget.z_index,
            "widget added"
        );
        self.write(&GeometryUpdate::from_item(&item));
        Some(widget)
    }

    /// Delete a widget. A drag on it is dropped without persisting, since the
    /// record is about to disappear.
    pub fn remove_widget(&mut self, widget_id: &str) -> Option<LayoutItem> {
        let dragging = self
            .drag
            .session()
            .is_some_and(|session| session.item_id == widget_id);
        if dragging {
            self.drag.force_cancel();
        }
        let removed = self.engine.remove(widget_id)?;
        if let Err(err) = self.store.remove_widget(widget_id) {
            tracing::warn!(target: "pinboard.board", widget = widget_id, %err, "widget removal not persisted");
        }
        tracing::debug!(target: "pinboard.board", widget = widget_id, "widget removed");
        Some(removed)
    }

    fn content_point(&self, device: Point) -> Point {
        let zoom = self.board.effective_zoom();
        Point::new(device.x / zoom, device.y / zoom)
    }

    fn cancel_active_drag(&mut self) -> Option<DragTransition> {
        let transition = self.drag.force_cancel()?;
        self.persist(&transition);
        Some(transition)
    }

    fn persist(&mut self, transition: &DragTransition) {
        if !matches!(
            transition.effect,
            DragEffect::Moved { .. } | DragEffect::Committed { .. } | DragEffect::Canceled { .. }
        ) {
            return;
        }
        let Some((widget_id, _)) = transition.position_update() else {
            return;
        };
        let Some(item) = self.engine.get(widget_id) else {
            tracing::trace!(target: "pinboard.board", widget = widget_id, "position not persisted: widget gone");
            return;
        };
        let update = GeometryUpdate::from_item(item);
        self.write(&update);
    }

    fn write(&mut self, update: &GeometryUpdate) {
        if let Err(err) = self.store.upsert_geometry(update) {
            tracing::warn!(
                target: "pinboard.board",
                widget = %update.widget_id,
                %err,
                "geometry not persisted"
            );
        }
    }
}

fn build_engine(board: &Board, widgets: &[WidgetInstance], config: &LayoutConfig) -> DynLayoutEngine {
    let mut engine = create_layout_engine(board.layout_mode, config);
    let (own, foreign): (Vec<_>, Vec<_>) = widgets.iter().partition(|w| w.board_id == board.id);
    engine.load(own.into_iter().map(WidgetInstance::layout_item));
    engine.set_board_locked(board.locked);
    if !foreign.is_empty() {
        tracing::debug!(
            target: "pinboard.board",
            board = %board.id,
            skipped = foreign.len(),
            "widgets from other boards skipped"
        );
    }
    engine
}
