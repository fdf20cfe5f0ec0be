#![forbid(unsafe_code)]

//! Exclusive pointer-driven move of one item at a time.
//!
//! [`DragController`] turns raw pointer samples into incremental
//! [`LayoutEngine::move_item`] calls and reports the resulting positions as
//! data. It never touches storage; the caller persists what the returned
//! [`DragEffect`]s carry.
//!
//! # State Machine
//!
//! ```text
//! Idle --pointer_down--> Dragging(item, pointer)
//! Dragging --pointer_move--> Dragging      (Moved, or Noop)
//! Dragging --pointer_up--> Idle            (Committed)
//! Dragging --cancel/force_cancel--> Idle   (Canceled)
//! ```
//!
//! # Invariants
//!
//! 1. At most one session exists. A pointer-down while dragging is a no-op.
//! 2. Only the pointer that started the session can move, commit, or cancel
//!    it. Samples from any other pointer are dropped, never queued.
//! 3. Moves are delta-based: only relative motion between consecutive
//!    samples reaches the engine, so the pointer's device space and the
//!    board's content space may differ by any fixed offset.
//! 4. The last pointer sample advances by exactly the displacement the
//!    engine applied. Motion the placement policy floors, snaps, clamps, or
//!    vetoes stays pending and is offered again with the next sample, so
//!    sub-pixel steps add up and the item tracks its grab point.
//! 5. Cancel does not roll back. The item stays wherever the last accepted
//!    move left it, and `Canceled` carries that position for persistence.
//!
//! # Pointer capture
//!
//! `Started` tells the host to bind the pointer to the dragged element;
//! `Committed` and `Canceled` tell it to release the binding.

use std::fmt;

use pinboard_core::geometry::{Delta, Point};
use pinboard_core::pointer::PointerId;
use serde::{Deserialize, Serialize};

use crate::engine::{LayoutEngine, PlacementPolicy};

/// Drag lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        item_id: String,
        pointer_id: PointerId,
    },
}

/// Transient record of one in-progress drag. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    pub item_id: String,
    pub pointer_id: PointerId,
    /// Pointer-down sample shifted by every displacement the engine has
    /// applied so far.
    pub last_pointer: Point,
    /// Position most recently returned by the engine.
    pub committed: Point,
}

/// Why a drag ended without a pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The host reported a pointer-cancel.
    PointerCancel,
    /// The pointer left the board surface.
    PointerLeave,
    /// Cancelled by the application (board switch, widget removed).
    Programmatic,
}

/// Explicit diagnostics for input that is safely ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragNoopReason {
    BoardLocked,
    ItemLocked,
    UnknownItem,
    ActiveDragAlreadyInProgress,
    IdleWithoutActiveDrag,
    PointerMismatch,
    ZeroDelta,
    EngineRejected,
}

impl fmt::Display for DragNoopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::BoardLocked => "board is locked",
            Self::ItemLocked => "item is locked",
            Self::UnknownItem => "item is not loaded",
            Self::ActiveDragAlreadyInProgress => "another drag is active",
            Self::IdleWithoutActiveDrag => "no active drag",
            Self::PointerMismatch => "pointer does not own the drag",
            Self::ZeroDelta => "pointer did not move",
            Self::EngineRejected => "engine rejected the move",
        };
        f.write_str(text)
    }
}

/// Effect emitted by one controller step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum DragEffect {
    /// Session opened; capture `pointer_id`.
    Started {
        item_id: String,
        pointer_id: PointerId,
        origin: Point,
        position: Point,
    },
    /// Engine accepted a move; re-render optimistically.
    Moved {
        item_id: String,
        pointer_id: PointerId,
        delta: Delta,
        position: Point,
    },
    /// Session closed by pointer-up; release capture and persist `position`.
    Committed {
        item_id: String,
        pointer_id: PointerId,
        position: Point,
    },
    /// Session closed without pointer-up; release capture and persist `position`.
    Canceled {
        item_id: String,
        pointer_id: PointerId,
        position: Point,
        reason: CancelReason,
    },
    Noop {
        reason: DragNoopReason,
    },
}

/// One state-machine transition with deterministic telemetry fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragTransition {
    pub transition_id: u64,
    pub from: DragState,
    pub to: DragState,
    pub effect: DragEffect,
}

impl DragTransition {
    /// Whether the step was ignored.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self.effect, DragEffect::Noop { .. })
    }

    /// The no-op reason, if the step was ignored.
    #[must_use]
    pub fn noop_reason(&self) -> Option<DragNoopReason> {
        match self.effect {
            DragEffect::Noop { reason } => Some(reason),
            _ => None,
        }
    }

    /// `(item_id, position)` the caller should render and persist, if any.
    #[must_use]
    pub fn position_update(&self) -> Option<(&str, Point)> {
        match &self.effect {
            DragEffect::Moved {
                item_id, position, ..
            }
            | DragEffect::Committed {
                item_id, position, ..
            }
            | DragEffect::Canceled {
                item_id, position, ..
            } => Some((item_id.as_str(), *position)),
            DragEffect::Started { .. } | DragEffect::Noop { .. } => None,
        }
    }
}

/// Runtime lifecycle machine for widget drags.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    session: Option<DragSession>,
    transition_counter: u64,
}

impl DragController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DragState {
        match &self.session {
            None => DragState::Idle,
            Some(session) => DragState::Dragging {
                item_id: session.item_id.clone(),
                pointer_id: session.pointer_id,
            },
        }
    }

    /// Whether a drag session is open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The open session, if any.
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Pointer currently bound to the drag target.
    #[must_use]
    pub fn captured_pointer(&self) -> Option<PointerId> {
        self.session.as_ref().map(|s| s.pointer_id)
    }

    /// Try to open a session for `item_id` driven by `pointer_id`.
    ///
    /// Rejected while another drag is active, while the board is locked, and
    /// for unknown or locked items.
    pub fn pointer_down<P>(
        &mut self,
        engine: &LayoutEngine<P>,
        item_id: &str,
        pointer_id: PointerId,
        point: Point,
    ) -> DragTransition {
        let from = self.state();
        if self.session.is_some() {
            return self.noop(from, DragNoopReason::ActiveDragAlreadyInProgress);
        }
        if engine.is_board_locked() {
            return self.noop(from, DragNoopReason::BoardLocked);
        }
        let Some(item) = engine.get(item_id) else {
            return self.noop(from, DragNoopReason::UnknownItem);
        };
        if item.locked {
            return self.noop(from, DragNoopReason::ItemLocked);
        }

        let position = item.position;
        self.session = Some(DragSession {
            item_id: item_id.to_owned(),
            pointer_id,
            last_pointer: point,
            committed: position,
        });
        tracing::debug!(
            target: "pinboard.drag",
            item_id,
            pointer_id = pointer_id.get(),
            x = position.x,
            y = position.y,
            "drag started"
        );
        self.transition(
            from,
            DragEffect::Started {
                item_id: item_id.to_owned(),
                pointer_id,
                origin: point,
                position,
            },
        )
    }

    /// Forward one pointer sample to the engine as a delta.
    pub fn pointer_move<P: PlacementPolicy>(
        &mut self,
        engine: &mut LayoutEngine<P>,
        pointer_id: PointerId,
        point: Point,
    ) -> DragTransition {
        let from = self.state();
        let Some(session) = self.session.as_mut() else {
            return self.noop(from, DragNoopReason::IdleWithoutActiveDrag);
        };
        if session.pointer_id != pointer_id {
            return self.noop(from, DragNoopReason::PointerMismatch);
        }

        let delta = point - session.last_pointer;
        if delta.is_zero() {
            return self.noop(from, DragNoopReason::ZeroDelta);
        }

        let before = engine.get(&session.item_id).map(|item| item.position);
        let Some(moved) = engine.move_item(&session.item_id, delta) else {
            return self.noop(from, DragNoopReason::EngineRejected);
        };
        let applied = before.map_or(delta, |before| moved.position - before);
        session.committed = moved.position;
        session.last_pointer = session.last_pointer + applied;
        tracing::trace!(
            target: "pinboard.drag",
            item_id = %moved.id,
            dx = delta.dx,
            dy = delta.dy,
            x = moved.position.x,
            y = moved.position.y,
            "drag moved"
        );
        self.transition(
            from,
            DragEffect::Moved {
                item_id: moved.id,
                pointer_id,
                delta,
                position: moved.position,
            },
        )
    }

    /// Close the session owned by `pointer_id` and report the committed
    /// position.
    pub fn pointer_up(&mut self, pointer_id: PointerId) -> DragTransition {
        let from = self.state();
        let session = match self.take_owned(pointer_id) {
            Ok(session) => session,
            Err(reason) => return self.noop(from, reason),
        };
        tracing::debug!(
            target: "pinboard.drag",
            item_id = %session.item_id,
            pointer_id = pointer_id.get(),
            x = session.committed.x,
            y = session.committed.y,
            "drag committed"
        );
        self.transition(
            from,
            DragEffect::Committed {
                item_id: session.item_id,
                pointer_id,
                position: session.committed,
            },
        )
    }

    /// Close the session owned by `pointer_id` without a pointer-up.
    pub fn cancel(&mut self, pointer_id: PointerId, reason: CancelReason) -> DragTransition {
        let from = self.state();
        match self.take_owned(pointer_id) {
            Ok(session) => self.canceled(from, session, reason),
            Err(noop) => self.noop(from, noop),
        }
    }

    /// Unconditionally end any open session.
    ///
    /// Used when the application itself invalidates the drag (board switch,
    /// dragged widget removed). Returns `None` if already idle.
    pub fn force_cancel(&mut self) -> Option<DragTransition> {
        let from = self.state();
        let session = self.session.take()?;
        Some(self.canceled(from, session, CancelReason::Programmatic))
    }

    fn take_owned(&mut self, pointer_id: PointerId) -> Result<DragSession, DragNoopReason> {
        match self.captured_pointer() {
            None => Err(DragNoopReason::IdleWithoutActiveDrag),
            Some(owner) if owner != pointer_id => Err(DragNoopReason::PointerMismatch),
            Some(_) => self
                .session
                .take()
                .ok_or(DragNoopReason::IdleWithoutActiveDrag),
        }
    }

    fn canceled(
        &mut self,
        from: DragState,
        session: DragSession,
        reason: CancelReason,
    ) -> DragTransition {
        tracing::debug!(
            target: "pinboard.drag",
            item_id = %session.item_id,
            pointer_id = session.pointer_id.get(),
            ?reason,
            "drag canceled"
        );
        self.transition(
            from,
            DragEffect::Canceled {
                item_id: session.item_id,
                pointer_id: session.pointer_id,
                position: session.committed,
                reason,
            },
        )
    }

    fn noop(&mut self, from: DragState, reason: DragNoopReason) -> DragTransition {
        tracing::trace!(target: "pinboard.drag", ?reason, "drag input ignored");
        self.transition(from, DragEffect::Noop { reason })
    }

    fn transition(&mut self, from: DragState, effect: DragEffect) -> DragTransition {
        self.transition_counter = self.transition_counter.saturating_add(1);
        DragTransition {
            transition_id: self.transition_counter,
            from,
            to: self.state(),
            effect,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FreeLayoutEngine, GridLayoutEngine, GridPlacement};
    use pinboard_core::geometry::{LayoutItem, Size};

    const MOUSE: PointerId = PointerId::MOUSE;
    const FINGER: PointerId = PointerId::new(7);

    fn engine_with(items: impl IntoIterator<Item = LayoutItem>) -> FreeLayoutEngine {
        let mut engine = FreeLayoutEngine::default();
        engine.load(items);
        engine
    }

    fn item(id: &str, x: f64, y: f64) -> LayoutItem {
        LayoutItem::new(id, Point::new(x, y), Size::new(100.0, 100.0))
    }

    #[test]
    fn full_drag_lifecycle() {
        let mut engine = engine_with([item("a", 10.0, 10.0)]);
        let mut drag = DragController::new();

        let t = drag.pointer_down(&engine, "a", MOUSE, Point::new(500.0, 500.0));
        assert_eq!(t.from, DragState::Idle);
        assert!(matches!(t.effect, DragEffect::Started { ref item_id, position, .. }
            if item_id == "a" && position == Point::new(10.0, 10.0)));
        assert_eq!(drag.captured_pointer(), Some(MOUSE));

        let t = drag.pointer_move(&mut engine, MOUSE, Point::new(505.0, 507.0));
        assert_eq!(t.position_update(), Some(("a", Point::new(15.0, 17.0))));

        let t = drag.pointer_move(&mut engine, MOUSE, Point::new(510.0, 507.0));
        assert_eq!(t.position_update(), Some(("a", Point::new(20.0, 17.0))));

        let t = drag.pointer_up(MOUSE);
        assert!(matches!(t.effect, DragEffect::Committed { position, .. }
            if position == Point::new(20.0, 17.0)));
        assert_eq!(t.to, DragState::Idle);
        assert!(!drag.is_active());
        assert_eq!(drag.captured_pointer(), None);
    }

    #[test]
    fn second_pointer_down_is_rejected_while_dragging() {
        let engine = engine_with([item("a", 0.0, 0.0), item("b", 200.0, 0.0)]);
        let mut drag = DragController::new();
        drag.pointer_down(&engine, "a", MOUSE, Point::ORIGIN);

        let t = drag.pointer_down(&engine, "b", FINGER, Point::new(210.0, 10.0));
        assert_eq!(t.noop_reason(), Some(DragNoopReason::ActiveDragAlreadyInProgress));
        assert_eq!(drag.session().map(|s| s.item_id.as_str()), Some("a"));
    }

    #[test]
    fn pointer_down_rejections() {
        let mut engine = engine_with([item("a", 0.0, 0.0), item("pinned", 0.0, 0.0).with_locked(true)]);
        let mut drag = DragController::new();

        let t = drag.pointer_down(&engine, "missing", MOUSE, Point::ORIGIN);
        assert_eq!(t.noop_reason(), Some(DragNoopReason::UnknownItem));

        let t = drag.pointer_down(&engine, "pinned", MOUSE, Point::ORIGIN);
        assert_eq!(t.noop_reason(), Some(DragNoopReason::ItemLocked));

        engine.set_board_locked(true);
        let t = drag.pointer_down(&engine, "a", MOUSE, Point::ORIGIN);
        assert_eq!(t.noop_reason(), Some(DragNoopReason::BoardLocked));
        assert!(!drag.is_active());
    }

    #[test]
    fn foreign_pointer_samples_are_dropped() {
        let mut engine = engine_with([item("a", 0.0, 0.0)]);
        let mut drag = DragController::new();
        drag.pointer_down(&engine, "a", MOUSE, Point::ORIGIN);

        let t = drag.pointer_move(&mut engine, FINGER, Point::new(50.0, 50.0));
        assert_eq!(t.noop_reason(), Some(DragNoopReason::PointerMismatch));
        assert_eq!(engine.get("a").map(|i| i.position), Some(Point::ORIGIN));

        let t = drag.pointer_up(FINGER);
        assert_eq!(t.noop_reason(), Some(DragNoopReason::PointerMismatch));
        let t = drag.cancel(FINGER, CancelReason::PointerCancel);
        assert_eq!(t.noop_reason(), Some(DragNoopReason::PointerMismatch));
        assert!(drag.is_active());
    }

    #[test]
    fn idle_input_is_ignored() {
        let mut engine = engine_with([item("a", 0.0, 0.0)]);
        let mut drag = DragController::new();
        for t in [
            drag.pointer_move(&mut engine, MOUSE, Point::new(3.0, 3.0)),
            drag.pointer_up(MOUSE),
            drag.cancel(MOUSE, CancelReason::PointerLeave),
        ] {
            assert_eq!(t.noop_reason(), Some(DragNoopReason::IdleWithoutActiveDrag));
        }
        assert!(drag.force_cancel().is_none());
    }

    #[test]
    fn zero_delta_is_ignored() {
        let mut engine = engine_with([item("a", 0.0, 0.0)]);
        let mut drag = DragController::new();
        drag.pointer_down(&engine, "a", MOUSE, Point::new(4.0, 4.0));
        let t = drag.pointer_move(&mut engine, MOUSE, Point::new(4.0, 4.0));
        assert_eq!(t.noop_reason(), Some(DragNoopReason::ZeroDelta));
    }

    #[test]
    fn lock_mid_drag_keeps_session_and_accumulates_motion() {
        let mut engine = engine_with([item("a", 0.0, 0.0)]);
        let mut drag = DragController::new();
        drag.pointer_down(&engine, "a", MOUSE, Point::ORIGIN);
        drag.pointer_move(&mut engine, MOUSE, Point::new(10.0, 0.0));

        engine.set_locked("a", true);
        let t = drag.pointer_move(&mut engine, MOUSE, Point::new(30.0, 0.0));
        assert_eq!(t.noop_reason(), Some(DragNoopReason::EngineRejected));
        assert!(drag.is_active());
        assert_eq!(drag.session().map(|s| s.last_pointer), Some(Point::new(10.0, 0.0)));

        engine.set_locked("a", false);
        let t = drag.pointer_move(&mut engine, MOUSE, Point::new(35.0, 0.0));
        assert_eq!(t.position_update(), Some(("a", Point::new(35.0, 0.0))));
    }

    #[test]
    fn sub_pixel_steps_accumulate() {
        let mut engine = engine_with([item("a", 0.0, 0.0)]);
        let mut drag = DragController::new();
        drag.pointer_down(&engine, "a", MOUSE, Point::ORIGIN);

        let mut seen = Vec::new();
        for step in 1..=8 {
            let t = drag.pointer_move(&mut engine, MOUSE, Point::new(f64::from(step) * 0.25, 0.0));
            seen.push(t.position_update().map(|(_, p)| p.x));
        }
        assert_eq!(
            seen,
            [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0].map(Some).to_vec()
        );
        assert_eq!(drag.session().map(|s| s.last_pointer), Some(Point::new(2.0, 0.0)));
    }

    #[test]
    fn clamped_motion_keeps_grab_point() {
        let mut engine = engine_with([item("a", 5.0, 0.0)]);
        let mut drag = DragController::new();
        drag.pointer_down(&engine, "a", MOUSE, Point::new(100.0, 0.0));

        let t = drag.pointer_move(&mut engine, MOUSE, Point::new(50.0, 0.0));
        assert_eq!(t.position_update(), Some(("a", Point::ORIGIN)));
        let t = drag.pointer_move(&mut engine, MOUSE, Point::new(60.0, 0.0));
        assert_eq!(t.position_update(), Some(("a", Point::ORIGIN)));

        let t = drag.pointer_move(&mut engine, MOUSE, Point::new(105.0, 0.0));
        assert_eq!(t.position_update(), Some(("a", Point::new(10.0, 0.0))));
    }

    #[test]
    fn cancel_keeps_last_committed_position() {
        let mut engine = engine_with([item("a", 0.0, 0.0)]);
        let mut drag = DragController::new();
        drag.pointer_down(&engine, "a", MOUSE, Point::ORIGIN);
        drag.pointer_move(&mut engine, MOUSE, Point::new(40.0, 25.0));

        let t = drag.cancel(MOUSE, CancelReason::PointerLeave);
        assert!(matches!(t.effect, DragEffect::Canceled { position, reason: CancelReason::PointerLeave, .. }
            if position == Point::new(40.0, 25.0)));
        assert_eq!(engine.get("a").map(|i| i.position), Some(Point::new(40.0, 25.0)));
        assert!(!drag.is_active());
    }

    #[test]
    fn force_cancel_is_programmatic() {
        let engine = engine_with([item("a", 5.0, 5.0)]);
        let mut drag = DragController::new();
        drag.pointer_down(&engine, "a", FINGER, Point::ORIGIN);
        let t = drag.force_cancel().expect("active session");
        assert!(matches!(t.effect, DragEffect::Canceled { reason: CancelReason::Programmatic, pointer_id, .. }
            if pointer_id == FINGER));
        assert!(!drag.is_active());
    }

    #[test]
    fn grid_drag_reports_snapped_positions() {
        let mut engine = GridLayoutEngine::new(GridPlacement::new(10.0));
        engine.load([item("a", 0.0, 0.0)]);
        let mut drag = DragController::new();
        drag.pointer_down(&engine, "a", MOUSE, Point::ORIGIN);
        let t = drag.pointer_move(&mut engine, MOUSE, Point::new(8.0, 17.0));
        assert_eq!(t.position_update(), Some(("a", Point::new(10.0, 20.0))));
    }

    #[test]
    fn transition_ids_are_monotonic() {
        let mut engine = engine_with([item("a", 0.0, 0.0)]);
        let mut drag = DragController::new();
        let ids = [
            drag.pointer_down(&engine, "a", MOUSE, Point::ORIGIN).transition_id,
            drag.pointer_move(&mut engine, MOUSE, Point::new(1.0, 1.0)).transition_id,
            drag.pointer_up(MOUSE).transition_id,
        ];
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn transitions_serialize_with_tags() {
        let engine = engine_with([item("a", 0.0, 0.0)]);
        let mut drag = DragController::new();
        let t = drag.pointer_down(&engine, "a", MOUSE, Point::ORIGIN);
        let json = serde_json::to_value(&t).expect("serialize");
        assert_eq!(json["effect"]["effect"], "started");
        assert_eq!(json["to"]["state"], "dragging");
        assert_eq!(json["from"]["state"], "idle");
    }
}
