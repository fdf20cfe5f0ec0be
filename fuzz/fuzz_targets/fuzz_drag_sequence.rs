#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pinboard_layout::{
    CancelReason, DragController, DragEffect, LayoutConfig, LayoutItem, LayoutMode, Point,
    PointerId, Size, create_layout_engine,
};

#[derive(Debug, Arbitrary)]
enum Step {
    Down { item: u8, pointer: u8, x: f32, y: f32 },
    Move { pointer: u8, x: f32, y: f32 },
    Up { pointer: u8 },
    Cancel { pointer: u8, leave: bool },
    LockItem { item: u8, locked: bool },
    LockBoard { locked: bool },
    Remove { item: u8 },
    ForceCancel,
}

#[derive(Debug, Arbitrary)]
struct Input {
    grid: bool,
    step: f32,
    items: Vec<(f32, f32, f32, f32)>,
    steps: Vec<Step>,
}

fn id(index: u8) -> String {
    format!("w{}", index % 8)
}

fuzz_target!(|input: Input| {
    let mut config = LayoutConfig::default();
    config.grid.step = f64::from(input.step);
    let mode = if input.grid { LayoutMode::Grid } else { LayoutMode::Free };
    let mut engine = create_layout_engine(mode, &config);
    engine.load(input.items.iter().take(8).enumerate().map(|(i, &(x, y, w, h))| {
        LayoutItem::new(
            format!("w{i}"),
            Point::new(f64::from(x), f64::from(y)),
            Size::new(f64::from(w), f64::from(h)),
        )
    }));
    let mut drag = DragController::new();

    for step in input.steps.into_iter().take(256) {
        let before = engine.serialize();
        let transition = match step {
            Step::Down { item, pointer, x, y } => drag.pointer_down(
                &engine,
                &id(item),
                PointerId::new(u32::from(pointer)),
                Point::new(f64::from(x), f64::from(y)),
            ),
            Step::Move { pointer, x, y } => drag.pointer_move(
                &mut engine,
                PointerId::new(u32::from(pointer)),
                Point::new(f64::from(x), f64::from(y)),
            ),
            Step::Up { pointer } => drag.pointer_up(PointerId::new(u32::from(pointer))),
            Step::Cancel { pointer, leave } => {
                let reason = if leave {
                    CancelReason::PointerLeave
                } else {
                    CancelReason::PointerCancel
                };
                drag.cancel(PointerId::new(u32::from(pointer)), reason)
            }
            Step::LockItem { item, locked } => {
                engine.set_locked(&id(item), locked);
                continue;
            }
            Step::LockBoard { locked } => {
                engine.set_board_locked(locked);
                continue;
            }
            Step::Remove { item } => {
                engine.remove(&id(item));
                continue;
            }
            Step::ForceCancel => {
                drag.force_cancel();
                continue;
            }
        };

        // Only an accepted move may change geometry, and only of its own item.
        let after = engine.serialize();
        match &transition.effect {
            DragEffect::Moved { item_id, position, .. } => {
                let moved = engine.get(item_id).expect("moved item is loaded");
                assert_eq!(moved.position, *position);
                for (a, b) in before.iter().zip(&after) {
                    if &a.id != item_id {
                        assert_eq!(a, b, "unrelated item changed");
                    }
                }
            }
            _ => assert_eq!(before, after, "non-move step changed geometry"),
        }

        for item in &after {
            assert!(item.position.x >= 0.0 && item.position.y >= 0.0);
            assert!(item.position.x.is_finite() && item.position.y.is_finite());
            assert!(item.size.w >= engine.min_size() && item.size.h >= engine.min_size());
        }
        assert_eq!(drag.is_active(), drag.captured_pointer().is_some());
    }
});
