#![no_main]

use libfuzzer_sys::fuzz_target;
use pinboard_layout::{AlignConfig, LayoutItem, NoMeasurement, Point, Size, auto_align};

fuzz_target!(|raw: Vec<(f32, f32, f32, f32, bool)>| {
    let items: Vec<LayoutItem> = raw
        .iter()
        .take(64)
        .enumerate()
        .map(|(i, &(x, y, w, h, locked))| {
            LayoutItem::new(
                format!("w{i:02}"),
                Point::new(f64::from(x), f64::from(y)),
                Size::new(f64::from(w), f64::from(h)),
            )
            .with_locked(locked)
        })
        .collect();

    let config = AlignConfig::default();
    let plan = auto_align(&items, &NoMeasurement, &config);

    let unlocked = items.iter().filter(|i| !i.locked).count();
    assert_eq!(plan.placements.len(), unlocked);
    for placement in &plan.placements {
        assert!(placement.position.x.is_finite() && placement.position.y.is_finite());
        assert!(placement.size.w >= config.min_width);
        assert!(placement.size.h >= config.min_height);
    }
});
