#![forbid(unsafe_code)]

//! One-shot column reflow ("auto-align").
//!
//! [`auto_align`] takes an arbitrary, unordered set of rectangles and
//! rearranges them into tidy columns that approximate the columns the user
//! was already roughly forming:
//!
//! 1. **Normalize**: widths are floored to `min_width`, heights come from the
//!    measurement collaborator when available (rendered content may have
//!    reflowed), then fall back to the stored height, then floor to
//!    `min_height`. Non-finite values fall back to the default size.
//! 2. **Sort** by x ascending (ties by id).
//! 3. **Cluster**: each item joins the column whose center is nearest to its
//!    own horizontal center, provided the distance is at most
//!    `(column_width + item_width + horizontal_gap) / 4`; otherwise it starts
//!    a new column. A column's width is the widest member so far and its
//!    center is the mean of its members' centers.
//! 4. **Place columns** left to right by center, starting at `left_margin`
//!    and advancing by `column_width + horizontal_gap`.
//! 5. **Stack** each column's items top to bottom by current y (ties by id),
//!    starting at `top_margin` with `vertical_gap` between items, each item
//!    horizontally centered in its column.
//!
//! Locked items are excluded entirely: they are not clustered and keep their
//! geometry. The result is independent of input order, and re-running it on
//! its own output yields the identical arrangement.
//!
//! The cost is O(n·k) for n items and k columns.

use std::collections::HashMap;
use std::hash::BuildHasher;

use pinboard_core::geometry::{LayoutItem, Point, Size};
use pinboard_core::sanitize;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Margins, gaps, and size floors for auto-align.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Left edge of the first column. Default: 24.
    pub left_margin: f64,
    /// Top edge of every column. Default: 24.
    pub top_margin: f64,
    /// Space between columns; also feeds the clustering threshold. Default: 24.
    pub horizontal_gap: f64,
    /// Space between stacked items. Default: 8.
    pub vertical_gap: f64,
    /// Width floor. Default: 120.
    pub min_width: f64,
    /// Height floor. Default: 90.
    pub min_height: f64,
    /// Width used when the stored width is unusable. Default: 240.
    pub default_width: f64,
    /// Height used when neither measured nor stored height is usable. Default: 180.
    pub default_height: f64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            left_margin: 24.0,
            top_margin: 24.0,
            horizontal_gap: 24.0,
            vertical_gap: 8.0,
            min_width: 120.0,
            min_height: 90.0,
            default_width: 240.0,
            default_height: 180.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Measurement collaborator
// ---------------------------------------------------------------------------

/// Rendered-height lookup supplied by the host.
///
/// Returning `None` (or a non-finite / non-positive value) makes auto-align
/// fall back to the stored height.
pub trait MeasureHeight {
    fn measured_height(&self, id: &str) -> Option<f64>;
}

/// Measurement that never knows anything; auto-align uses stored heights.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMeasurement;

impl MeasureHeight for NoMeasurement {
    fn measured_height(&self, _id: &str) -> Option<f64> {
        None
    }
}

impl<S: BuildHasher> MeasureHeight for HashMap<String, f64, S> {
    fn measured_height(&self, id: &str) -> Option<f64> {
        self.get(id).copied()
    }
}

impl<F> MeasureHeight for F
where
    F: Fn(&str) -> Option<f64>,
{
    fn measured_height(&self, id: &str) -> Option<f64> {
        self(id)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// New geometry for one reflowed item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedItem {
    pub id: String,
    pub position: Point,
    pub size: Size,
}

/// Result of one auto-align pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlignPlan {
    /// One entry per unlocked input item, ordered by column then top to bottom.
    pub placements: Vec<AlignedItem>,
    /// Number of columns formed.
    pub columns: usize,
}

impl AlignPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Placement for one id.
    pub fn get(&self, id: &str) -> Option<&AlignedItem> {
        self.placements.iter().find(|p| p.id == id)
    }
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Candidate<'a> {
    id: &'a str,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Candidate<'_> {
    #[inline]
    fn center_x(&self) -> f64 {
        self.x + self.w / 2.0
    }
}

#[derive(Debug)]
struct Column {
    center: f64,
    center_sum: f64,
    width: f64,
    /// Indices into the sorted candidate list.
    members: Vec<usize>,
}

impl Column {
    fn start(index: usize, candidate: &Candidate<'_>) -> Self {
        let center = candidate.center_x();
        Self {
            center,
            center_sum: center,
            width: candidate.w,
            members: vec![index],
        }
    }

    fn join(&mut self, index: usize, candidate: &Candidate<'_>) {
        self.members.push(index);
        self.width = self.width.max(candidate.w);
        self.center_sum += candidate.center_x();
        self.center = self.center_sum / self.members.len() as f64;
    }

    /// Whether an item centered at `center` with width `width` is close
    /// enough to merge.
    fn accepts(&self, center: f64, width: f64, gap: f64) -> bool {
        let threshold = (self.width + width + gap) / 4.0;
        (self.center - center).abs() <= threshold
    }
}

fn normalize<'a, M>(item: &'a LayoutItem, measure: &M, config: &AlignConfig) -> Candidate<'a>
where
    M: MeasureHeight + ?Sized,
{
    let w = sanitize::at_least(item.size.w, config.min_width, config.default_width);
    let stored_h = sanitize::at_least(item.size.h, config.min_height, config.default_height);
    let h = measure
        .measured_height(&item.id)
        .filter(|h| h.is_finite() && *h > 0.0)
        .map_or(stored_h, |h| h.max(config.min_height));
    Candidate {
        id: &item.id,
        x: sanitize::non_negative(item.position.x),
        y: sanitize::non_negative(item.position.y),
        w,
        h,
    }
}

fn cluster(candidates: &[Candidate<'_>], gap: f64) -> Vec<Column> {
    let mut columns: Vec<Column> = Vec::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let center = candidate.center_x();
        let nearest = columns
            .iter_mut()
            .map(|column| ((column.center - center).abs(), column))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, column)| column);
        match nearest {
            Some(column) if column.accepts(center, candidate.w, gap) => {
                column.join(index, candidate);
            }
            _ => columns.push(Column::start(index, candidate)),
        }
    }
    columns
}

/// Reflow every unlocked item into columns.
///
/// Never fails: an empty or fully locked input yields an empty plan, and
/// unusable numbers degrade to the configured defaults.
pub fn auto_align<M>(items: &[LayoutItem], measure: &M, config: &AlignConfig) -> AlignPlan
where
    M: MeasureHeight + ?Sized,
{
    let mut candidates: Vec<Candidate<'_>> = items
        .iter()
        .filter(|item| !item.locked)
        .map(|item| normalize(item, measure, config))
        .collect();
    if candidates.is_empty() {
        tracing::trace!(target: "pinboard.align", items = items.len(), "nothing to align");
        return AlignPlan::default();
    }

    candidates.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.id.cmp(b.id)));

    let h_gap = sanitize::non_negative(config.horizontal_gap);
    let v_gap = sanitize::non_negative(config.vertical_gap);
    let mut columns = cluster(&candidates, h_gap);
    // Members are pushed in sorted order, so the first member index breaks
    // center ties deterministically.
    columns.sort_by(|a, b| {
        a.center
            .total_cmp(&b.center)
            .then_with(|| a.members[0].cmp(&b.members[0]))
    });

    let mut placements = Vec::with_capacity(candidates.len());
    let mut cursor = sanitize::non_negative(config.left_margin);
    let top_margin = sanitize::non_negative(config.top_margin);
    for column in &mut columns {
        let column_center = cursor + column.width / 2.0;
        cursor += column.width + h_gap;

        column.members.sort_by(|&a, &b| {
            let (a, b) = (&candidates[a], &candidates[b]);
            a.y.total_cmp(&b.y).then_with(|| a.id.cmp(b.id))
        });

        let mut top = top_margin;
        for &index in &column.members {
            let candidate = &candidates[index];
            placements.push(AlignedItem {
                id: candidate.id.to_owned(),
                position: Point::new(column_center - candidate.w / 2.0, top),
                size: Size::new(candidate.w, candidate.h),
            });
            top += candidate.h + v_gap;
        }
    }

    tracing::debug!(
        target: "pinboard.align",
        items = placements.len(),
        locked = items.len() - placements.len(),
        columns = columns.len(),
        "auto-align computed"
    );

    AlignPlan {
        placements,
        columns: columns.len(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
