//! Horizontal scroll state and drag-gesture tracking for card strips.
//!
//! All geometry here is in terminal cells. [`ScrollMetrics`] owns chevron
//! visibility and paging; [`CarouselState`] adds card selection on top;
//! [`DragTracker`] turns mouse press/drag/release into swipe outcomes,
//! disambiguating horizontal swipes from vertical scrolling the same way
//! the axis check works for touch gestures. Gesture state is local per
//! carousel instance, never shared.

use std::time::Instant;

/// Dead zone at either edge before a chevron appears.
pub const CHEVRON_THRESHOLD: usize = 10;

/// Minimum drag displacement for a swipe, regardless of speed.
pub const SWIPE_DISTANCE: usize = 50;

/// A fast flick counts as a swipe from a shorter distance.
const FLICK_DISTANCE: usize = 10;
const FLICK_VELOCITY: f64 = 0.5; // cells per millisecond

/// Fixed paging step for the compact tab strip.
pub const TAB_STRIP_STEP: usize = 24;

// ============================================================================
// Scroll Metrics
// ============================================================================

/// Scroll geometry of one horizontally scrollable region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    /// Cells scrolled past the left edge.
    pub offset: usize,
    /// Visible width.
    pub viewport: usize,
    /// Total content width.
    pub content: usize,
}

impl ScrollMetrics {
    pub fn new(offset: usize, viewport: usize, content: usize) -> Self {
        let mut metrics = ScrollMetrics {
            offset,
            viewport,
            content,
        };
        metrics.clamp();
        metrics
    }

    /// Largest valid offset: content flush with the right edge.
    pub fn max_offset(&self) -> usize {
        self.content.saturating_sub(self.viewport)
    }

    fn clamp(&mut self) {
        let max = self.max_offset();
        if self.offset > max {
            self.offset = max;
        }
    }

    /// Update dimensions after a rebuild or resize, keeping the offset
    /// valid. Safe to call repeatedly; identical inputs change nothing.
    pub fn reattach(&mut self, viewport: usize, content: usize) {
        self.viewport = viewport;
        self.content = content;
        self.clamp();
    }

    pub fn overflows(&self) -> bool {
        self.content > self.viewport
    }

    /// Left chevron: shown once the content is scrolled past the dead zone.
    pub fn left_chevron(&self) -> bool {
        self.offset > CHEVRON_THRESHOLD
    }

    /// Right chevron: shown while meaningful content remains to the right.
    pub fn right_chevron(&self) -> bool {
        self.offset + self.viewport < self.content.saturating_sub(CHEVRON_THRESHOLD)
    }

    /// Scroll right by one viewport width (or a custom step), clamped.
    pub fn page_right(&mut self) {
        self.step_right(self.viewport);
    }

    pub fn page_left(&mut self) {
        self.step_left(self.viewport);
    }

    pub fn step_right(&mut self, step: usize) {
        self.offset = (self.offset + step).min(self.max_offset());
    }

    pub fn step_left(&mut self, step: usize) {
        self.offset = self.offset.saturating_sub(step);
    }

    /// Scroll the minimum amount needed to fully expose
    /// `[start, start + width)`.
    pub fn scroll_into_view(&mut self, start: usize, width: usize) {
        if start < self.offset {
            self.offset = start;
        } else if start + width > self.offset + self.viewport {
            self.offset = (start + width).saturating_sub(self.viewport);
        }
        self.clamp();
    }
}

// ============================================================================
// Carousel State
// ============================================================================

/// Scroll metrics plus the selected card of one event strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CarouselState {
    pub metrics: ScrollMetrics,
    pub selected: usize,
}

impl CarouselState {
    /// Re-initialize against freshly built content. Idempotent: calling
    /// twice with the same dimensions leaves the state unchanged.
    pub fn reattach(&mut self, viewport: usize, card_count: usize, card_width: usize) {
        self.metrics
            .reattach(viewport, card_count.saturating_mul(card_width));
        if card_count == 0 {
            self.selected = 0;
        } else if self.selected >= card_count {
            self.selected = card_count - 1;
        }
    }

    pub fn select_next(&mut self, card_count: usize, card_width: usize) {
        if card_count == 0 {
            return;
        }
        if self.selected + 1 < card_count {
            self.selected += 1;
        }
        self.metrics
            .scroll_into_view(self.selected * card_width, card_width);
    }

    pub fn select_prev(&mut self, card_width: usize) {
        self.selected = self.selected.saturating_sub(1);
        self.metrics
            .scroll_into_view(self.selected * card_width, card_width);
    }
}

// ============================================================================
// Drag Gesture Tracking
// ============================================================================

/// Committed direction of an in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragAxis {
    Horizontal,
    Vertical,
}

/// What a completed drag asks the carousel to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Below threshold (or vertical): spring back, no paging.
    None,
    /// Dragged leftward far/fast enough: advance to the next page.
    Next,
    /// Dragged rightward: go back one page.
    Prev,
}

/// Tracks one press-drag-release gesture.
#[derive(Debug, Clone)]
pub struct DragTracker {
    start: (i32, i32),
    current: (i32, i32),
    started_at: Instant,
    axis: Option<DragAxis>,
}

impl DragTracker {
    /// Axis is committed once total displacement reaches this.
    const AXIS_COMMIT: i32 = 3;

    pub fn begin(x: i32, y: i32) -> Self {
        Self::begin_at(x, y, Instant::now())
    }

    fn begin_at(x: i32, y: i32, now: Instant) -> Self {
        DragTracker {
            start: (x, y),
            current: (x, y),
            started_at: now,
            axis: None,
        }
    }

    /// Record a drag position. The first update with enough displacement
    /// commits the gesture to one axis; once vertical, the carousel
    /// ignores it for the rest of the gesture.
    pub fn update(&mut self, x: i32, y: i32) -> Option<DragAxis> {
        self.current = (x, y);
        if self.axis.is_none() {
            let dx = (x - self.start.0).abs();
            let dy = (y - self.start.1).abs();
            if dx.max(dy) >= Self::AXIS_COMMIT {
                self.axis = Some(if dy > dx {
                    DragAxis::Vertical
                } else {
                    DragAxis::Horizontal
                });
            }
        }
        self.axis
    }

    /// Resolve the gesture on release.
    pub fn release(self) -> SwipeOutcome {
        self.release_at(Instant::now())
    }

    fn release_at(self, now: Instant) -> SwipeOutcome {
        if self.axis == Some(DragAxis::Vertical) {
            return SwipeOutcome::None;
        }
        let dx = self.current.0 - self.start.0;
        let distance = dx.unsigned_abs() as usize;
        let elapsed = now.duration_since(self.started_at);
        let millis = elapsed.as_millis().max(1) as f64;
        let velocity = distance as f64 / millis;

        let is_swipe =
            distance >= SWIPE_DISTANCE || (distance >= FLICK_DISTANCE && velocity >= FLICK_VELOCITY);
        if !is_swipe {
            return SwipeOutcome::None;
        }
        // Dragging content leftward (negative dx) reveals the next page
        if dx < 0 {
            SwipeOutcome::Next
        } else {
            SwipeOutcome::Prev
        }
    }

    #[cfg(test)]
    fn with_elapsed(mut self, elapsed: std::time::Duration, now: Instant) -> Self {
        self.started_at = now - elapsed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn test_chevrons_at_left_edge() {
        let m = ScrollMetrics::new(0, 300, 1000);
        assert!(!m.left_chevron());
        assert!(m.right_chevron());
    }

    #[test]
    fn test_chevrons_at_right_edge() {
        // 700 + 300 = 1000 >= 1000 - 10: right chevron hidden
        let m = ScrollMetrics::new(700, 300, 1000);
        assert!(m.left_chevron());
        assert!(!m.right_chevron());
    }

    #[test]
    fn test_chevrons_hidden_without_overflow() {
        let m = ScrollMetrics::new(0, 300, 200);
        assert!(!m.overflows());
        assert!(!m.left_chevron());
        assert!(!m.right_chevron());
    }

    #[test]
    fn test_paging_clamps_at_bounds() {
        let mut m = ScrollMetrics::new(0, 300, 1000);
        m.page_right();
        assert_eq!(m.offset, 300);
        m.page_right();
        m.page_right();
        assert_eq!(m.offset, 700); // clamped at max_offset
        m.page_left();
        m.page_left();
        m.page_left();
        assert_eq!(m.offset, 0);
    }

    #[test]
    fn test_reattach_is_idempotent_and_clamps() {
        let mut m = ScrollMetrics::new(700, 300, 1000);
        m.reattach(300, 400); // content shrank under the offset
        assert_eq!(m.offset, 100);
        let snapshot = m;
        m.reattach(300, 400);
        assert_eq!(m, snapshot);
    }

    #[test]
    fn test_scroll_into_view() {
        let mut m = ScrollMetrics::new(0, 100, 500);
        m.scroll_into_view(180, 40); // beyond right edge
        assert_eq!(m.offset, 120);
        m.scroll_into_view(50, 40); // before left edge
        assert_eq!(m.offset, 50);
        let unchanged = m;
        m.scroll_into_view(60, 40); // already visible
        assert_eq!(m, unchanged);
    }

    #[test]
    fn test_carousel_selection_follows_scroll() {
        let mut c = CarouselState::default();
        c.reattach(96, 10, 32); // 3 cards visible of 10
        c.select_next(10, 32);
        c.select_next(10, 32);
        c.select_next(10, 32); // card 3 starts at 96, outside the viewport
        assert_eq!(c.selected, 3);
        assert_eq!(c.metrics.offset, 32);
        c.select_prev(32);
        c.select_prev(32);
        c.select_prev(32);
        assert_eq!(c.selected, 0);
        assert_eq!(c.metrics.offset, 0);
    }

    #[test]
    fn test_carousel_reattach_clamps_selection() {
        let mut c = CarouselState {
            metrics: ScrollMetrics::new(64, 96, 320),
            selected: 9,
        };
        c.reattach(96, 4, 32);
        assert_eq!(c.selected, 3);
        c.reattach(96, 0, 32);
        assert_eq!(c.selected, 0);
        assert_eq!(c.metrics.offset, 0);
    }

    #[test]
    fn test_slow_long_drag_is_a_swipe() {
        let now = Instant::now();
        let mut drag = DragTracker::begin_at(100, 10, now);
        drag.update(40, 12);
        let drag = drag.with_elapsed(Duration::from_millis(800), now);
        assert_eq!(drag.release_at(now), SwipeOutcome::Next);
    }

    #[test]
    fn test_fast_short_flick_is_a_swipe() {
        let now = Instant::now();
        let mut drag = DragTracker::begin_at(10, 10, now);
        drag.update(25, 10); // 15 cells in 20ms: 0.75 cells/ms
        let drag = drag.with_elapsed(Duration::from_millis(20), now);
        assert_eq!(drag.release_at(now), SwipeOutcome::Prev);
    }

    #[test]
    fn test_short_slow_drag_springs_back() {
        let now = Instant::now();
        let mut drag = DragTracker::begin_at(10, 10, now);
        drag.update(30, 10); // 20 cells over a full second
        let drag = drag.with_elapsed(Duration::from_secs(1), now);
        assert_eq!(drag.release_at(now), SwipeOutcome::None);
    }

    #[test]
    fn test_vertical_drag_aborts_horizontal_handling() {
        let now = Instant::now();
        let mut drag = DragTracker::begin_at(50, 5, now);
        // |Δy| > |Δx|: committed to vertical
        assert_eq!(drag.update(52, 15), Some(DragAxis::Vertical));
        // Even a later large horizontal move cannot turn it into a swipe
        drag.update(150, 15);
        let drag = drag.with_elapsed(Duration::from_millis(50), now);
        assert_eq!(drag.release_at(now), SwipeOutcome::None);
    }

    #[test]
    fn test_axis_commits_once() {
        let now = Instant::now();
        let mut drag = DragTracker::begin_at(0, 0, now);
        assert_eq!(drag.update(1, 1), None); // below commit threshold
        assert_eq!(drag.update(6, 1), Some(DragAxis::Horizontal));
        assert_eq!(drag.update(6, 40), Some(DragAxis::Horizontal)); // stays committed
    }
}
