use tracing::trace;

use crate::models::ViewWindow;

/// Rows rendered beyond each edge of the viewport to hide pop-in while scrolling.
pub const OVERSCAN_ROWS: usize = 1;

/// Sanitize a pixel measurement: NaN and negatives collapse to zero.
fn non_negative(px: f64) -> f64 {
    if px.is_finite() {
        px.max(0.0)
    } else if px == f64::INFINITY {
        f64::MAX
    } else {
        0.0
    }
}

fn valid_row_height(row_height: f64) -> Option<f64> {
    (row_height.is_finite() && row_height > 0.0).then_some(row_height)
}

/// Number of rows needed to lay out `item_count` items.
pub fn row_count(item_count: usize, columns_per_row: usize) -> usize {
    if columns_per_row == 0 {
        0
    } else {
        item_count.div_ceil(columns_per_row)
    }
}

/// Rows materialized for a viewport: the visible rows plus overscan on both edges.
pub fn visible_row_span(viewport_height: f64, row_height: f64) -> usize {
    match valid_row_height(row_height) {
        Some(row_height) => {
            ((non_negative(viewport_height) / row_height).ceil() as usize)
                .saturating_add(2 * OVERSCAN_ROWS)
        }
        None => 0,
    }
}

/// Computes the window of items to materialize for a fixed-row-height grid.
///
/// # Arguments
/// * `item_count` - Total number of items in the list
/// * `viewport_height` - Visible height in pixels
/// * `scroll_offset` - Current vertical scroll position in pixels
/// * `row_height` - Height of every row in pixels
/// * `columns_per_row` - Items per row, supplied by the caller from the available width
///
/// # Returns
/// A `ViewWindow` with `start_index <= end_index <= item_count`. Malformed input
/// (zero columns, non-positive or NaN row height) yields an empty window.
pub fn compute_window(
    item_count: usize,
    viewport_height: f64,
    scroll_offset: f64,
    row_height: f64,
    columns_per_row: usize,
) -> ViewWindow {
    let Some(row_height) = valid_row_height(row_height) else {
        return ViewWindow::empty(0.0, columns_per_row);
    };
    if item_count == 0 || columns_per_row == 0 {
        return ViewWindow::empty(row_height, columns_per_row);
    }

    let first_visible_row = (non_negative(scroll_offset) / row_height).floor() as usize;
    let start_row = first_visible_row.saturating_sub(OVERSCAN_ROWS);
    let span = visible_row_span(viewport_height, row_height);

    let start_index = start_row.saturating_mul(columns_per_row).min(item_count);
    let end_index = start_row
        .saturating_add(span)
        .saturating_mul(columns_per_row)
        .min(item_count);

    ViewWindow {
        start_index,
        end_index,
        row_height,
        columns_per_row,
    }
}

/// Scroll state for a virtualized grid with uniform row height.
///
/// Owns only geometry; the item list itself stays with the caller, which
/// materializes `window().slice(items)` and reserves `top_spacer()` /
/// `bottom_spacer()` pixels for everything else.
#[derive(Debug, Clone)]
pub struct WindowedList {
    item_count: usize,
    viewport_height: f64,
    scroll_offset: f64,
    row_height: f64,
    columns_per_row: usize,
}

impl WindowedList {
    pub fn new(row_height: f64, columns_per_row: usize) -> Self {
        Self {
            item_count: 0,
            viewport_height: 0.0,
            scroll_offset: 0.0,
            row_height,
            columns_per_row,
        }
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    pub fn columns_per_row(&self) -> usize {
        self.columns_per_row
    }

    pub fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
        self.clamp_scroll();
    }

    pub fn set_viewport_height(&mut self, viewport_height: f64) {
        self.viewport_height = non_negative(viewport_height);
        self.clamp_scroll();
    }

    pub fn set_row_height(&mut self, row_height: f64) {
        self.row_height = row_height;
        self.clamp_scroll();
    }

    pub fn set_columns_per_row(&mut self, columns_per_row: usize) {
        self.columns_per_row = columns_per_row;
        self.clamp_scroll();
    }

    /// Apply a scroll position reported by the host, clamped to the scrollable range.
    pub fn set_scroll_offset(&mut self, scroll_offset: f64) {
        self.scroll_offset = non_negative(scroll_offset);
        self.clamp_scroll();
    }

    /// Total scrollable extent in pixels.
    pub fn content_height(&self) -> f64 {
        match valid_row_height(self.row_height) {
            Some(row_height) => {
                row_count(self.item_count, self.columns_per_row) as f64 * row_height
            }
            None => 0.0,
        }
    }

    pub fn max_scroll_offset(&self) -> f64 {
        (self.content_height() - self.viewport_height).max(0.0)
    }

    /// The window for the current scroll state.
    pub fn window(&self) -> ViewWindow {
        compute_window(
            self.item_count,
            self.viewport_height,
            self.scroll_offset,
            self.row_height,
            self.columns_per_row,
        )
    }

    /// Reserved space above the materialized rows.
    pub fn top_spacer(&self) -> f64 {
        let window = self.window();
        window.start_row() as f64 * window.row_height
    }

    /// Reserved space below the materialized rows.
    pub fn bottom_spacer(&self) -> f64 {
        let window = self.window();
        (self.content_height() - window.end_row() as f64 * window.row_height).max(0.0)
    }

    /// Scroll the minimum amount needed to bring `index` fully into view.
    ///
    /// A row above the viewport is placed one row below the top edge; a row
    /// below the viewport is aligned to the bottom edge. Returns true if the
    /// scroll offset changed. Out-of-range indices are ignored.
    pub fn scroll_to_index(&mut self, index: usize) -> bool {
        let Some(row_height) = valid_row_height(self.row_height) else {
            return false;
        };
        if index >= self.item_count || self.columns_per_row == 0 {
            return false;
        }

        let row = index / self.columns_per_row;
        let row_top = row as f64 * row_height;
        let row_bottom = row_top + row_height;
        let viewport_bottom = self.scroll_offset + self.viewport_height;

        let target = if row_top < self.scroll_offset {
            row_top - row_height
        } else if row_bottom > viewport_bottom {
            row_bottom - self.viewport_height
        } else {
            return false;
        };

        let previous = self.scroll_offset;
        self.scroll_offset = target.clamp(0.0, self.max_scroll_offset());
        trace!(
            index,
            row,
            from = previous,
            to = self.scroll_offset,
            "Scrolled to keep index in view"
        );
        (self.scroll_offset - previous).abs() > f64::EPSILON
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.clamp(0.0, self.max_scroll_offset());
    }
}
