use std::ops::Range;

/// The contiguous slice of items a grid must materialize.
///
/// Always satisfies `start_index <= end_index <= item_count` for the item count
/// it was computed with. Items outside the range are represented by spacer
/// height only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewWindow {
    pub start_index: usize,
    pub end_index: usize,
    pub row_height: f64,
    pub columns_per_row: usize,
}

impl ViewWindow {
    pub fn empty(row_height: f64, columns_per_row: usize) -> Self {
        Self {
            start_index: 0,
            end_index: 0,
            row_height,
            columns_per_row,
        }
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }

    pub fn range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    /// First row touched by the window.
    pub fn start_row(&self) -> usize {
        if self.columns_per_row == 0 {
            0
        } else {
            self.start_index / self.columns_per_row
        }
    }

    /// Row just past the last one touched by the window.
    pub fn end_row(&self) -> usize {
        if self.columns_per_row == 0 {
            0
        } else {
            self.end_index.div_ceil(self.columns_per_row)
        }
    }

    /// Borrow the materialized part of `items`.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end_index.min(items.len());
        let start = self.start_index.min(end);
        &items[start..end]
    }
}
