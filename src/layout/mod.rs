pub mod window;

pub use window::{compute_window, row_count, visible_row_span, WindowedList, OVERSCAN_ROWS};
