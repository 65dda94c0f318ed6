//! Focused single-image view: zoom, pan and pinch handling.

pub mod controller;
pub mod gestures;
pub mod keybindings;
pub mod zoom;

pub use controller::{InputEvent, Response, ZoomController};
pub use gestures::{DragSource, GestureSession, Point, Touch};
pub use keybindings::{Key, TriageAction, ViewerAction};
pub use zoom::{ScaleRange, ZoomConfig, ZoomState};
