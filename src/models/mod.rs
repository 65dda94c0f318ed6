pub mod media_item;
pub mod view_window;

pub use media_item::*;
pub use view_window::*;
