// Keybindings for the triage viewer
// Maps host key names onto focused-view and triage actions
//
// Focused view:
// - + / =: Zoom in
// - -: Zoom out
// - 0: Reset zoom
// - Escape: Close focused view
//
// Grid / triage:
// - ArrowRight / ArrowLeft: Next / previous photo
// - Enter: Open focused view
// - j / k / x: Move to Landscape / Portrait / Reject
// - s: Skip
// - z: Undo last move

use crate::session::Bucket;

/// A key press, normalized from the host's key name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Other,
}

impl Key {
    /// Parse a key name ("Escape", "ArrowLeft", "+", "j", ...).
    ///
    /// Single characters are lowercased so shifted letters bind the same way.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Self::Escape,
            "Enter" | "Return" => Self::Enter,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c.to_ascii_lowercase()),
                    _ => Self::Other,
                }
            }
        }
    }
}

/// Actions available while the focused view is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerAction {
    ZoomIn,
    ZoomOut,
    Reset,
    Close,
}

impl ViewerAction {
    pub fn for_key(key: Key) -> Option<Self> {
        match key {
            Key::Char('+') | Key::Char('=') => Some(Self::ZoomIn),
            Key::Char('-') => Some(Self::ZoomOut),
            Key::Char('0') => Some(Self::Reset),
            Key::Escape => Some(Self::Close),
            _ => None,
        }
    }
}

/// Actions available from the grid, outside the focused view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageAction {
    Next,
    Previous,
    Skip,
    MoveTo(Bucket),
    Undo,
    OpenFocus,
}

impl TriageAction {
    pub fn for_key(key: Key) -> Option<Self> {
        match key {
            Key::ArrowRight => Some(Self::Next),
            Key::ArrowLeft => Some(Self::Previous),
            Key::Enter => Some(Self::OpenFocus),
            Key::Char('s') => Some(Self::Skip),
            Key::Char('j') => Some(Self::MoveTo(Bucket::Landscape)),
            Key::Char('k') => Some(Self::MoveTo(Bucket::Portrait)),
            Key::Char('x') => Some(Self::MoveTo(Bucket::Reject)),
            Key::Char('z') => Some(Self::Undo),
            _ => None,
        }
    }
}
