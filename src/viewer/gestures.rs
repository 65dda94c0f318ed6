//! Transient gesture bookkeeping between a press and its release.

use super::zoom::ZoomState;

/// A position in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One active contact point, as reported by the host's touch events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    pub id: u64,
    pub position: Point,
}

impl Touch {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

/// What is driving a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    Pointer,
    Touch(u64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureSession {
    /// Pan: translation = pointer position - anchor.
    Drag { source: DragSource, anchor: Point },
    /// Two-touch zoom tracking the distance between a fixed pair of touches.
    Pinch { ids: (u64, u64), last_distance: f64 },
}

impl GestureSession {
    /// Start a drag so the current translation is preserved at `position`.
    pub fn drag(source: DragSource, position: Point, zoom: &ZoomState) -> Self {
        Self::Drag {
            source,
            anchor: Point::new(
                position.x - zoom.translate_x,
                position.y - zoom.translate_y,
            ),
        }
    }

    /// Start a pinch on the two lowest-id touches, if there are two.
    pub fn pinch(touches: &[Touch]) -> Option<Self> {
        let (a, b) = lowest_pair(touches)?;
        Some(Self::Pinch {
            ids: (a.id, b.id),
            last_distance: a.position.distance_to(&b.position),
        })
    }

    pub fn is_pinch(&self) -> bool {
        matches!(self, Self::Pinch { .. })
    }

    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            Self::Pinch { .. }
                | Self::Drag {
                    source: DragSource::Touch(_),
                    ..
                }
        )
    }
}

/// The touch that carries on when a multi-touch gesture loses contacts:
/// the one with the lowest identifier.
pub fn surviving_touch(touches: &[Touch]) -> Option<Touch> {
    touches.iter().min_by_key(|t| t.id).copied()
}

/// The two touches with the lowest identifiers, ordered by id.
pub fn lowest_pair(touches: &[Touch]) -> Option<(Touch, Touch)> {
    let mut sorted: Vec<Touch> = touches.to_vec();
    sorted.sort_by_key(|t| t.id);
    match sorted.as_slice() {
        [a, b, ..] => Some((*a, *b)),
        _ => None,
    }
}

pub fn find_touch(touches: &[Touch], id: u64) -> Option<Touch> {
    touches.iter().find(|t| t.id == id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_anchor_preserves_translation() {
        let zoom = ZoomState::IDENTITY.translated_to(30.0, 40.0);
        let session = GestureSession::drag(DragSource::Pointer, Point::new(100.0, 100.0), &zoom);
        assert_eq!(
            session,
            GestureSession::Drag {
                source: DragSource::Pointer,
                anchor: Point::new(70.0, 60.0),
            }
        );
    }

    #[test]
    fn test_pinch_uses_lowest_ids() {
        let touches = [
            Touch::new(9, 0.0, 0.0),
            Touch::new(2, 0.0, 0.0),
            Touch::new(5, 3.0, 4.0),
        ];
        let Some(GestureSession::Pinch { ids, last_distance }) = GestureSession::pinch(&touches)
        else {
            panic!("expected pinch");
        };
        assert_eq!(ids, (2, 5));
        assert_eq!(last_distance, 5.0);
        assert!(GestureSession::pinch(&touches[..1]).is_none());
    }

    #[test]
    fn test_surviving_touch_is_lowest_id() {
        let touches = [Touch::new(7, 1.0, 1.0), Touch::new(3, 2.0, 2.0)];
        assert_eq!(surviving_touch(&touches).map(|t| t.id), Some(3));
        assert!(surviving_touch(&[]).is_none());
    }
}
