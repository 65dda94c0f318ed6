//! Focused-view zoom/pan controller.
//!
//! Holds the `ZoomState` and `GestureSession` for one focused image and turns
//! wheel, pointer, touch, double-activation and key events into transform
//! updates. All handlers are synchronous; events arriving while the view is
//! closed are ignored.

use tracing::{debug, trace};

use super::gestures::{
    find_touch, lowest_pair, surviving_touch, DragSource, GestureSession, Point, Touch,
};
use super::keybindings::{Key, ViewerAction};
use super::zoom::{ZoomConfig, ZoomState};

/// Raw input delivered by the host toolkit.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Vertical wheel delta; positive scrolls down (zooms out).
    Wheel { delta_y: f64 },
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    /// All touches active after the start.
    TouchStart(Vec<Touch>),
    /// All touches active in this frame.
    TouchMove(Vec<Touch>),
    /// Touches still active after the end.
    TouchEnd(Vec<Touch>),
    DoubleActivate,
    Key(Key),
}

/// What an event did to the focused view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    /// Not applicable (view closed or event unbound).
    Ignored,
    /// Handled; carries the resulting transform.
    Updated(ZoomState),
    /// The focused view was closed.
    Closed,
}

#[derive(Debug, Clone)]
struct FocusedView {
    key: String,
    zoom: ZoomState,
    gesture: Option<GestureSession>,
}

#[derive(Debug, Clone, Default)]
pub struct ZoomController {
    config: ZoomConfig,
    focus: Option<FocusedView>,
}

impl ZoomController {
    pub fn new(config: ZoomConfig) -> Self {
        Self {
            config,
            focus: None,
        }
    }

    pub fn config(&self) -> &ZoomConfig {
        &self.config
    }

    /// Open the focused view for `key`, always starting from identity.
    pub fn open(&mut self, key: impl Into<String>) {
        let key = key.into();
        debug!(key = %key, "Opened focused view");
        self.focus = Some(FocusedView {
            key,
            zoom: ZoomState::IDENTITY,
            gesture: None,
        });
    }

    /// Close the focused view, discarding its transform and any gesture.
    pub fn close(&mut self) {
        if let Some(view) = self.focus.take() {
            debug!(key = %view.key, "Closed focused view");
        }
    }

    pub fn is_open(&self) -> bool {
        self.focus.is_some()
    }

    /// Key of the image currently focused.
    pub fn focused_key(&self) -> Option<&str> {
        self.focus.as_ref().map(|v| v.key.as_str())
    }

    /// Current transform, if the focused view is open.
    pub fn state(&self) -> Option<ZoomState> {
        self.focus.as_ref().map(|v| v.zoom)
    }

    pub fn gesture(&self) -> Option<&GestureSession> {
        self.focus.as_ref().and_then(|v| v.gesture.as_ref())
    }

    /// Route one input event to the matching handler.
    pub fn handle(&mut self, event: &InputEvent) -> Response {
        match event {
            InputEvent::Wheel { delta_y } => self.on_wheel(*delta_y),
            InputEvent::PointerDown(p) => self.on_pointer_down(*p),
            InputEvent::PointerMove(p) => self.on_pointer_move(*p),
            InputEvent::PointerUp => self.on_pointer_up(),
            InputEvent::TouchStart(touches) => self.on_touch_start(touches),
            InputEvent::TouchMove(touches) => self.on_touch_move(touches),
            InputEvent::TouchEnd(touches) => self.on_touch_end(touches),
            InputEvent::DoubleActivate => self.on_double_activate(),
            InputEvent::Key(key) => self.on_key(*key),
        }
    }

    pub fn reset(&mut self) -> Response {
        self.update(|view, _| {
            view.zoom = ZoomState::IDENTITY;
        })
    }

    /// Step zoom for a wheel notch. A zero delta is ignored.
    pub fn on_wheel(&mut self, delta_y: f64) -> Response {
        if delta_y == 0.0 || delta_y.is_nan() {
            return self.current();
        }
        self.update(|view, config| {
            let factor = if delta_y > 0.0 {
                config.wheel_out_factor
            } else {
                config.wheel_in_factor
            };
            view.zoom = view.zoom.zoomed_by(factor, &config.range);
        })
    }

    pub fn on_pointer_down(&mut self, position: Point) -> Response {
        self.update(|view, _| {
            // An active touch gesture owns the view; synthesized pointer events are ignored.
            if view.gesture.is_some_and(|g| g.is_touch()) {
                return;
            }
            view.gesture = Some(GestureSession::drag(DragSource::Pointer, position, &view.zoom));
        })
    }

    pub fn on_pointer_move(&mut self, position: Point) -> Response {
        self.update(|view, _| {
            if let Some(GestureSession::Drag {
                source: DragSource::Pointer,
                anchor,
            }) = view.gesture
            {
                view.zoom = view
                    .zoom
                    .translated_to(position.x - anchor.x, position.y - anchor.y);
            }
        })
    }

    pub fn on_pointer_up(&mut self) -> Response {
        self.update(|view, _| {
            if matches!(
                view.gesture,
                Some(GestureSession::Drag {
                    source: DragSource::Pointer,
                    ..
                })
            ) {
                view.gesture = None;
            }
        })
    }

    pub fn on_touch_start(&mut self, touches: &[Touch]) -> Response {
        self.update(|view, _| {
            if let Some(pinch) = GestureSession::pinch(touches) {
                let restart = match view.gesture {
                    Some(GestureSession::Pinch { ids, .. }) => {
                        find_touch(touches, ids.0).is_none() || find_touch(touches, ids.1).is_none()
                    }
                    _ => true,
                };
                if restart {
                    trace!(?pinch, "Pinch started");
                    view.gesture = Some(pinch);
                }
            } else if let Some(touch) = surviving_touch(touches) {
                if !view.gesture.is_some_and(|g| g.is_pinch()) {
                    view.gesture = Some(GestureSession::drag(
                        DragSource::Touch(touch.id),
                        touch.position,
                        &view.zoom,
                    ));
                }
            }
        })
    }

    pub fn on_touch_move(&mut self, touches: &[Touch]) -> Response {
        self.update(|view, config| match view.gesture {
            Some(GestureSession::Pinch { ids, last_distance }) => {
                // Frames missing either pinch touch are ignored until the touch ends.
                let (Some(a), Some(b)) = (find_touch(touches, ids.0), find_touch(touches, ids.1))
                else {
                    return;
                };
                let distance = a.position.distance_to(&b.position);
                if last_distance > f64::EPSILON {
                    view.zoom = view.zoom.zoomed_by(distance / last_distance, &config.range);
                }
                view.gesture = Some(GestureSession::Pinch {
                    ids,
                    last_distance: distance,
                });
            }
            Some(GestureSession::Drag {
                source: DragSource::Touch(id),
                anchor,
            }) => {
                if touches.len() >= 2 {
                    // A second finger landed without a start event.
                    view.gesture = GestureSession::pinch(touches);
                } else if let Some(touch) = find_touch(touches, id) {
                    view.zoom = view.zoom.translated_to(
                        touch.position.x - anchor.x,
                        touch.position.y - anchor.y,
                    );
                }
            }
            _ => {}
        })
    }

    /// `remaining` lists the touches still down after the end event.
    pub fn on_touch_end(&mut self, remaining: &[Touch]) -> Response {
        self.update(|view, _| {
            let still_down = |id: u64| find_touch(remaining, id).is_some();
            let next = match view.gesture {
                Some(GestureSession::Pinch { ids, .. })
                    if still_down(ids.0) && still_down(ids.1) =>
                {
                    view.gesture
                }
                Some(GestureSession::Pinch { .. }) => {
                    if lowest_pair(remaining).is_some() {
                        GestureSession::pinch(remaining)
                    } else {
                        surviving_touch(remaining).map(|t| {
                            GestureSession::drag(DragSource::Touch(t.id), t.position, &view.zoom)
                        })
                    }
                }
                Some(GestureSession::Drag {
                    source: DragSource::Touch(id),
                    ..
                }) if !still_down(id) => surviving_touch(remaining)
                    .map(|t| GestureSession::drag(DragSource::Touch(t.id), t.position, &view.zoom)),
                other => other,
            };
            if next != view.gesture {
                trace!(from = ?view.gesture, to = ?next, "Touch gesture changed");
            }
            view.gesture = next;
        })
    }

    /// Toggle between identity and the fixed double-activation zoom.
    pub fn on_double_activate(&mut self) -> Response {
        self.update(|view, config| {
            view.zoom = if view.zoom.is_zoomed_in() {
                ZoomState::IDENTITY
            } else {
                ZoomState::centered_at(config.double_activate_scale, &config.range)
            };
        })
    }

    pub fn on_key(&mut self, key: Key) -> Response {
        if !self.is_open() {
            return Response::Ignored;
        }
        match ViewerAction::for_key(key) {
            Some(ViewerAction::ZoomIn) => self.update(|view, config| {
                view.zoom = view.zoom.zoomed_by(config.key_in_factor, &config.range);
            }),
            Some(ViewerAction::ZoomOut) => self.update(|view, config| {
                view.zoom = view.zoom.zoomed_by(config.key_out_factor, &config.range);
            }),
            Some(ViewerAction::Reset) => self.reset(),
            Some(ViewerAction::Close) => {
                self.close();
                Response::Closed
            }
            None => Response::Ignored,
        }
    }

    fn current(&self) -> Response {
        match self.state() {
            Some(zoom) => Response::Updated(zoom),
            None => Response::Ignored,
        }
    }

    fn update<F>(&mut self, apply: F) -> Response
    where
        F: FnOnce(&mut FocusedView, &ZoomConfig),
    {
        let Some(view) = self.focus.as_mut() else {
            return Response::Ignored;
        };
        apply(view, &self.config);
        debug_assert!(self.config.range.contains(view.zoom.scale));
        Response::Updated(view.zoom)
    }
}
