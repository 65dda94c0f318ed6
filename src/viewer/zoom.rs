//! Zoom transform for the focused view and the central scale guard.
//!
//! Every transition that changes scale goes through `ScaleRange::clamp`, so a
//! `ZoomState` produced here is always within range.

/// Minimum zoom scale allowed
pub const MIN_SCALE: f64 = 0.5;
/// Maximum zoom scale allowed
pub const MAX_SCALE: f64 = 10.0;
/// Wheel step when scrolling down (zoom out)
pub const WHEEL_OUT_FACTOR: f64 = 0.9;
/// Wheel step when scrolling up (zoom in)
pub const WHEEL_IN_FACTOR: f64 = 1.1;
/// Keyboard `+` / `=` step
pub const KEY_IN_FACTOR: f64 = 1.3;
/// Keyboard `-` step
pub const KEY_OUT_FACTOR: f64 = 0.7;
/// Scale reached by a double click / double tap from the unzoomed state
pub const DOUBLE_ACTIVATE_SCALE: f64 = 2.5;

/// Inclusive bounds on zoom scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    min: f64,
    max: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self {
            min: MIN_SCALE,
            max: MAX_SCALE,
        }
    }
}

impl ScaleRange {
    /// Build a range, falling back to the defaults for unusable bounds.
    pub fn new(min: f64, max: f64) -> Self {
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(min) || !usable(max) {
            return Self::default();
        }
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, scale: f64) -> f64 {
        if scale.is_nan() {
            1.0f64.clamp(self.min, self.max)
        } else {
            scale.clamp(self.min, self.max)
        }
    }

    pub fn contains(&self, scale: f64) -> bool {
        scale >= self.min && scale <= self.max
    }
}

/// Tunables for the zoom controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomConfig {
    pub range: ScaleRange,
    pub wheel_in_factor: f64,
    pub wheel_out_factor: f64,
    pub key_in_factor: f64,
    pub key_out_factor: f64,
    pub double_activate_scale: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            range: ScaleRange::default(),
            wheel_in_factor: WHEEL_IN_FACTOR,
            wheel_out_factor: WHEEL_OUT_FACTOR,
            key_in_factor: KEY_IN_FACTOR,
            key_out_factor: KEY_OUT_FACTOR,
            double_activate_scale: DOUBLE_ACTIVATE_SCALE,
        }
    }
}

/// Scale and translation of the focused image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomState {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    /// Multiply scale by `factor`, clamped to `range`. Translation is kept.
    ///
    /// Non-finite or non-positive factors leave the state unchanged.
    pub fn zoomed_by(self, factor: f64, range: &ScaleRange) -> Self {
        if !factor.is_finite() || factor <= 0.0 {
            return self;
        }
        Self {
            scale: range.clamp(self.scale * factor),
            ..self
        }
    }

    /// Jump to an absolute scale with no translation.
    pub fn centered_at(scale: f64, range: &ScaleRange) -> Self {
        Self {
            scale: range.clamp(scale),
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }

    pub fn translated_to(self, x: f64, y: f64) -> Self {
        Self {
            translate_x: x,
            translate_y: y,
            ..self
        }
    }

    pub fn is_zoomed_in(&self) -> bool {
        self.scale > 1.0
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Zoom as a whole percentage for display ("250%").
    pub fn percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds() {
        let range = ScaleRange::default();
        assert_eq!(range.clamp(0.1), MIN_SCALE);
        assert_eq!(range.clamp(40.0), MAX_SCALE);
        assert_eq!(range.clamp(f64::INFINITY), MAX_SCALE);
        assert_eq!(range.clamp(f64::NAN), 1.0);
        assert_eq!(range.clamp(3.0), 3.0);
    }

    #[test]
    fn test_range_sanitizes_bounds() {
        let swapped = ScaleRange::new(8.0, 2.0);
        assert_eq!((swapped.min(), swapped.max()), (2.0, 8.0));
        assert_eq!(ScaleRange::new(-1.0, 5.0), ScaleRange::default());
        assert_eq!(ScaleRange::new(0.5, f64::NAN), ScaleRange::default());
    }

    #[test]
    fn test_zoomed_by_keeps_translation() {
        let range = ScaleRange::default();
        let state = ZoomState::IDENTITY.translated_to(12.0, -4.0);
        let zoomed = state.zoomed_by(2.0, &range);
        assert_eq!(zoomed.scale, 2.0);
        assert_eq!((zoomed.translate_x, zoomed.translate_y), (12.0, -4.0));
    }

    #[test]
    fn test_bad_factor_is_ignored() {
        let range = ScaleRange::default();
        let state = ZoomState::IDENTITY;
        assert_eq!(state.zoomed_by(f64::NAN, &range), state);
        assert_eq!(state.zoomed_by(0.0, &range), state);
        assert_eq!(state.zoomed_by(-2.0, &range), state);
    }

    #[test]
    fn test_percent() {
        let range = ScaleRange::default();
        assert_eq!(ZoomState::centered_at(2.5, &range).percent(), 250);
        assert!(ZoomState::default().is_identity());
    }
}
