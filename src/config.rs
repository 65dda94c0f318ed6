//! Viewer configuration with environment overrides.
//!
//! Every value has a built-in default; `TRIAGE_*` variables override them.
//! Values that fail to parse, or are zero, fall back to the default.

use crate::library::ScanConfig;
use crate::preload::{DEFAULT_MAX_CONCURRENT, DEFAULT_PRELOAD_MB};
use crate::viewer::ZoomConfig;

/// Grid row height in pixels
pub const DEFAULT_ROW_HEIGHT: f64 = 200.0;
/// Narrowest tile before the grid drops a column
pub const DEFAULT_MIN_TILE_WIDTH: f64 = 200.0;
pub const DEFAULT_LOOKAHEAD_AHEAD: usize = 1;
pub const DEFAULT_LOOKAHEAD_BEHIND: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadConfig {
    /// Maximum loads in flight at once.
    pub max_concurrent: usize,
    /// Items after the selection to warm.
    pub lookahead_ahead: usize,
    /// Items before the selection to warm.
    pub lookahead_behind: usize,
    /// Memory budget for warm source bytes, in megabytes.
    pub warm_budget_mb: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            lookahead_ahead: DEFAULT_LOOKAHEAD_AHEAD,
            lookahead_behind: DEFAULT_LOOKAHEAD_BEHIND,
            warm_budget_mb: DEFAULT_PRELOAD_MB,
        }
    }
}

impl PreloadConfig {
    pub fn warm_budget_bytes(&self) -> usize {
        self.warm_budget_mb.saturating_mul(1024 * 1024)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    pub row_height: f64,
    pub min_tile_width: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            min_tile_width: DEFAULT_MIN_TILE_WIDTH,
        }
    }
}

impl GridConfig {
    /// Columns that fit in `width`, never fewer than one.
    pub fn columns_for_width(&self, width: f64) -> usize {
        if !width.is_finite() || width <= 0.0 || self.min_tile_width <= 0.0 {
            return 1;
        }
        ((width / self.min_tile_width).floor() as usize).max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerConfig {
    pub preload: PreloadConfig,
    pub grid: GridConfig,
    pub zoom: ZoomConfig,
    pub scan: ScanConfig,
}

fn parse_positive<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}

fn parse_flag(value: Option<String>) -> Option<bool> {
    value.map(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

impl ViewerConfig {
    /// Defaults overridden by `TRIAGE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_positive(lookup("TRIAGE_PRELOAD_CONCURRENCY")) {
            config.preload.max_concurrent = v;
        }
        if let Some(v) = parse_positive(lookup("TRIAGE_LOOKAHEAD_AHEAD")) {
            config.preload.lookahead_ahead = v;
        }
        if let Some(v) = parse_positive(lookup("TRIAGE_LOOKAHEAD_BEHIND")) {
            config.preload.lookahead_behind = v;
        }
        if let Some(v) = parse_positive(lookup("TRIAGE_PRELOAD_MB")) {
            config.preload.warm_budget_mb = v;
        }
        if let Some(v) =
            parse_positive::<f64>(lookup("TRIAGE_ROW_HEIGHT")).filter(|v| v.is_finite())
        {
            config.grid.row_height = v;
        }
        if let Some(v) =
            parse_positive::<f64>(lookup("TRIAGE_MIN_TILE_WIDTH")).filter(|v| v.is_finite())
        {
            config.grid.min_tile_width = v;
        }
        if let Some(v) = parse_flag(lookup("TRIAGE_RECURSIVE")) {
            config.scan.recursive = v;
        }
        if let Some(v) = parse_flag(lookup("TRIAGE_FOLLOW_SYMLINKS")) {
            config.scan.follow_symlinks = v;
        }
        if let Some(v) = parse_positive(lookup("TRIAGE_MAX_DEPTH")) {
            config.scan.max_depth = v;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ViewerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ViewerConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.preload.max_concurrent, 3);
        assert_eq!(config.preload.lookahead_ahead, 1);
        assert_eq!(config.preload.lookahead_behind, 1);
        assert_eq!(config.preload.warm_budget_bytes(), 256 * 1024 * 1024);
        assert!(!config.scan.recursive);
        assert_eq!(config.scan.max_depth, 3);
        assert_eq!(config.zoom, ZoomConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("TRIAGE_PRELOAD_CONCURRENCY", "6"),
            ("TRIAGE_LOOKAHEAD_AHEAD", " 4 "),
            ("TRIAGE_ROW_HEIGHT", "120.5"),
            ("TRIAGE_RECURSIVE", "Yes"),
            ("TRIAGE_MAX_DEPTH", "5"),
            ("TRIAGE_PRELOAD_MB", "64"),
            ("TRIAGE_FOLLOW_SYMLINKS", "on"),
        ]);
        assert_eq!(config.preload.max_concurrent, 6);
        assert_eq!(config.preload.lookahead_ahead, 4);
        assert_eq!(config.preload.lookahead_behind, 1);
        assert_eq!(config.grid.row_height, 120.5);
        assert!(config.scan.recursive);
        assert_eq!(config.scan.max_depth, 5);
        assert_eq!(config.preload.warm_budget_mb, 64);
        assert!(config.scan.follow_symlinks);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = config_from(&[
            ("TRIAGE_PRELOAD_CONCURRENCY", "0"),
            ("TRIAGE_LOOKAHEAD_BEHIND", "-2"),
            ("TRIAGE_ROW_HEIGHT", "NaN"),
            ("TRIAGE_MIN_TILE_WIDTH", "wide"),
            ("TRIAGE_MAX_DEPTH", ""),
            ("TRIAGE_PRELOAD_MB", "0"),
        ]);
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_columns_for_width() {
        let grid = GridConfig::default();
        assert_eq!(grid.columns_for_width(1000.0), 5);
        assert_eq!(grid.columns_for_width(399.0), 1);
        assert_eq!(grid.columns_for_width(50.0), 1);
        assert_eq!(grid.columns_for_width(f64::NAN), 1);
    }
}
