//! File details shown in the triage info panel.
//!
//! Size and timestamp come from the filesystem, dimensions from the image
//! header, camera settings from EXIF when the container carries it.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::time::SystemTime;

use exif::{In, Tag};
use tracing::{debug, trace};

use crate::library::scanner::read_dimensions;
use crate::models::Orientation;

/// Size, dimensions and timestamp of one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub size_bytes: u64,
    /// Human-readable size ("1.50 MB").
    pub size: String,
    /// Header dimensions, when the header is readable.
    pub dimensions: Option<(u32, u32)>,
    pub orientation: Option<Orientation>,
    pub modified: Option<SystemTime>,
    /// Camera settings, when the file has EXIF data.
    pub exif: Option<ExifSummary>,
}

/// Camera settings as display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifSummary {
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens: Option<String>,
    pub focal_length: Option<String>,
    /// "f/2.8"
    pub aperture: Option<String>,
    /// "1/250 s"
    pub shutter_speed: Option<String>,
    /// "ISO 400"
    pub iso: Option<String>,
    pub date_taken: Option<String>,
    /// "-0.3 EV"
    pub exposure_compensation: Option<String>,
    pub flash: Option<String>,
    pub white_balance: Option<String>,
    pub metering_mode: Option<String>,
}

impl ExifSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Read details for `path`. Returns `None` when the file cannot be stat'ed.
pub fn read_metadata(path: &Path) -> Option<Metadata> {
    let meta = fs::metadata(path).ok().filter(|m| m.is_file())?;
    let dimensions = read_dimensions(path);
    let exif = read_exif(path);
    trace!("Read metadata for {:?}", path);

    Some(Metadata {
        size_bytes: meta.len(),
        size: format_file_size(meta.len()),
        dimensions,
        orientation: dimensions.map(|(w, h)| Orientation::from_dimensions(w, h)),
        modified: meta.modified().ok(),
        exif,
    })
}

/// Read the primary-image EXIF fields of `path`.
///
/// Returns `None` when the file has no EXIF block or none of the fields the
/// info panel shows.
pub fn read_exif(path: &Path) -> Option<ExifSummary> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!("Failed to open {:?} for EXIF: {}", path, e);
            return None;
        }
    };
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            trace!("No EXIF in {:?}: {}", path, e);
            return None;
        }
    };

    let value = |tag: Tag| {
        exif.get_field(tag, In::PRIMARY)
            .map(|field| field.display_value().to_string())
    };
    let text = |tag: Tag| value(tag).map(|v| v.trim_matches('"').to_string());

    let summary = ExifSummary {
        camera_make: text(Tag::Make),
        camera_model: text(Tag::Model),
        lens: text(Tag::LensModel),
        focal_length: value(Tag::FocalLength),
        aperture: value(Tag::FNumber).map(|v| format!("f/{}", v)),
        shutter_speed: value(Tag::ExposureTime).map(|v| format!("{} s", v)),
        iso: value(Tag::PhotographicSensitivity).map(|v| format!("ISO {}", v)),
        date_taken: text(Tag::DateTimeOriginal),
        exposure_compensation: value(Tag::ExposureBiasValue).map(|v| format!("{} EV", v)),
        flash: value(Tag::Flash),
        white_balance: value(Tag::WhiteBalance),
        metering_mode: value(Tag::MeteringMode),
    };

    if summary.is_empty() {
        None
    } else {
        Some(summary)
    }
}

/// Format a byte count with binary units and two decimals above 1 KB.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
