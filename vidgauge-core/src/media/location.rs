//! Geolocation extraction from probe metadata
//!
//! Capture devices record location in several incompatible conventions:
//! an ISO 6709 container tag (Apple), compass-letter coordinate strings in
//! stream tags, free-text location tags, or a sidecar subtitle file (DJI
//! drones). Sources are tried in a strict priority order and the first one
//! that yields anything wins, even when the result is free text.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::media::ProbeData;

/// Container tag carrying ISO 6709 coordinates, e.g. `+37.5665+126.9780/`
pub const ISO6709_LOCATION_TAG: &str = "com.apple.quicktime.location.ISO6709";

static ISO6709_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([+-]\d+(?:\.\d+)?)([+-]\d+(?:\.\d+)?)(?:[+-]\d+(?:\.\d+)?)?/").unwrap()
});

static NSEW_COORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([NS])\s*(\d+(?:\.\d+)?)\s*,?\s*([EW])\s*(\d+(?:\.\d+)?)").unwrap()
});

/// Ordered container-level text tag keys consulted when no coordinate tag
/// is present. The generic `location` key outranks vendor-specific
/// alternates; callers with other vendors' conventions supply their own
/// list.
#[derive(Debug, Clone)]
pub struct LocationTagConfig {
    pub text_keys: Vec<String>,
}

impl Default for LocationTagConfig {
    fn default() -> Self {
        Self {
            text_keys: vec![
                "location".to_string(),
                "com.apple.quicktime.location.name".to_string(),
            ],
        }
    }
}

/// A resolved location: a display string, plus numeric coordinates when the
/// source was coordinate-shaped rather than free text.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub display: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl LocationFix {
    fn from_coordinates(lat: f64, lon: f64) -> Self {
        Self {
            display: format_coordinate_pair(lat, lon),
            latitude: Some(lat),
            longitude: Some(lon),
        }
    }

    fn from_text(text: &str) -> Self {
        Self {
            display: text.to_string(),
            latitude: None,
            longitude: None,
        }
    }
}

fn is_valid_lat_lon(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Format coordinates the way the archival pipeline displays them.
fn format_coordinate_pair(lat: f64, lon: f64) -> String {
    format!("{:.6}, {:.6}", lat, lon)
}

/// Parse an ISO 6709 coordinate string (`±lat±lon[±alt]/`).
fn parse_iso6709(text: &str) -> Option<(f64, f64)> {
    let captures = ISO6709_RE.captures(text)?;
    let lat = captures[1].parse::<f64>().ok()?;
    let lon = captures[2].parse::<f64>().ok()?;

    if !is_valid_lat_lon(lat, lon) {
        log::warn!(
            "Invalid ISO 6709 coordinate ignored: {} (parsed lat={}, lon={})",
            text,
            lat,
            lon
        );
        return None;
    }
    Some((lat, lon))
}

/// Parse a compass-letter coordinate string (`N 37.56, E 126.97`);
/// the letters select the sign.
fn parse_nsew(text: &str) -> Option<(f64, f64)> {
    let captures = NSEW_COORD_RE.captures(text)?;
    let lat = captures[2].parse::<f64>().ok()?;
    let lon = captures[4].parse::<f64>().ok()?;

    let lat = if captures[1].eq_ignore_ascii_case("S") {
        -lat.abs()
    } else {
        lat.abs()
    };
    let lon = if captures[3].eq_ignore_ascii_case("W") {
        -lon.abs()
    } else {
        lon.abs()
    };

    if !is_valid_lat_lon(lat, lon) {
        return None;
    }
    Some((lat, lon))
}

fn coerce_tag_text(value: &str) -> Option<&str> {
    let text = value.trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Resolve the location for a video from its probe data, trying sources in
/// priority order and stopping at the first that yields anything:
///
/// 1. the ISO 6709 container tag,
/// 2. a compass-letter coordinate string in the video stream's tags,
/// 3. configured container-level text tags (coordinate-shaped text is
///    parsed, anything else is returned verbatim),
/// 4. an `.srt` sidecar next to the video, scanned for an ISO 6709
///    substring.
pub fn resolve_location(
    video_path: &Path,
    probe: &ProbeData,
    config: &LocationTagConfig,
) -> Option<LocationFix> {
    // 1. ISO 6709 container tag
    if let Some(tags) = probe.format_tags() {
        if let Some(value) = tags.get(ISO6709_LOCATION_TAG).and_then(|v| coerce_tag_text(v)) {
            if let Some((lat, lon)) = parse_iso6709(value) {
                return Some(LocationFix::from_coordinates(lat, lon));
            }
        }
    }

    // 2. Compass-letter coordinates in the video stream's tags
    if let Some(stream) = probe.primary_video_stream() {
        for value in stream.tags.values() {
            if let Some(text) = coerce_tag_text(value) {
                if let Some((lat, lon)) = parse_nsew(text) {
                    return Some(LocationFix::from_coordinates(lat, lon));
                }
            }
        }
    }

    // 3. Container-level text tags, in configured priority order
    if let Some(tags) = probe.format_tags() {
        for key in &config.text_keys {
            let Some(text) = tags.get(key).and_then(|v| coerce_tag_text(v)) else {
                continue;
            };
            if let Some((lat, lon)) = parse_iso6709(text) {
                return Some(LocationFix::from_coordinates(lat, lon));
            }
            if let Some((lat, lon)) = parse_nsew(text) {
                return Some(LocationFix::from_coordinates(lat, lon));
            }
            return Some(LocationFix::from_text(text));
        }
    }

    // 4. Sidecar subtitle file next to the video
    extract_from_sidecar(video_path).map(|(lat, lon)| LocationFix::from_coordinates(lat, lon))
}

fn extract_from_sidecar(video_path: &Path) -> Option<(f64, f64)> {
    let sidecar_path = video_path.with_extension("srt");
    if !sidecar_path.is_file() {
        return None;
    }

    let bytes = match std::fs::read(&sidecar_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Failed to read sidecar {}: {}", sidecar_path.display(), e);
            return None;
        }
    };

    parse_iso6709(&String::from_utf8_lossy(&bytes))
}
