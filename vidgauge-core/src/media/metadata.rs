//! Video metadata detection
//!
//! Runs ffprobe on a file and distills its JSON output into a
//! `VideoMetadata` record: resolution, frame-rate regularity, orientation,
//! color characteristics, capture device and geolocation.

use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::external::ToolRunner;
use crate::media::location::{self, LocationTagConfig};
use crate::media::{ProbeData, StreamInfo};

/// Container tag naming the capture device
const DEVICE_MODEL_TAG: &str = "com.apple.quicktime.model";

/// Intrinsic metadata of one video file.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// Stream-level duration when present, else container-level, else 0.0
    pub duration_seconds: f64,
    /// Nominal frame rate (from the claimed `r_frame_rate` fraction)
    pub fps: f64,
    /// True when nominal and average frame rates differ
    pub is_vfr: bool,
    pub codec: String,
    pub pixel_format: String,
    /// True when rotated 90/270, or taller than wide without such rotation
    pub is_portrait: bool,
    pub device_model: Option<String>,
    pub color_space: Option<String>,
    pub color_transfer: Option<String>,
    pub color_primaries: Option<String>,
    pub has_audio: bool,
    pub location: Option<String>,
    pub location_latitude: Option<f64>,
    pub location_longitude: Option<f64>,
}

/// Detects video metadata by probing files through a `ToolRunner`.
pub struct MetadataDetector<R: ToolRunner> {
    runner: R,
    location_tags: LocationTagConfig,
}

impl<R: ToolRunner> MetadataDetector<R> {
    /// Create a detector with the default location tag priorities.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            location_tags: LocationTagConfig::default(),
        }
    }

    /// Override the container-level text tag keys consulted for location.
    pub fn with_location_tags(mut self, location_tags: LocationTagConfig) -> Self {
        self.location_tags = location_tags;
        self
    }

    /// Probe a file and extract its metadata.
    ///
    /// Fails with `ToolInvocation` if ffprobe cannot run or exits non-zero,
    /// `MalformedOutput` if its JSON cannot be parsed, and `NoVideoStream`
    /// if no video-typed stream is present.
    pub fn detect(&self, video_path: &Path) -> CoreResult<VideoMetadata> {
        let probe = ProbeData::from_path(&self.runner, video_path)?;

        let video_stream = probe.primary_video_stream().ok_or_else(|| {
            CoreError::NoVideoStream(video_path.display().to_string())
        })?;

        let width = require_dimension(video_stream, "width", video_path)?;
        let height = require_dimension(video_stream, "height", video_path)?;
        let codec = video_stream.codec_name.clone();
        let pixel_format = video_stream
            .property_str("pix_fmt")
            .unwrap_or("unknown")
            .to_string();

        let nominal = parse_frame_rate(video_stream.property_str("r_frame_rate").unwrap_or("0/1"));
        let average = parse_frame_rate(video_stream.property_str("avg_frame_rate").unwrap_or("0/1"));
        let fps = nominal;
        // Exact inequality: any drift between claimed rates marks the file VFR
        let is_vfr = nominal != average;

        let duration_seconds = video_stream
            .property_str("duration")
            .and_then(|d| d.parse::<f64>().ok())
            .or_else(|| probe.container_duration())
            .unwrap_or(0.0);

        let rotation = video_stream
            .tags
            .get("rotate")
            .and_then(|r| r.parse::<i64>().ok())
            .unwrap_or(0);
        let is_rotated_vertical = rotation == 90 || rotation == 270;
        // Rotated captures keep landscape pixel dimensions; the rotation tag
        // decides orientation before the raw aspect does.
        let is_portrait = is_rotated_vertical || width < height;

        let device_model = probe
            .format_tags()
            .and_then(|tags| tags.get(DEVICE_MODEL_TAG))
            .cloned();

        let color_space = video_stream.property_str("color_space").map(str::to_string);
        let color_transfer = video_stream.property_str("color_transfer").map(str::to_string);
        let color_primaries = video_stream.property_str("color_primaries").map(str::to_string);

        let has_audio = probe.has_audio_stream();

        let fix = location::resolve_location(video_path, &probe, &self.location_tags);
        let (location, location_latitude, location_longitude) = match fix {
            Some(fix) => (Some(fix.display), fix.latitude, fix.longitude),
            None => (None, None, None),
        };

        Ok(VideoMetadata {
            width,
            height,
            duration_seconds,
            fps,
            is_vfr,
            codec,
            pixel_format,
            is_portrait,
            device_model,
            color_space,
            color_transfer,
            color_primaries,
            has_audio,
            location,
            location_latitude,
            location_longitude,
        })
    }
}

fn require_dimension(stream: &StreamInfo, key: &str, path: &Path) -> CoreResult<u32> {
    stream
        .property_u64(key)
        .map(|v| v as u32)
        .ok_or_else(|| {
            CoreError::MalformedOutput(format!(
                "Video stream missing {} in {}",
                key,
                path.display()
            ))
        })
}

/// Convert an ffprobe frame-rate fraction (`30000/1001`, `60/1`, `60`) to
/// frames per second. Malformed input or a zero denominator parses to 0.0.
pub fn parse_frame_rate(frame_rate: &str) -> f64 {
    let text = frame_rate.trim();
    match text.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().unwrap_or(0.0);
            let den = den.trim().parse::<f64>().unwrap_or(0.0);
            if den == 0.0 {
                0.0
            } else {
                num / den
            }
        }
        None => text.parse::<f64>().unwrap_or(0.0),
    }
}
