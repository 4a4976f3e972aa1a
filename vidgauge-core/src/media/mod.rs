//! Media information and probing module
//!
//! This module runs ffprobe against a media file and represents the result
//! as typed stream/format records, preserving the raw tag maps and stream
//! properties the detectors pick through.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::external::ToolRunner;

pub mod location;
pub mod metadata;

pub use metadata::{MetadataDetector, VideoMetadata};

/// Media stream types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamType {
    Video,
    Audio,
    Subtitle,
    Attachment,
    Data,
    Unknown,
}

impl From<&str> for StreamType {
    fn from(s: &str) -> Self {
        match s {
            "video" => StreamType::Video,
            "audio" => StreamType::Audio,
            "subtitle" => StreamType::Subtitle,
            "attachment" => StreamType::Attachment,
            "data" => StreamType::Data,
            _ => StreamType::Unknown,
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamType::Video => write!(f, "Video"),
            StreamType::Audio => write!(f, "Audio"),
            StreamType::Subtitle => write!(f, "Subtitle"),
            StreamType::Attachment => write!(f, "Attachment"),
            StreamType::Data => write!(f, "Data"),
            StreamType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Stream information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Stream index
    pub index: usize,

    /// Stream type
    pub codec_type: StreamType,

    /// Codec name
    pub codec_name: String,

    /// Stream tags
    pub tags: HashMap<String, String>,

    /// Remaining stream-specific properties
    pub properties: HashMap<String, Value>,
}

impl StreamInfo {
    /// Get a string-valued property
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    /// Get an unsigned integer property
    pub fn property_u64(&self, key: &str) -> Option<u64> {
        self.properties.get(key).and_then(|v| v.as_u64())
    }
}

/// Container format information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Duration in seconds
    pub duration: Option<f64>,

    /// Format tags
    pub tags: HashMap<String, String>,
}

/// Parsed ffprobe output for one media file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeData {
    /// Media streams
    pub streams: Vec<StreamInfo>,

    /// Container format
    pub format: Option<FormatInfo>,
}

impl ProbeData {
    /// Run ffprobe on a file and parse the result.
    pub fn from_path<R: ToolRunner>(runner: &R, path: &Path) -> CoreResult<Self> {
        let json = execute_ffprobe(runner, path)?;
        Ok(Self::from_json(&json))
    }

    /// Build probe data from already-decoded ffprobe JSON.
    ///
    /// Parsing is lenient: missing or oddly-typed fields fall back to
    /// defaults rather than failing, since ffprobe output varies widely by
    /// container.
    pub fn from_json(json: &Value) -> Self {
        let mut probe = Self::default();

        if let Some(streams) = json.get("streams").and_then(|s| s.as_array()) {
            for stream in streams {
                let index = stream
                    .get("index")
                    .and_then(|i| i.as_u64())
                    .unwrap_or(0) as usize;

                let codec_type = stream
                    .get("codec_type")
                    .and_then(|t| t.as_str())
                    .map(StreamType::from)
                    .unwrap_or(StreamType::Unknown);

                let codec_name = stream
                    .get("codec_name")
                    .and_then(|n| n.as_str())
                    .unwrap_or("")
                    .to_string();

                let tags = parse_tags(stream.get("tags"));

                let mut properties = HashMap::new();
                if let Some(obj) = stream.as_object() {
                    for (key, value) in obj {
                        if key != "tags" && key != "index" && key != "codec_type"
                            && key != "codec_name"
                        {
                            properties.insert(key.clone(), value.clone());
                        }
                    }
                }

                probe.streams.push(StreamInfo {
                    index,
                    codec_type,
                    codec_name,
                    tags,
                    properties,
                });
            }
        }

        if let Some(format) = json.get("format") {
            let duration = format
                .get("duration")
                .and_then(|d| d.as_str())
                .and_then(|d| d.parse::<f64>().ok());

            probe.format = Some(FormatInfo {
                duration,
                tags: parse_tags(format.get("tags")),
            });
        }

        probe
    }

    /// Get the first video stream, if any
    pub fn primary_video_stream(&self) -> Option<&StreamInfo> {
        self.streams
            .iter()
            .find(|s| s.codec_type == StreamType::Video)
    }

    /// Whether any stream is an audio stream. Data/telemetry streams
    /// (e.g. GoPro GPMF tracks) are not audio and never count.
    pub fn has_audio_stream(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.codec_type == StreamType::Audio)
    }

    /// Container-level duration in seconds
    pub fn container_duration(&self) -> Option<f64> {
        self.format.as_ref().and_then(|f| f.duration)
    }

    /// Container-level tags (empty map if ffprobe reported none)
    pub fn format_tags(&self) -> Option<&HashMap<String, String>> {
        self.format.as_ref().map(|f| &f.tags)
    }
}

fn parse_tags(value: Option<&Value>) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    if let Some(obj) = value.and_then(|t| t.as_object()) {
        for (key, value) in obj {
            if let Some(value_str) = value.as_str() {
                tags.insert(key.clone(), value_str.to_string());
            }
        }
    }
    tags
}

/// Execute ffprobe and return its decoded JSON output.
pub fn execute_ffprobe<R: ToolRunner>(runner: &R, path: &Path) -> CoreResult<Value> {
    let args: Vec<String> = [
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_streams",
        "-show_format",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(path.to_string_lossy().into_owned()))
    .collect();

    log::debug!("Running ffprobe on: {}", path.display());

    let output = runner.run("ffprobe", &args)?;

    if !output.success {
        return Err(CoreError::ToolInvocation(format!(
            "ffprobe exited with code {:?} for {}: {}",
            output.exit_code,
            path.display(),
            output.stderr
        )));
    }

    serde_json::from_str(&output.stdout).map_err(|e| {
        CoreError::MalformedOutput(format!(
            "Failed to parse ffprobe output for {}: {}",
            path.display(),
            e
        ))
    })
}
