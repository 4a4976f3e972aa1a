mod common;

use std::path::Path;

use common::MockToolRunner;
use vidgauge_core::{CoreError, LocationTagConfig, MetadataDetector};

/// Build ffprobe-shaped JSON for a video stream plus optional extras.
fn probe_json(stream_fields: &str, format_fields: &str, extra_streams: &str) -> String {
    format!(
        r#"{{
            "streams": [
                {{
                    "index": 0,
                    "codec_type": "video",
                    "codec_name": "hevc",
                    "pix_fmt": "yuv420p10le",
                    "width": 1920,
                    "height": 1080,
                    "r_frame_rate": "60/1",
                    "avg_frame_rate": "60/1"
                    {stream_fields}
                }}
                {extra_streams}
            ],
            "format": {{
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2"
                {format_fields}
            }}
        }}"#
    )
}

fn detector_for(json: &str, path: &str) -> MetadataDetector<MockToolRunner> {
    let runner = MockToolRunner::new();
    runner.expect_success("ffprobe", path, json, "");
    MetadataDetector::new(runner)
}

#[test]
fn test_detect_basic_metadata() {
    let json = probe_json(r#", "duration": "42.5""#, "", "");
    let detector = detector_for(&json, "/videos/clip.mp4");
    let meta = detector.detect(Path::new("/videos/clip.mp4")).unwrap();

    assert_eq!(meta.width, 1920);
    assert_eq!(meta.height, 1080);
    assert_eq!(meta.codec, "hevc");
    assert_eq!(meta.pixel_format, "yuv420p10le");
    assert_eq!(meta.fps, 60.0);
    assert!(!meta.is_vfr);
    assert_eq!(meta.duration_seconds, 42.5);
    assert!(!meta.is_portrait);
    assert!(!meta.has_audio);
    assert_eq!(meta.device_model, None);
    assert_eq!(meta.location, None);
}

#[test]
fn test_vfr_detected_when_rates_differ() {
    let json = probe_json("", "", "").replace(r#""avg_frame_rate": "60/1""#, r#""avg_frame_rate": "59/1""#);
    let detector = detector_for(&json, "/videos/clip.mp4");
    let meta = detector.detect(Path::new("/videos/clip.mp4")).unwrap();
    assert!(meta.is_vfr);
    assert_eq!(meta.fps, 60.0);
}

#[test]
fn test_rotation_tag_marks_portrait() {
    let json = probe_json(r#", "tags": {"rotate": "90"}"#, "", "");
    let detector = detector_for(&json, "/videos/clip.mp4");
    let meta = detector.detect(Path::new("/videos/clip.mp4")).unwrap();
    // Raw dimensions stay landscape; the rotation tag decides
    assert_eq!((meta.width, meta.height), (1920, 1080));
    assert!(meta.is_portrait);
}

#[test]
fn test_duration_falls_back_to_container_then_zero() {
    let json = probe_json("", r#", "duration": "120.25""#, "");
    let detector = detector_for(&json, "/videos/clip.mp4");
    let meta = detector.detect(Path::new("/videos/clip.mp4")).unwrap();
    assert_eq!(meta.duration_seconds, 120.25);

    let json = probe_json("", "", "");
    let detector = detector_for(&json, "/videos/clip.mp4");
    let meta = detector.detect(Path::new("/videos/clip.mp4")).unwrap();
    assert_eq!(meta.duration_seconds, 0.0);
}

#[test]
fn test_data_streams_do_not_count_as_audio() {
    // A GoPro-style telemetry track is "data", not audio
    let extra = r#", {"index": 1, "codec_type": "data", "codec_name": "bin_data"}"#;
    let detector = detector_for(&probe_json("", "", extra), "/videos/clip.mp4");
    assert!(!detector.detect(Path::new("/videos/clip.mp4")).unwrap().has_audio);

    let extra = r#", {"index": 1, "codec_type": "audio", "codec_name": "aac"}"#;
    let detector = detector_for(&probe_json("", "", extra), "/videos/clip.mp4");
    assert!(detector.detect(Path::new("/videos/clip.mp4")).unwrap().has_audio);
}

#[test]
fn test_device_model_and_color_passthrough() {
    let json = probe_json(
        r#", "color_space": "bt2020nc", "color_transfer": "smpte2084", "color_primaries": "bt2020""#,
        r#", "tags": {"com.apple.quicktime.model": "iPhone 15 Pro"}"#,
        "",
    );
    let detector = detector_for(&json, "/videos/clip.mp4");
    let meta = detector.detect(Path::new("/videos/clip.mp4")).unwrap();
    assert_eq!(meta.device_model.as_deref(), Some("iPhone 15 Pro"));
    assert_eq!(meta.color_space.as_deref(), Some("bt2020nc"));
    assert_eq!(meta.color_transfer.as_deref(), Some("smpte2084"));
    assert_eq!(meta.color_primaries.as_deref(), Some("bt2020"));
}

#[test]
fn test_no_video_stream_is_an_error() {
    let json = r#"{"streams": [{"index": 0, "codec_type": "audio", "codec_name": "aac"}], "format": {}}"#;
    let detector = detector_for(json, "/videos/audio_only.m4a");
    let err = detector.detect(Path::new("/videos/audio_only.m4a")).unwrap_err();
    assert!(matches!(err, CoreError::NoVideoStream(_)));
}

#[test]
fn test_ffprobe_nonzero_exit_is_an_error() {
    let runner = MockToolRunner::new();
    runner.expect_exit_failure("ffprobe", "/videos/broken.mp4", 1, "moov atom not found");
    let detector = MetadataDetector::new(runner);
    let err = detector.detect(Path::new("/videos/broken.mp4")).unwrap_err();
    assert!(matches!(err, CoreError::ToolInvocation(_)));
}

#[test]
fn test_invalid_json_is_an_error() {
    let runner = MockToolRunner::new();
    runner.expect_success("ffprobe", "/videos/clip.mp4", "this is not json", "");
    let detector = MetadataDetector::new(runner);
    let err = detector.detect(Path::new("/videos/clip.mp4")).unwrap_err();
    assert!(matches!(err, CoreError::MalformedOutput(_)));
}

#[test]
fn test_iso6709_container_tag() {
    let json = probe_json(
        "",
        r#", "tags": {"com.apple.quicktime.location.ISO6709": "+37.566500+126.978000/"}"#,
        "",
    );
    let detector = detector_for(&json, "/videos/seoul.mp4");
    let meta = detector.detect(Path::new("/videos/seoul.mp4")).unwrap();
    assert_eq!(meta.location.as_deref(), Some("37.566500, 126.978000"));
    assert_eq!(meta.location_latitude, Some(37.5665));
    assert_eq!(meta.location_longitude, Some(126.978));
}

#[test]
fn test_compass_letter_stream_tag() {
    let json = probe_json(r#", "tags": {"location": "N 40.7128, W 74.0060"}"#, "", "");
    let detector = detector_for(&json, "/videos/nyc.mp4");
    let meta = detector.detect(Path::new("/videos/nyc.mp4")).unwrap();
    assert_eq!(meta.location.as_deref(), Some("40.712800, -74.006000"));
    assert_eq!(meta.location_latitude, Some(40.7128));
    assert_eq!(meta.location_longitude, Some(-74.006));
}

#[test]
fn test_freeform_location_key_priority() {
    // The generic key wins over the vendor-specific alternate, and
    // non-coordinate text comes back verbatim with no numeric fields.
    let json = probe_json(
        "",
        r#", "tags": {"location": "Seoul Downtown", "com.apple.quicktime.location.name": "Somewhere Else"}"#,
        "",
    );
    let detector = detector_for(&json, "/videos/seoul.mp4");
    let meta = detector.detect(Path::new("/videos/seoul.mp4")).unwrap();
    assert_eq!(meta.location.as_deref(), Some("Seoul Downtown"));
    assert_eq!(meta.location_latitude, None);
    assert_eq!(meta.location_longitude, None);
}

#[test]
fn test_freeform_key_with_coordinate_text_is_parsed() {
    let json = probe_json("", r#", "tags": {"location": "+37.566500+126.978000/"}"#, "");
    let detector = detector_for(&json, "/videos/seoul.mp4");
    let meta = detector.detect(Path::new("/videos/seoul.mp4")).unwrap();
    assert_eq!(meta.location.as_deref(), Some("37.566500, 126.978000"));
    assert_eq!(meta.location_latitude, Some(37.5665));
}

#[test]
fn test_custom_location_tag_keys() {
    let json = probe_json("", r#", "tags": {"venue": "Olympic Stadium"}"#, "");
    let runner = MockToolRunner::new();
    runner.expect_success("ffprobe", "/videos/stadium.mp4", &json, "");
    let detector = MetadataDetector::new(runner).with_location_tags(LocationTagConfig {
        text_keys: vec!["venue".to_string()],
    });
    let meta = detector.detect(Path::new("/videos/stadium.mp4")).unwrap();
    assert_eq!(meta.location.as_deref(), Some("Olympic Stadium"));
}

#[test]
fn test_sidecar_srt_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let video_path = dir.path().join("flight.mp4");
    std::fs::write(
        dir.path().join("flight.srt"),
        "1\n00:00:00,000 --> 00:00:01,000\nGPS +35.123400+129.043200/ alt 120m\n",
    )
    .unwrap();

    let json = probe_json("", "", "");
    let runner = MockToolRunner::new();
    runner.expect_success("ffprobe", "flight.mp4", &json, "");
    let detector = MetadataDetector::new(runner);

    let meta = detector.detect(&video_path).unwrap();
    assert_eq!(meta.location.as_deref(), Some("35.123400, 129.043200"));
    assert_eq!(meta.location_latitude, Some(35.1234));
    assert_eq!(meta.location_longitude, Some(129.0432));
}

#[test]
fn test_no_location_sources_yield_none() {
    let json = probe_json("", r#", "tags": {"artist": "someone"}"#, "");
    let detector = detector_for(&json, "/videos/plain.mp4");
    let meta = detector.detect(Path::new("/videos/plain.mp4")).unwrap();
    assert_eq!(meta.location, None);
    assert_eq!(meta.location_latitude, None);
    assert_eq!(meta.location_longitude, None);
}
