//! Metric output parsing
//!
//! ffmpeg's quality filters write their results into a stream of log text
//! whose shape depends on build options: SSIM/PSNR summaries repeat per
//! segment (only the last is authoritative), and libvmaf emits either
//! JSON-lines or plain text. Each parser scans the whole capture and keeps
//! the last finite value; non-finite or unparsable matches are skipped
//! without resetting an already-found value.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static SSIM_ALL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)All:([0-9.+eE-]+|inf|nan)").unwrap());

static PSNR_AVERAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)average:([0-9.+eE-]+|inf|nan)").unwrap());

static VMAF_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)VMAF.*score[:=]\s*([0-9.+eE-]+|inf|nan)").unwrap());

/// Parse a string to a finite float; `inf`/`nan` and garbage yield `None`.
fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Extract the last finite `All:` score from SSIM filter output.
pub fn parse_ssim_output(stderr: &str) -> Option<f64> {
    let mut value = None;
    for captures in SSIM_ALL_RE.captures_iter(stderr) {
        if let Some(parsed) = parse_finite(&captures[1]) {
            value = Some(parsed);
        }
    }
    value
}

/// Extract the last finite `average:` value from PSNR filter output.
pub fn parse_psnr_output(stderr: &str) -> Option<f64> {
    let mut value = None;
    for captures in PSNR_AVERAGE_RE.captures_iter(stderr) {
        if let Some(parsed) = parse_finite(&captures[1]) {
            value = Some(parsed);
        }
    }
    value
}

/// Extract the VMAF score from libvmaf output.
///
/// Two passes over the same text, in fixed order: a JSON-lines pass (each
/// line holding a `{` is decoded from the first brace and handed to the
/// payload extractor, later lines overwriting earlier ones), then a plain
/// text pass whose finite matches overwrite any JSON result.
pub fn parse_vmaf_output(stderr: &str) -> Option<f64> {
    let mut value = None;

    for line in stderr.lines() {
        let Some(brace) = line.find('{') else {
            continue;
        };
        let Ok(payload) = serde_json::from_str::<Value>(line[brace..].trim()) else {
            continue;
        };
        if let Some(score) = extract_vmaf_score(&payload, false) {
            value = Some(score);
        }
    }

    for captures in VMAF_TEXT_RE.captures_iter(stderr) {
        if let Some(parsed) = parse_finite(&captures[1]) {
            value = Some(parsed);
        }
    }

    value
}

/// Keys recursed into first when present; they hold the summary shapes of
/// libvmaf's per-frame log and pooled-metrics formats.
const PRIORITY_KEYS: [&str; 2] = ["metrics", "pooled_metrics"];

/// Keys that structure the payload without naming a metric.
const STRUCTURAL_KEYS: [&str; 3] = ["frames", "metrics", "pooled_metrics"];

/// Recursively locate a VMAF score inside a libvmaf JSON payload.
///
/// Objects are searched structure-first: priority keys, then any key
/// containing `vmaf` (which forces `allow_any_numeric`, since such a key is
/// intentionally the score container), then structural keys preserving the
/// flag. Only once all of that fails — and only under `allow_any_numeric` —
/// are the remaining values swept for the first finite number. Arrays yield
/// the first finite score of any element.
pub fn extract_vmaf_score(payload: &Value, allow_any_numeric: bool) -> Option<f64> {
    match payload {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_finite(s),
        Value::Array(items) => items
            .iter()
            .find_map(|item| extract_vmaf_score(item, allow_any_numeric)),
        Value::Object(map) => {
            for key in PRIORITY_KEYS {
                if let Some(value) = map.get(key) {
                    if let Some(score) = extract_vmaf_score(value, allow_any_numeric) {
                        return Some(score);
                    }
                }
            }

            for (key, value) in map {
                let key_lower = key.to_ascii_lowercase();
                if key_lower.contains("vmaf") {
                    if let Some(score) = extract_vmaf_score(value, true) {
                        return Some(score);
                    }
                }
                if STRUCTURAL_KEYS.contains(&key_lower.as_str()) {
                    if let Some(score) = extract_vmaf_score(value, allow_any_numeric) {
                        return Some(score);
                    }
                }
            }

            if allow_any_numeric {
                for value in map.values() {
                    if let Some(score) = extract_vmaf_score(value, true) {
                        return Some(score);
                    }
                }
            }

            None
        }
        Value::Bool(_) | Value::Null => None,
    }
}
