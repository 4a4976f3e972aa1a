//! Transcode quality metrics
//!
//! Compares transcoded outputs against their sources with ffmpeg's quality
//! filters (SSIM, PSNR, libvmaf) and produces one `QualityReport` per file
//! pair. Metrics degrade gracefully: an unsupported filter, a failed
//! extraction or a crashed invocation marks that one metric unavailable
//! without aborting the other metrics or the rest of the batch.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::external::{FilterCapabilities, ToolRunner};
use crate::media::{MetadataDetector, VideoMetadata};

pub mod parse;

pub use parse::{extract_vmaf_score, parse_psnr_output, parse_ssim_output, parse_vmaf_output};

/// The quality metrics this engine can measure, in evaluation order.
pub const SUPPORTED_METRICS: [Metric; 3] = [Metric::Ssim, Metric::Psnr, Metric::Vmaf];

/// A quality metric comparing a transcoded output against its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Structural similarity (0-1)
    Ssim,
    /// Peak signal-to-noise ratio (dB)
    Psnr,
    /// Perceptual quality fusion score (0-100)
    Vmaf,
}

impl Metric {
    /// Metric name as it appears in reports and diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Metric::Ssim => "ssim",
            Metric::Psnr => "psnr",
            Metric::Vmaf => "vmaf",
        }
    }

    /// The ffmpeg filter implementing this metric
    pub fn filter_name(self) -> &'static str {
        match self {
            Metric::Ssim => "ssim",
            Metric::Psnr => "psnr",
            Metric::Vmaf => "libvmaf",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quality report for one (source, output) pair.
///
/// A metric either carries a score or appears in `unavailable`, never both
/// and never neither. `errors` holds one diagnostic per failure cause,
/// correlated by metric name.
#[derive(Debug, Clone)]
pub struct QualityReport {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub ssim: Option<f64>,
    pub psnr: Option<f64>,
    pub vmaf: Option<f64>,
    pub unavailable: Vec<Metric>,
    pub errors: Vec<String>,
}

impl QualityReport {
    fn all_unavailable(source_path: &Path, output_path: &Path, error: String) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            ssim: None,
            psnr: None,
            vmaf: None,
            unavailable: SUPPORTED_METRICS.to_vec(),
            errors: vec![error],
        }
    }
}

/// Generates quality reports for batches of (source, output) pairs.
pub struct QualityReportGenerator<R: ToolRunner> {
    runner: R,
    capabilities: FilterCapabilities<R>,
    detector: MetadataDetector<R>,
}

impl<R: ToolRunner + Clone> QualityReportGenerator<R> {
    pub fn new(runner: R) -> Self {
        let capabilities = FilterCapabilities::new(runner.clone());
        let detector = MetadataDetector::new(runner.clone());
        Self {
            runner,
            capabilities,
            detector,
        }
    }
}

impl<R: ToolRunner> QualityReportGenerator<R> {
    /// Compute quality metrics for each pair, producing one report per
    /// input pair in order. Never fails; every failure is encoded in the
    /// affected report.
    pub fn generate(&self, pairs: &[(PathBuf, PathBuf)]) -> Vec<QualityReport> {
        if pairs.is_empty() {
            return Vec::new();
        }

        // One capability query for the whole batch. If the query itself
        // fails, the batch proceeds with every filter marked unsupported.
        let mut capability_error = None;
        let supported = SUPPORTED_METRICS.map(|metric| {
            match self.capabilities.filter_supported(metric.filter_name()) {
                Ok(supported) => supported,
                Err(e) => {
                    log::warn!("Filter capability query failed: {}", e);
                    capability_error = Some(e.to_string());
                    false
                }
            }
        });

        let mut reports = Vec::with_capacity(pairs.len());
        for (source_path, output_path) in pairs {
            reports.push(self.analyze_pair(
                source_path,
                output_path,
                &supported,
                capability_error.as_deref(),
            ));
        }
        reports
    }

    fn analyze_pair(
        &self,
        source_path: &Path,
        output_path: &Path,
        supported: &[bool; 3],
        capability_error: Option<&str>,
    ) -> QualityReport {
        if !source_path.exists() || !output_path.exists() {
            return QualityReport::all_unavailable(
                source_path,
                output_path,
                "source or output path does not exist".to_string(),
            );
        }

        // The output's detected resolution and frame rate drive the
        // comparison filter graph.
        let meta = match self.detector.detect(output_path) {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("Metadata check failed for {}: {}", output_path.display(), e);
                return QualityReport::all_unavailable(
                    source_path,
                    output_path,
                    format!("metadata detection failed: {}", e),
                );
            }
        };

        let mut scores: [Option<f64>; 3] = [None, None, None];
        let mut unavailable = Vec::new();
        let mut errors = Vec::new();

        if let Some(msg) = capability_error {
            errors.push(format!("filter capability query failed: {}", msg));
        }

        for (slot, metric) in SUPPORTED_METRICS.into_iter().enumerate() {
            if !supported[slot] {
                unavailable.push(metric);
                continue;
            }
            match self.run_metric(source_path, output_path, metric, &meta) {
                Ok(Some(score)) => scores[slot] = Some(score),
                Ok(None) => {
                    unavailable.push(metric);
                    errors.push(format!("{}: score extraction failed", metric));
                }
                Err(e) => {
                    log::warn!(
                        "Quality metric '{}' failed ({}): {}",
                        metric,
                        output_path.display(),
                        e
                    );
                    unavailable.push(metric);
                    errors.push(format!("{}: {}", metric, e));
                }
            }
        }

        QualityReport {
            source_path: source_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            ssim: scores[0],
            psnr: scores[1],
            vmaf: scores[2],
            unavailable,
            errors,
        }
    }

    /// Run one metric's analysis invocation and parse its score.
    fn run_metric(
        &self,
        source_path: &Path,
        output_path: &Path,
        metric: Metric,
        meta: &VideoMetadata,
    ) -> CoreResult<Option<f64>> {
        let fps = if meta.fps > 0.0 { Some(meta.fps) } else { None };
        let graph = build_metric_filter_graph(metric, meta.width, meta.height, fps);

        let args = vec![
            "-i".to_string(),
            source_path.to_string_lossy().into_owned(),
            "-i".to_string(),
            output_path.to_string_lossy().into_owned(),
            "-filter_complex".to_string(),
            graph,
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];

        log::debug!(
            "Running quality metric {} for {}",
            metric,
            output_path.display()
        );

        let output = self.runner.run("ffmpeg", &args)?;
        if !output.success {
            return Err(CoreError::ToolInvocation(format!(
                "ffmpeg {} analysis exited with code {:?}",
                metric, output.exit_code
            )));
        }

        Ok(match metric {
            Metric::Ssim => parse_ssim_output(&output.stderr),
            Metric::Psnr => parse_psnr_output(&output.stderr),
            Metric::Vmaf => parse_vmaf_output(&output.stderr),
        })
    }
}

/// Build the comparison filter graph for one metric: both inputs are scaled
/// to the output's detected resolution and a canonical pixel format,
/// optionally re-timed to the detected frame rate, then fed to the metric
/// filter with its machine-readable log directed at stderr.
fn build_metric_filter_graph(metric: Metric, width: u32, height: u32, fps: Option<f64>) -> String {
    let mut chain = Vec::new();
    if let Some(fps) = fps {
        chain.push(format!("fps={}", format_fps_value(fps)));
    }
    chain.push(format!("scale={}:{}", width, height));
    chain.push("format=yuv420p".to_string());
    let common = chain.join(",");

    let metric_filter = match metric {
        Metric::Ssim => "ssim=stats_file=-",
        Metric::Psnr => "psnr=stats_file=-",
        Metric::Vmaf => "libvmaf=log_fmt=json:log_path=-",
    };

    format!("[0:v]{common}[a];[1:v]{common}[b];[a][b]{metric_filter}")
}

/// Format a frame rate for a filter argument: fixed precision with
/// trailing zeros trimmed, so NTSC rates stay short (23.976024, not the
/// full f64 expansion) and integral rates stay integral.
fn format_fps_value(fps: f64) -> String {
    let text = format!("{:.6}", fps);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
