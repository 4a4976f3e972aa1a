//! Core library for media analysis using ffmpeg and ffprobe.
//!
//! This crate turns the textual/JSON output of the external probing and
//! analysis tools into two kinds of structured facts for an archival
//! pipeline: intrinsic video metadata (resolution, frame-rate regularity,
//! orientation, capture device, geolocation) and quality metrics comparing
//! a transcoded output against its source (SSIM, PSNR, VMAF).
//!
//! Tool output is not a stable contract: values may be `nan`/`inf`, success
//! markers repeat, score payloads switch between JSON-lines and free text,
//! and geolocation hides in several tag conventions. The parsers here
//! extract the single correct value under all of those conditions without
//! crashing the caller and without fabricating numbers.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//! use vidgauge_core::{MetadataDetector, QualityReportGenerator, StdToolRunner};
//!
//! let detector = MetadataDetector::new(StdToolRunner::new());
//! let meta = detector.detect(Path::new("/videos/clip.mp4")).unwrap();
//! println!("{}x{} {} vfr={}", meta.width, meta.height, meta.codec, meta.is_vfr);
//!
//! let generator = QualityReportGenerator::new(StdToolRunner::new());
//! let pairs = vec![(
//!     PathBuf::from("/videos/clip.mp4"),
//!     PathBuf::from("/videos/clip_transcoded.mp4"),
//! )];
//! for report in generator.generate(&pairs) {
//!     println!("{}: vmaf={:?}", report.output_path.display(), report.vmaf);
//! }
//! ```

pub mod error;
pub mod external;
pub mod media;
pub mod quality;

// Re-exports for public API
pub use error::{CoreError, CoreResult};
pub use external::{check_dependency, FilterCapabilities, StdToolRunner, ToolOutput, ToolRunner};
pub use media::location::{LocationFix, LocationTagConfig};
pub use media::{MetadataDetector, ProbeData, StreamInfo, StreamType, VideoMetadata};
pub use quality::{
    parse_psnr_output, parse_ssim_output, parse_vmaf_output, Metric, QualityReport,
    QualityReportGenerator, SUPPORTED_METRICS,
};
