//! Validation reports.
//!
//! [`ValidationReport`] collects informational notices, warnings, and
//! errors. It is produced in two places: [`VideoFile::validate`] checks a
//! stream's metadata before detection, and the cut-list editor records the
//! submitted records it dropped.
//!
//! # Example
//!
//! ```no_run
//! use cutlist::VideoFile;
//!
//! let video = VideoFile::open("input.mp4")?;
//! let report = video.validate();
//! if !report.is_valid() {
//!     for error in &report.errors {
//!         eprintln!("{error}");
//!     }
//! }
//! # Ok::<(), cutlist::CutlistError>(())
//! ```
//!
//! [`VideoFile::validate`]: crate::VideoFile::validate

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use serde::Serialize;

use crate::metadata::VideoMetadata;

/// Findings of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues; for the editor, one entry per dropped record.
    pub warnings: Vec<String>,
    /// Fatal issues.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of entries (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check video metadata for conditions that break cut detection.
pub(crate) fn validate_metadata(metadata: &VideoMetadata) -> ValidationReport {
    let mut report = ValidationReport::default();

    if metadata.width == 0 || metadata.height == 0 {
        report.errors.push(format!(
            "Invalid video dimensions: {}×{}",
            metadata.width, metadata.height,
        ));
    }

    if !metadata.has_usable_frame_rate() {
        report.errors.push(format!(
            "Video frame rate is {}; cut times cannot be computed",
            metadata.frames_per_second,
        ));
    } else if metadata.frames_per_second > 240.0 {
        report.warnings.push(format!(
            "Unusually high frame rate ({:.1} fps); detection may be slow",
            metadata.frames_per_second,
        ));
    }

    if metadata.duration == Duration::ZERO {
        report
            .warnings
            .push("Container duration is zero; frame count comes from decoding".to_string());
    }

    if metadata.frame_count == 0 && metadata.duration > Duration::ZERO {
        report
            .warnings
            .push("Estimated frame count is zero despite non-zero duration".to_string());
    }

    report.info.push(format!(
        "Video: {} {}×{} @ {:.2} fps, ~{} frames, {:.1}s",
        metadata.codec,
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        metadata.frame_count,
        metadata.duration.as_secs_f64(),
    ));

    report
}
