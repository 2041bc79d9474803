//! Cut-list editing.
//!
//! Submitted cut lists arrive as loosely-typed JSON. [`normalize_records`]
//! turns them into a valid [`Cutlist`] under a lenient policy:
//!
//! - A missing or `null` `Start(sec)` / `End(sec)` counts as `0`.
//! - Numbers and numeric strings (`"2.5"`) are accepted.
//! - Any other value (unparseable string, boolean, object, array, or a
//!   non-finite number) drops that record. So does a negative start or a
//!   record that is not an object.
//! - Times are rounded to one decimal, records with `end <= start` are
//!   dropped, and the rest are sorted by start. Ties keep submission order.
//! - A missing or `null` `Transcript` becomes `""`; numbers and booleans
//!   are kept as their text.
//!
//! Every dropped record is noted in the returned [`ValidationReport`] with
//! its index. Normalizing an already-normalized list changes nothing.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//!
//! let payload = json!([
//!     {"Start(sec)": 2.0, "End(sec)": 1.0},
//!     {"Start(sec)": 1.0, "End(sec)": 3.0},
//!     {"Start(sec)": "5", "End(sec)": 6.04, "Transcript": "outro"},
//! ]);
//! let (cuts, report) = cutlist::normalize_submission(&payload)?;
//! assert_eq!(cuts.len(), 2);
//! assert_eq!(cuts[1].end, 6.0);
//! assert_eq!(report.warnings.len(), 1);
//! # Ok::<(), cutlist::CutlistError>(())
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use crate::conversion::round_to_tenth;
use crate::cut::{Cut, Cutlist};
use crate::error::CutlistError;
use crate::sampler::FrameArtifacts;
use crate::validation::ValidationReport;

/// Record key holding the start time.
pub const START_KEY: &str = "Start(sec)";

/// Record key holding the end time.
pub const END_KEY: &str = "End(sec)";

/// Record key holding the free-text label.
pub const TRANSCRIPT_KEY: &str = "Transcript";

/// Payload key wrapping the record list in object form.
pub const CUTLIST_KEY: &str = "cutlist";

/// Extract the record list from a submission.
///
/// Accepts a bare array or an object of the form `{"cutlist": [...]}`. An
/// object without the `cutlist` key is an empty submission.
///
/// # Errors
///
/// [`CutlistError::Validation`] if the payload is neither shape or the
/// `cutlist` key holds something other than an array.
pub fn parse_submission(payload: &Value) -> Result<&[Value], CutlistError> {
    match payload {
        Value::Array(records) => Ok(records),
        Value::Object(object) => match object.get(CUTLIST_KEY) {
            None | Some(Value::Null) => Ok(&[]),
            Some(Value::Array(records)) => Ok(records),
            Some(other) => Err(CutlistError::Validation {
                index: None,
                reason: format!("`{CUTLIST_KEY}` must be a list, got {}", kind_of(other)),
            }),
        },
        other => Err(CutlistError::Validation {
            index: None,
            reason: format!("expected a list of cut records, got {}", kind_of(other)),
        }),
    }
}

/// Normalize submitted records into a valid cut list.
///
/// Never fails: records that cannot be used are dropped and listed in the
/// report's warnings.
pub fn normalize_records(records: &[Value]) -> (Cutlist, ValidationReport) {
    let mut report = ValidationReport::default();
    let mut cuts = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match record_to_cut(record) {
            Ok(cut) if cut.start < 0.0 => {
                report
                    .warnings
                    .push(format!("Record {index}: start {:.1} is negative", cut.start));
            }
            Ok(cut) if cut.end <= cut.start => {
                report.warnings.push(format!(
                    "Record {index}: end {:.1} is not after start {:.1}",
                    cut.end, cut.start
                ));
            }
            Ok(cut) => cuts.push(cut),
            Err(reason) => report.warnings.push(format!("Record {index}: {reason}")),
        }
    }

    sort_by_start(&mut cuts);

    if !report.warnings.is_empty() {
        log::warn!(
            "Dropped {} of {} submitted cut record(s)",
            report.warnings.len(),
            records.len()
        );
    }
    report.info.push(format!(
        "Accepted {} of {} cut record(s)",
        cuts.len(),
        records.len()
    ));

    (Cutlist::from_cuts(cuts), report)
}

/// [`parse_submission`] followed by [`normalize_records`].
///
/// # Errors
///
/// See [`parse_submission`].
pub fn normalize_submission(payload: &Value) -> Result<(Cutlist, ValidationReport), CutlistError> {
    parse_submission(payload).map(normalize_records)
}

/// Apply the normalization rules to an already-typed cut list.
///
/// Rounds times, drops negative-start, non-finite, and non-positive cuts,
/// and sorts by start.
pub fn normalize_cutlist(cutlist: &Cutlist) -> Cutlist {
    let mut cuts: Vec<Cut> = cutlist
        .iter()
        .map(|cut| Cut {
            start: round_to_tenth(cut.start),
            end: round_to_tenth(cut.end),
            label: cut.label.clone(),
        })
        .filter(|cut| cut.start.is_finite() && cut.end.is_finite())
        .filter(|cut| cut.start >= 0.0 && cut.end > cut.start)
        .collect();
    sort_by_start(&mut cuts);
    Cutlist::from_cuts(cuts)
}

/// Response body of the cut-list mutation endpoint.
///
/// Serializes as `{"status": "success", "cutlist": [...], "frames": [...]}`
/// or `{"status": "error", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EditResponse {
    /// The edit was applied.
    Success {
        /// The normalized live cut list.
        cutlist: Cutlist,
        /// Frame artifact names, one per cut; `""` where no frame exists.
        frames: Vec<String>,
    },
    /// The edit was rejected or the pipeline failed.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl EditResponse {
    /// Successful response for a cut list and its artifacts.
    pub fn success(cutlist: Cutlist, artifacts: &FrameArtifacts) -> Self {
        EditResponse::Success {
            cutlist,
            frames: artifacts.file_names(),
        }
    }

    /// Error response carrying the error's user-facing message.
    pub fn error(error: &CutlistError) -> Self {
        EditResponse::Error {
            message: error.user_message(),
        }
    }

    /// Whether this is a success response.
    pub fn is_success(&self) -> bool {
        matches!(self, EditResponse::Success { .. })
    }
}

impl From<Result<(Cutlist, FrameArtifacts), CutlistError>> for EditResponse {
    fn from(result: Result<(Cutlist, FrameArtifacts), CutlistError>) -> Self {
        match result {
            Ok((cutlist, artifacts)) => EditResponse::success(cutlist, &artifacts),
            Err(error) => EditResponse::error(&error),
        }
    }
}

fn record_to_cut(record: &Value) -> Result<Cut, String> {
    let Value::Object(fields) = record else {
        return Err(format!("expected an object, got {}", kind_of(record)));
    };

    let start = seconds_field(fields, START_KEY)?;
    let end = seconds_field(fields, END_KEY)?;
    let label = match fields.get(TRANSCRIPT_KEY) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };

    Ok(Cut {
        start: rounded_seconds(START_KEY, start)?,
        end: rounded_seconds(END_KEY, end)?,
        label,
    })
}

fn rounded_seconds(key: &str, seconds: f64) -> Result<f64, String> {
    let rounded = round_to_tenth(seconds);
    if rounded.is_finite() {
        Ok(rounded)
    } else {
        Err(format!("`{key}` is out of range: {seconds}"))
    }
}

fn seconds_field(fields: &Map<String, Value>, key: &str) -> Result<f64, String> {
    let seconds = match fields.get(key) {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(other) => {
            return Err(format!("`{key}` must be a number, got {}", kind_of(other)));
        }
    };

    match seconds {
        Some(value) if value.is_finite() => Ok(value),
        _ => Err(format!(
            "`{key}` is not a finite number: {}",
            fields.get(key).map(Value::to_string).unwrap_or_default()
        )),
    }
}

fn sort_by_start(cuts: &mut [Cut]) {
    cuts.sort_by(|a, b| a.start.total_cmp(&b.start));
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
