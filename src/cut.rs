//! Cut and cut-list types.
//!
//! A [`Cut`] is a time interval `[start, end)` in seconds with an optional
//! free-text label. A [`Cutlist`] is the ordered sequence of cuts for one
//! video. Both serialize with the column names used by the exported table
//! (`Start(sec)`, `End(sec)`, `Transcript`).

use std::ops::Index;
use std::slice::Iter;

use serde::{Deserialize, Serialize};

/// One scene: a time interval plus an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    /// Inclusive lower bound, seconds.
    #[serde(rename = "Start(sec)")]
    pub start: f64,
    /// Upper bound, seconds. Always greater than `start` in a valid list.
    #[serde(rename = "End(sec)")]
    pub end: f64,
    /// Free-text annotation (the transcript column). Empty by default.
    #[serde(rename = "Transcript", default)]
    pub label: String,
}

impl Cut {
    /// A cut with an empty label.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            label: String::new(),
        }
    }

    /// Attach a label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Length of the interval in seconds.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// An ordered sequence of cuts.
///
/// Position in the list determines the frame artifact name
/// (`frame_<index>`), so any reordering invalidates previously written
/// frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cutlist {
    cuts: Vec<Cut>,
}

impl Cutlist {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap cuts as given, without sorting or validation.
    ///
    /// Use [`normalize_cutlist`](crate::normalize_cutlist) to enforce the
    /// ordering and `end > start` invariants.
    pub fn from_cuts(cuts: Vec<Cut>) -> Self {
        Self { cuts }
    }

    /// Number of cuts.
    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// Whether the list holds no cuts.
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    /// Borrow the cuts in order.
    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }

    /// Iterate over the cuts in order.
    pub fn iter(&self) -> Iter<'_, Cut> {
        self.cuts.iter()
    }

    /// Last cut, if any.
    pub fn last(&self) -> Option<&Cut> {
        self.cuts.last()
    }

    /// Consume the list and return the cuts.
    pub fn into_cuts(self) -> Vec<Cut> {
        self.cuts
    }

    pub(crate) fn push(&mut self, cut: Cut) {
        self.cuts.push(cut);
    }

    /// Whether the cuts tile `[0, duration]` exactly: the first starts at
    /// zero, each starts where the previous ended, the last ends at
    /// `duration`, and every cut has positive length.
    pub fn covers(&self, duration: f64) -> bool {
        let Some(first) = self.cuts.first() else {
            return duration == 0.0;
        };
        if first.start != 0.0 {
            return false;
        }
        let contiguous = self
            .cuts
            .windows(2)
            .all(|pair| pair[0].end == pair[1].start);
        let positive = self.cuts.iter().all(|cut| cut.end > cut.start);
        contiguous && positive && self.cuts.last().is_some_and(|last| last.end == duration)
    }
}

impl Index<usize> for Cutlist {
    type Output = Cut;

    fn index(&self, index: usize) -> &Self::Output {
        &self.cuts[index]
    }
}

impl<'a> IntoIterator for &'a Cutlist {
    type Item = &'a Cut;
    type IntoIter = Iter<'a, Cut>;

    fn into_iter(self) -> Self::IntoIter {
        self.cuts.iter()
    }
}

impl FromIterator<Cut> for Cutlist {
    fn from_iter<T: IntoIterator<Item = Cut>>(iter: T) -> Self {
        Self {
            cuts: iter.into_iter().collect(),
        }
    }
}
