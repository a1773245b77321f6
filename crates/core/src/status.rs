//! Conversion job status as reported by `GET /status`.
//!
//! The gateway only promises that a finished job reports `"completed"`.
//! The other wire values below are the ones the converter service is
//! known to emit; anything else maps to [`JobStatus::Unknown`].

use serde::Serialize;

// ---------------------------------------------------------------------------
// Wire values
// ---------------------------------------------------------------------------

/// Conversion finished and the MP3 artifact is stored.
pub const WIRE_STATUS_COMPLETED: &str = "completed";
/// Upload accepted, conversion not started yet.
pub const WIRE_STATUS_SUBMITTED: &[&str] = &["submitted", "queued", "pending"];
/// Conversion is running.
pub const WIRE_STATUS_IN_PROGRESS: &[&str] = &["in_progress", "processing", "converting"];

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Client-side view of a conversion job's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Submitted,
    InProgress,
    Completed,
    Unknown,
}

impl JobStatus {
    /// Map a raw `status` string from the gateway. Matching ignores ASCII
    /// case and surrounding whitespace.
    pub fn from_wire(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized == WIRE_STATUS_COMPLETED {
            Self::Completed
        } else if WIRE_STATUS_SUBMITTED.contains(&normalized.as_str()) {
            Self::Submitted
        } else if WIRE_STATUS_IN_PROGRESS.contains(&normalized.as_str()) {
            Self::InProgress
        } else {
            Self::Unknown
        }
    }

    /// Whether polling must stop once this status is observed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
