/// Scan status definitions for tracking a project's crawl lifecycle
///
/// A scan moves strictly forward: `Pending -> Scanning -> Completed | Failed`.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the lifecycle status of one project's scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Project created, scan not started yet
    #[default]
    Pending,

    /// Scan in progress
    Scanning,

    // ===== Terminal States =====
    /// Traversal finished (frontier exhausted or page cap reached)
    Completed,

    /// Traversal aborted by an unrecoverable error
    Failed,
}

impl ScanStatus {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Position in the lifecycle; both terminal states share the last rank
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Scanning => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Checks if a transition from this status to another is valid
    pub fn can_transition_to(&self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Scanning)
                | (Self::Scanning, Self::Completed)
                | (Self::Scanning, Self::Failed)
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Scanning => "scanning",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "scanning" => Some(Self::Scanning),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
