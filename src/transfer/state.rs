//! Transfer Status Definitions
//!
//! Status names are stored as lowercase TEXT in PostgreSQL.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Legacy in-flight status name still counted by the admission query.
pub const LEGACY_IN_PROGRESS: &str = "in_progress";

/// Transfer lifecycle status
///
/// ```text
/// PENDING → ACCEPTED → COMPLETED
/// ```
///
/// Terminal state: COMPLETED. There are no reverse transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Initial state - request admitted and recorded
    Pending,

    /// Approved by a supervisor, pallet may move
    Accepted,

    /// Terminal: pallet arrived at destination
    Completed,
}

impl TransferStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed)
    }

    /// Check if the transfer still occupies destination capacity
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        !self.is_terminal()
    }

    /// The only status this one may move to, if any
    pub fn next(&self) -> Option<TransferStatus> {
        match self {
            TransferStatus::Pending => Some(TransferStatus::Accepted),
            TransferStatus::Accepted => Some(TransferStatus::Completed),
            TransferStatus::Completed => None,
        }
    }

    /// Check whether `self -> to` is a permitted transition
    pub fn can_transition_to(&self, to: TransferStatus) -> bool {
        self.next() == Some(to)
    }

    /// Status names that count against destination capacity
    pub fn in_flight_names() -> [&'static str; 3] {
        [
            TransferStatus::Pending.as_str(),
            TransferStatus::Accepted.as_str(),
            LEGACY_IN_PROGRESS,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Accepted => "accepted",
            TransferStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransferStatus::Pending),
            "accepted" => Ok(TransferStatus::Accepted),
            "completed" => Ok(TransferStatus::Completed),
            other => Err(format!("unknown transfer status: {}", other)),
        }
    }
}
