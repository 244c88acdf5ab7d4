//! Transfer Core Types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::state::TransferStatus;

/// Transfer ID type - ULID-based unique identifier
///
/// Sortable by creation time and generated without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    /// Generate a new unique TransferId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for TransferId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransferId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Create transfer request body
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateTransferRequest {
    #[validate(length(min = 1, message = "pallet_id is required"))]
    #[schema(example = "PAL-0001")]
    pub pallet_id: String,

    #[validate(length(min = 1, message = "from_location is required"))]
    #[schema(example = "COLD-A")]
    pub from_location: String,

    #[validate(length(min = 1, message = "to_location is required"))]
    #[schema(example = "DOCK1")]
    pub to_location: String,

    #[validate(length(min = 1, message = "requested_by is required"))]
    #[schema(example = "picker-7")]
    pub requested_by: String,
}

/// Pallet transfer between two locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transfer {
    #[schema(value_type = String, example = "01J9Z3M8Q2W7T6V5X4Y3Z2A1B0")]
    pub id: TransferId,
    pub pallet_id: String,
    pub from_location: String,
    pub to_location: String,
    pub status: TransferStatus,
    pub requested_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transfer {
    /// Build a new PENDING transfer from a request
    pub fn pending(req: CreateTransferRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: TransferId::new(),
            pallet_id: req.pallet_id,
            from_location: req.from_location,
            to_location: req.to_location,
            status: TransferStatus::Pending,
            requested_by: req.requested_by,
            approved_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Status change applied atomically by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub expected: TransferStatus,
    pub new: TransferStatus,
    pub approved_by: Option<String>,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateTransferRequest {
        CreateTransferRequest {
            pallet_id: "PAL-1".into(),
            from_location: "COLD-A".into(),
            to_location: "DOCK1".into(),
            requested_by: "picker".into(),
        }
    }

    #[test]
    fn test_transfer_id_parse_display() {
        let id = TransferId::new();
        let parsed: TransferId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-ulid".parse::<TransferId>().is_err());
    }

    #[test]
    fn test_pending_transfer() {
        let now = Utc::now();
        let t = Transfer::pending(request(), now);
        assert_eq!(t.status, TransferStatus::Pending);
        assert!(t.approved_by.is_none());
        assert_eq!(t.created_at, t.updated_at);
        assert_eq!(t.to_location, "DOCK1");
    }

    #[test]
    fn test_request_validation() {
        assert!(request().validate().is_ok());

        let mut bad = request();
        bad.to_location = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_transfer_json_omits_missing_approver() {
        let t = Transfer::pending(request(), Utc::now());
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("approved_by").is_none());
        assert_eq!(json["id"], t.id.to_string());
    }
}
