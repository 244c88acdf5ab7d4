//! Capacity Admission Check
//!
//! Limits the number of in-flight transfers per destination. The count and the
//! following insert are not atomic: two concurrent requests for the same
//! destination can both pass the check and overshoot the maximum by the
//! number of racing requests. This is a known limitation.

use tracing::debug;

use crate::error::ServiceError;
use crate::store::Store;

/// Default maximum in-flight transfers per destination
pub const DEFAULT_MAX_PER_LOCATION: u32 = 5;

/// Admission policy for new transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    pub max_per_location: u32,
    pub enabled: bool,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            max_per_location: DEFAULT_MAX_PER_LOCATION,
            enabled: true,
        }
    }
}

impl CapacityPolicy {
    /// Admit or reject a new transfer towards `destination`
    ///
    /// Does not touch the store when the check is disabled.
    pub async fn check(&self, store: &dyn Store, destination: &str) -> Result<(), ServiceError> {
        if !self.enabled {
            return Ok(());
        }

        let in_flight = store.count_in_flight(destination).await?;
        debug!(
            destination = destination,
            in_flight = in_flight,
            max = self.max_per_location,
            "Admission check"
        );

        if in_flight >= i64::from(self.max_per_location) {
            return Err(ServiceError::CapacityExceeded {
                location: destination.to_string(),
                in_flight,
                max: self.max_per_location,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::{DomainEvent, OutboxEvent};
    use crate::store::memory::MemoryStore;
    use crate::transfer::{CreateTransferRequest, Transfer};
    use chrono::Utc;

    async fn seed(store: &MemoryStore, destination: &str, n: usize) {
        for i in 0..n {
            let t = Transfer::pending(
                CreateTransferRequest {
                    pallet_id: format!("PAL-{}", i),
                    from_location: "COLD-A".into(),
                    to_location: destination.into(),
                    requested_by: "picker".into(),
                },
                Utc::now(),
            );
            let event = OutboxEvent::record(&DomainEvent::transfer_created(&t)).unwrap();
            store.insert_transfer(&t, None, &event).await.unwrap();
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = CapacityPolicy::default();
        assert_eq!(policy.max_per_location, 5);
        assert!(policy.enabled);
    }

    #[tokio::test]
    async fn test_rejects_at_maximum() {
        let store = MemoryStore::new();
        seed(&store, "DOCK1", 5).await;

        let err = CapacityPolicy::default()
            .check(&store, "DOCK1")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::CapacityExceeded {
                location: "DOCK1".into(),
                in_flight: 5,
                max: 5
            }
        );
    }

    #[tokio::test]
    async fn test_admits_below_maximum_and_other_destinations() {
        let store = MemoryStore::new();
        seed(&store, "DOCK1", 4).await;

        let policy = CapacityPolicy::default();
        assert!(policy.check(&store, "DOCK1").await.is_ok());
        assert!(policy.check(&store, "DOCK2").await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_policy_admits_everything() {
        let store = MemoryStore::new();
        seed(&store, "DOCK1", 7).await;

        let policy = CapacityPolicy {
            max_per_location: 5,
            enabled: false,
        };
        assert!(policy.check(&store, "DOCK1").await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_maximum_rejects_first_transfer() {
        let store = MemoryStore::new();
        let policy = CapacityPolicy {
            max_per_location: 0,
            enabled: true,
        };
        assert!(matches!(
            policy.check(&store, "DOCK1").await,
            Err(ServiceError::CapacityExceeded { in_flight: 0, .. })
        ));
    }
}
