//! Transfer Lifecycle Manager
//!
//! Owns every status change of a transfer and the event that describes it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use validator::Validate;

use super::admission::CapacityPolicy;
use super::state::TransferStatus;
use super::types::{CreateTransferRequest, StatusChange, Transfer, TransferId};
use crate::error::ServiceError;
use crate::outbox::{DomainEvent, OutboxEvent};
use crate::store::{Store, store_now};

/// Lifecycle settings, passed in explicitly at construction
#[derive(Debug, Clone, PartialEq)]
pub struct TransferConfig {
    pub capacity: CapacityPolicy,
    pub approver: String,
    pub processor: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            capacity: CapacityPolicy::default(),
            approver: "supervisor".to_string(),
            processor: "operator".to_string(),
        }
    }
}

pub struct TransferService {
    store: Arc<dyn Store>,
    config: TransferConfig,
}

impl TransferService {
    pub fn new(store: Arc<dyn Store>, config: TransferConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Admit, persist and announce a new PENDING transfer
    ///
    /// An empty idempotency key is treated as absent.
    pub async fn create_transfer(
        &self,
        req: CreateTransferRequest,
        idempotency_key: Option<&str>,
    ) -> Result<Transfer, ServiceError> {
        req.validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        self.config
            .capacity
            .check(self.store.as_ref(), &req.to_location)
            .await?;

        let idempotency_key = idempotency_key.filter(|k| !k.is_empty());
        let transfer = Transfer::pending(req, store_now());
        let event = OutboxEvent::record_at(
            &DomainEvent::transfer_created(&transfer),
            transfer.created_at,
        )?;

        debug!(
            id = %transfer.id,
            idempotency_key = ?idempotency_key,
            "Inserting transfer"
        );
        self.store
            .insert_transfer(&transfer, idempotency_key, &event)
            .await?;

        info!(
            event = "transfer.created",
            id = %transfer.id,
            "Transfer created: {} -> {}", transfer.from_location, transfer.to_location
        );
        Ok(transfer)
    }

    /// PENDING -> ACCEPTED, approved by the configured approver
    pub async fn accept_transfer(&self, id: &str) -> Result<Transfer, ServiceError> {
        let approver = self.config.approver.clone();
        self.advance(id, TransferStatus::Accepted, Some(approver.clone()), |id, at| {
            DomainEvent::transfer_accepted(id, &approver, at)
        })
        .await
    }

    /// ACCEPTED -> COMPLETED, approver cleared
    pub async fn complete_transfer(&self, id: &str) -> Result<Transfer, ServiceError> {
        let processor = self.config.processor.clone();
        self.advance(id, TransferStatus::Completed, None, |id, at| {
            DomainEvent::transfer_completed(id, &processor, at)
        })
        .await
    }

    pub async fn get_transfer(&self, id: &str) -> Result<Transfer, ServiceError> {
        let id = parse_id(id)?;
        self.store
            .get_transfer(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    async fn advance<F>(
        &self,
        id: &str,
        to: TransferStatus,
        approved_by: Option<String>,
        make_event: F,
    ) -> Result<Transfer, ServiceError>
    where
        F: FnOnce(TransferId, chrono::DateTime<Utc>) -> DomainEvent,
    {
        let mut transfer = self.get_transfer(id).await?;
        let from = transfer.status;

        if !from.can_transition_to(to) {
            warn!(id = %transfer.id, from = %from, to = %to, "Rejected transition");
            return Err(invalid_transition(from, to));
        }

        let at = store_now();
        let change = StatusChange {
            expected: from,
            new: to,
            approved_by,
            at,
        };
        let event = OutboxEvent::record_at(&make_event(transfer.id, at), at)?;

        if !self
            .store
            .transition_transfer(transfer.id, &change, &event)
            .await?
        {
            // Lost the CAS: another request moved it first, reload to report
            return match self.store.get_transfer(transfer.id).await? {
                Some(current) => Err(invalid_transition(current.status, to)),
                None => Err(ServiceError::NotFound(transfer.id.to_string())),
            };
        }

        transfer.status = change.new;
        transfer.approved_by = change.approved_by;
        transfer.updated_at = at;

        info!(event = event.topic.as_str(), id = %transfer.id, "Transfer {}", to);
        Ok(transfer)
    }
}

fn parse_id(id: &str) -> Result<TransferId, ServiceError> {
    id.parse()
        .map_err(|_| ServiceError::NotFound(id.to_string()))
}

fn invalid_transition(from: TransferStatus, to: TransferStatus) -> ServiceError {
    ServiceError::InvalidStateTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}
