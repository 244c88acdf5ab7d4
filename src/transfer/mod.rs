//! Pallet Transfer Lifecycle
//!
//! # State Machine
//!
//! ```text
//! PENDING → ACCEPTED → COMPLETED
//! ```
//!
//! # Invariants
//!
//! 1. **Forward only**: a transition is applied as a CAS on the expected status
//! 2. **Event with change**: each transition appends its outbox event in the same store transaction
//! 3. **Admission**: creation is rejected when the destination is at capacity (unless disabled)

pub mod admission;
pub mod service;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use admission::{CapacityPolicy, DEFAULT_MAX_PER_LOCATION};
pub use service::{TransferConfig, TransferService};
pub use state::TransferStatus;
pub use types::{CreateTransferRequest, StatusChange, Transfer, TransferId};
