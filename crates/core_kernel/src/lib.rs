//! Core Kernel - Foundational types and utilities for the property platform
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Billing period and timezone handling
//! - Common identifiers and value objects
//! - The shared port-error taxonomy used by store adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use temporal::{DateRange, Timezone, TemporalError};
pub use identifiers::{
    EntityId, AccountId, JournalEntryId, JournalLineId,
    PropertyId, UnitId, LeaseId, TenantId, ActorId,
    InvoiceId, PaymentId, ReversalId,
    UtilityId, UtilityBillId, AllocationId, LeaseUtilityId, ReadingId,
};
pub use error::CoreError;
pub use ports::{DomainPort, PortError};
