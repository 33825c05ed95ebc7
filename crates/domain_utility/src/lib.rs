//! Utility Domain - Bill Allocation and Meter Readings
//!
//! This crate splits shared utility bills across the units responsible
//! for them and maintains the append-only meter reading log the metered
//! split depends on. The load-bearing invariant is conservation: for any
//! split method, the written allocations sum back to the bill's total
//! exactly, with rounding reconciled rather than dropped.
//!
//! Bills move DRAFT -> PROCESSING -> REVIEW_REQUIRED or APPROVED ->
//! POSTED, forward only. Anomalies during a metered run (missing
//! readings, zero consumption) do not fail the run; they route the bill
//! to review instead of letting a silently wrong split reach the ledger.

pub mod allocation;
pub mod assignment;
pub mod bill;
pub mod error;
pub mod reading;

pub use allocation::{calculate_allocations, AllocationOutcome, UtilityAllocation};
pub use assignment::{LeaseStatus, LeaseUtility};
pub use bill::{BillStatus, SplitMethod, UtilityBill};
pub use error::UtilityError;
pub use reading::{MeterLog, MeterReading};
