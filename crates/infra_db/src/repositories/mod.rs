//! Repository implementations for domain entities
//!
//! Each repository encapsulates the SQL for one aggregate and maps
//! between rows and domain types. The repositories also implement the
//! orchestrator's store ports, so the same types serve direct handler
//! reads and orchestrated flows.

pub mod billing;
pub mod ledger;
pub mod utility;

pub use billing::BillingRepository;
pub use ledger::LedgerRepository;
pub use utility::UtilityRepository;
