//! Lease-utility assignments
//!
//! An assignment joins a lease to a utility definition and carries the
//! per-unit split parameters. Readings and allocations only apply where
//! the tenant is responsible and the lease is active.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{LeaseId, LeaseUtilityId, Money, UnitId, UtilityId};

/// Lease lifecycle status, as mirrored from the leasing system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeaseStatus {
    /// Signed but not yet started
    Pending,
    /// In force
    Active,
    /// Ended or terminated
    Ended,
}

/// A lease's assignment to a shared utility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaseUtility {
    /// Unique identifier
    pub id: LeaseUtilityId,
    /// The lease
    pub lease_id: LeaseId,
    /// The unit under that lease
    pub unit_id: UnitId,
    /// The utility definition
    pub utility_id: UtilityId,
    /// Whether the tenant pays for this utility
    pub is_tenant_responsible: bool,
    /// Mirrored lease status
    pub lease_status: LeaseStatus,
    /// Pre-assigned amount for FIXED splits
    pub fixed_amount: Option<Money>,
    /// Stored percentage for PERCENTAGE splits (0-100)
    pub percentage: Option<Decimal>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl LeaseUtility {
    /// Creates a tenant-responsible assignment on an active lease
    pub fn new(lease_id: LeaseId, unit_id: UnitId, utility_id: UtilityId) -> Self {
        Self {
            id: LeaseUtilityId::new_v7(),
            lease_id,
            unit_id,
            utility_id,
            is_tenant_responsible: true,
            lease_status: LeaseStatus::Active,
            fixed_amount: None,
            percentage: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the FIXED split amount
    pub fn with_fixed_amount(mut self, amount: Money) -> Self {
        self.fixed_amount = Some(amount);
        self
    }

    /// Sets the PERCENTAGE split share
    pub fn with_percentage(mut self, percentage: Decimal) -> Self {
        self.percentage = Some(percentage);
        self
    }

    /// True if this assignment participates in readings and allocations
    pub fn is_eligible(&self) -> bool {
        self.is_tenant_responsible && self.lease_status == LeaseStatus::Active
    }
}
