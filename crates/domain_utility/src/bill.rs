//! Utility bill model and status transitions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{DateRange, Money, PropertyId, UtilityBillId, UtilityId};

use crate::error::UtilityError;

/// How a bill's total is split among eligible units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SplitMethod {
    /// Same share per eligible unit
    Equal,
    /// Proportional to metered consumption over the billing period
    Metered,
    /// Proportional to stored percentages, which must sum to 100
    Percentage,
    /// Pre-assigned per-unit amounts, which must sum to the bill total
    Fixed,
}

/// Lifecycle of a utility bill
///
/// Status only moves forward. Once posted a bill is immutable; the only
/// way back from any earlier state is an explicit administrative override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    /// Entered, not yet allocated
    Draft,
    /// Allocation in progress
    Processing,
    /// Allocated with anomalies; needs a human before posting
    ReviewRequired,
    /// Allocated cleanly, ready to post
    Approved,
    /// Journal entry committed
    Posted,
}

impl BillStatus {
    fn rank(&self) -> u8 {
        match self {
            BillStatus::Draft => 0,
            BillStatus::Processing => 1,
            BillStatus::ReviewRequired | BillStatus::Approved => 2,
            BillStatus::Posted => 3,
        }
    }

    /// True if this status permits (re)allocation
    pub fn allows_allocation(&self) -> bool {
        matches!(
            self,
            BillStatus::Draft | BillStatus::Processing | BillStatus::ReviewRequired
        )
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BillStatus::Draft => "DRAFT",
            BillStatus::Processing => "PROCESSING",
            BillStatus::ReviewRequired => "REVIEW_REQUIRED",
            BillStatus::Approved => "APPROVED",
            BillStatus::Posted => "POSTED",
        };
        write!(f, "{s}")
    }
}

/// A utility provider's bill against a property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityBill {
    /// Unique identifier
    pub id: UtilityBillId,
    /// Property the bill covers
    pub property_id: PropertyId,
    /// Which utility (water, power, gas)
    pub utility_id: UtilityId,
    /// Provider name as billed
    pub provider_name: String,
    /// Billed total
    pub total_amount: Money,
    /// Date on the bill
    pub bill_date: NaiveDate,
    /// Provider's due date
    pub due_date: NaiveDate,
    /// Billing period, inclusive on both ends
    pub period: DateRange,
    /// Split method
    pub split_method: SplitMethod,
    /// Lifecycle status
    pub status: BillStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl UtilityBill {
    /// Creates a new draft bill
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        property_id: PropertyId,
        utility_id: UtilityId,
        provider_name: impl Into<String>,
        total_amount: Money,
        bill_date: NaiveDate,
        due_date: NaiveDate,
        period: DateRange,
        split_method: SplitMethod,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UtilityBillId::new_v7(),
            property_id,
            utility_id,
            provider_name: provider_name.into(),
            total_amount,
            bill_date,
            due_date,
            period,
            split_method,
            status: BillStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the bill forward to the given status
    ///
    /// Regressions are rejected; use [`UtilityBill::override_status`] for
    /// administrative corrections.
    pub fn advance(&mut self, to: BillStatus) -> Result<(), UtilityError> {
        if to.rank() < self.status.rank() {
            return Err(UtilityError::InvalidBillStatus {
                bill_id: self.id.to_string(),
                status: self.status.to_string(),
                operation: "status regression",
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Administrative status override
    ///
    /// Posted bills stay immutable even under override.
    pub fn override_status(&mut self, to: BillStatus) -> Result<(), UtilityError> {
        if self.status == BillStatus::Posted {
            return Err(UtilityError::InvalidBillStatus {
                bill_id: self.id.to_string(),
                status: self.status.to_string(),
                operation: "override of a posted bill",
            });
        }
        tracing::warn!(bill_id = %self.id, from = %self.status, to = %to, "Administrative bill status override");
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
