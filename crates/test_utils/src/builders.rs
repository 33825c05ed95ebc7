//! Test Data Builders
//!
//! Builder patterns for constructing domain entities with sensible
//! defaults. Tests specify only the fields they care about.

use chrono::NaiveDate;
use core_kernel::{DateRange, LeaseId, Money, PropertyId, UnitId, UtilityId};
use domain_billing::{Invoice, InvoiceType};
use domain_utility::assignment::{LeaseStatus, LeaseUtility};
use domain_utility::bill::{SplitMethod, UtilityBill};
use rust_decimal::Decimal;

use crate::fixtures::{IdFixtures, MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for utility bills
pub struct TestBillBuilder {
    property_id: PropertyId,
    utility_id: UtilityId,
    provider_name: String,
    total_amount: Money,
    bill_date: NaiveDate,
    due_date: NaiveDate,
    period: DateRange,
    split_method: SplitMethod,
}

impl Default for TestBillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBillBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            property_id: IdFixtures::property_id(),
            utility_id: IdFixtures::electricity(),
            provider_name: StringFixtures::provider_name().to_string(),
            total_amount: MoneyFixtures::usd_bill(),
            bill_date: TemporalFixtures::bill_date(),
            due_date: TemporalFixtures::due_date(),
            period: TemporalFixtures::january_period(),
            split_method: SplitMethod::Equal,
        }
    }

    pub fn with_utility(mut self, utility_id: UtilityId) -> Self {
        self.utility_id = utility_id;
        self
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.total_amount = total;
        self
    }

    pub fn with_period(mut self, period: DateRange) -> Self {
        self.period = period;
        self
    }

    pub fn with_split_method(mut self, method: SplitMethod) -> Self {
        self.split_method = method;
        self
    }

    /// Builds a draft bill
    pub fn build(self) -> UtilityBill {
        UtilityBill::new(
            self.property_id,
            self.utility_id,
            self.provider_name,
            self.total_amount,
            self.bill_date,
            self.due_date,
            self.period,
            self.split_method,
        )
    }
}

/// Builder for lease utility assignments
pub struct TestAssignmentBuilder {
    lease_id: LeaseId,
    unit_id: UnitId,
    utility_id: UtilityId,
    is_tenant_responsible: bool,
    lease_status: LeaseStatus,
    fixed_amount: Option<Money>,
    percentage: Option<Decimal>,
}

impl Default for TestAssignmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAssignmentBuilder {
    pub fn new() -> Self {
        Self {
            lease_id: IdFixtures::lease_a(),
            unit_id: IdFixtures::unit_a(),
            utility_id: IdFixtures::electricity(),
            is_tenant_responsible: true,
            lease_status: LeaseStatus::Active,
            fixed_amount: None,
            percentage: None,
        }
    }

    pub fn for_lease(mut self, lease_id: LeaseId, unit_id: UnitId) -> Self {
        self.lease_id = lease_id;
        self.unit_id = unit_id;
        self
    }

    pub fn with_utility(mut self, utility_id: UtilityId) -> Self {
        self.utility_id = utility_id;
        self
    }

    pub fn owner_paid(mut self) -> Self {
        self.is_tenant_responsible = false;
        self
    }

    pub fn with_lease_status(mut self, status: LeaseStatus) -> Self {
        self.lease_status = status;
        self
    }

    pub fn with_fixed_amount(mut self, amount: Money) -> Self {
        self.fixed_amount = Some(amount);
        self
    }

    pub fn with_percentage(mut self, percentage: Decimal) -> Self {
        self.percentage = Some(percentage);
        self
    }

    pub fn build(self) -> LeaseUtility {
        let mut assignment = LeaseUtility::new(self.lease_id, self.unit_id, self.utility_id);
        assignment.is_tenant_responsible = self.is_tenant_responsible;
        assignment.lease_status = self.lease_status;
        assignment.fixed_amount = self.fixed_amount;
        assignment.percentage = self.percentage;
        assignment
    }
}

/// Builder for invoices
pub struct TestInvoiceBuilder {
    lease_id: LeaseId,
    invoice_type: InvoiceType,
    total_amount: Money,
    due_date: NaiveDate,
}

impl Default for TestInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestInvoiceBuilder {
    pub fn new() -> Self {
        Self {
            lease_id: IdFixtures::lease_a(),
            invoice_type: InvoiceType::Rent,
            total_amount: MoneyFixtures::usd_rent(),
            due_date: TemporalFixtures::due_date(),
        }
    }

    pub fn for_lease(mut self, lease_id: LeaseId) -> Self {
        self.lease_id = lease_id;
        self
    }

    pub fn utility_invoice(mut self) -> Self {
        self.invoice_type = InvoiceType::Utility;
        self
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.total_amount = total;
        self
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date = date;
        self
    }

    pub fn build(self) -> Invoice {
        Invoice::new(
            self.lease_id,
            self.invoice_type,
            self.total_amount,
            self.due_date,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_utility::bill::BillStatus;

    #[test]
    fn bill_builder_defaults_to_draft() {
        let bill = TestBillBuilder::new().build();
        assert_eq!(bill.status, BillStatus::Draft);
        assert_eq!(bill.split_method, SplitMethod::Equal);
    }

    #[test]
    fn assignment_builder_overrides_apply() {
        let assignment = TestAssignmentBuilder::new()
            .owner_paid()
            .with_lease_status(LeaseStatus::Ended)
            .build();
        assert!(!assignment.is_tenant_responsible);
        assert!(!assignment.is_eligible());
    }
}
