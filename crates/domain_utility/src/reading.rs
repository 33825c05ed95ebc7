//! Append-only meter reading log
//!
//! Readings are never updated or deleted. The log enforces monotonicity
//! at insert time against the date-ordered neighbors, so backdated
//! readings are accepted only if they fit between their surroundings.
//! That determinism is what lets the allocation engine compute
//! consumption deltas and lets audits replay history exactly.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{LeaseUtilityId, ReadingId};

use crate::assignment::LeaseUtility;
use crate::error::UtilityError;

/// A single recorded meter reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReading {
    /// Unique identifier
    pub id: ReadingId,
    /// The lease-utility assignment the meter belongs to
    pub lease_utility_id: LeaseUtilityId,
    /// The meter value as read
    pub value: Decimal,
    /// The calendar date of the reading
    pub reading_date: NaiveDate,
    /// When it was recorded
    pub recorded_at: DateTime<Utc>,
}

/// In-memory view of the reading log, keyed by assignment
///
/// Each assignment's readings are kept sorted by date, ties broken by
/// recording order.
#[derive(Debug, Default)]
pub struct MeterLog {
    readings: HashMap<LeaseUtilityId, Vec<MeterReading>>,
}

impl MeterLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a log from already-validated stored readings
    pub fn from_readings(readings: Vec<MeterReading>) -> Self {
        let mut log = Self::new();
        for reading in readings {
            let entry = log.readings.entry(reading.lease_utility_id).or_default();
            entry.push(reading);
        }
        for entry in log.readings.values_mut() {
            entry.sort_by_key(|r| (r.reading_date, r.recorded_at));
        }
        log
    }

    /// Records a reading for the assignment
    ///
    /// Validates the assignment's eligibility, rejects negative values,
    /// and enforces monotonicity against both date-ordered neighbors. On
    /// success the reading is appended and its id returned.
    pub fn record(
        &mut self,
        assignment: &LeaseUtility,
        value: Decimal,
        date: NaiveDate,
    ) -> Result<ReadingId, UtilityError> {
        if assignment.lease_status != crate::assignment::LeaseStatus::Active {
            return Err(UtilityError::LeaseNotActive(assignment.id.to_string()));
        }
        if !assignment.is_tenant_responsible {
            return Err(UtilityError::UtilityNotTenantResponsible(
                assignment.id.to_string(),
            ));
        }
        if value.is_sign_negative() {
            return Err(UtilityError::NegativeReading(value));
        }

        let entries = self.readings.entry(assignment.id).or_default();

        if let Some(previous) = entries.iter().filter(|r| r.reading_date <= date).last() {
            if value < previous.value {
                return Err(UtilityError::NonMonotonicReading {
                    value,
                    neighbor: previous.value,
                    date,
                });
            }
        }
        if let Some(next) = entries.iter().find(|r| r.reading_date > date) {
            if value > next.value {
                return Err(UtilityError::NonMonotonicReading {
                    value,
                    neighbor: next.value,
                    date,
                });
            }
        }

        let reading = MeterReading {
            id: ReadingId::new_v7(),
            lease_utility_id: assignment.id,
            value,
            reading_date: date,
            recorded_at: Utc::now(),
        };
        let id = reading.id;

        let position = entries
            .iter()
            .position(|r| r.reading_date > date)
            .unwrap_or(entries.len());
        entries.insert(position, reading);

        tracing::debug!(
            assignment_id = %assignment.id,
            %value,
            %date,
            "Meter reading recorded"
        );

        Ok(id)
    }

    /// Readings for an assignment, sorted by date
    pub fn readings(&self, assignment_id: LeaseUtilityId) -> &[MeterReading] {
        self.readings
            .get(&assignment_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The latest reading on or before the given date
    pub fn latest_on_or_before(
        &self,
        assignment_id: LeaseUtilityId,
        date: NaiveDate,
    ) -> Option<&MeterReading> {
        self.readings(assignment_id)
            .iter()
            .filter(|r| r.reading_date <= date)
            .last()
    }

    /// Metered consumption over a billing period
    ///
    /// The window is bounded by the latest reading on or before the
    /// period end minus the latest reading on or before the period start.
    /// Returns `None` when either bound is missing, which the allocation
    /// engine reports as an anomaly.
    pub fn consumption(
        &self,
        assignment_id: LeaseUtilityId,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Option<Decimal> {
        let start = self.latest_on_or_before(assignment_id, period_start)?;
        let end = self.latest_on_or_before(assignment_id, period_end)?;
        Some(end.value - start.value)
    }
}
