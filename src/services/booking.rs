//! Test-drive booking scheduler
//!
//! Standard hourly slots 08:00-17:00. The no-double-booking invariant is
//! the one hard rejection in the system: overlap attempts get a 409, not
//! a soft message.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Deserialize;

use crate::db::models::Booking;
use crate::db::Repository;
use crate::errors::AppError;

/// First and last slot start hours (slots are one hour long)
const FIRST_SLOT_HOUR: u32 = 8;
const LAST_SLOT_HOUR: u32 = 16;

#[derive(Debug, Clone, Deserialize)]
pub struct NewBooking {
    pub car_id: i32,
    pub slot_start: NaiveDateTime,
    pub slot_end: NaiveDateTime,
}

pub struct BookingService {
    repo: Repository,
}

/// All standard slots for a day as half-open intervals.
fn day_slots(date: NaiveDate) -> Vec<(NaiveDateTime, NaiveDateTime)> {
    (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
        .map(|hour| {
            let start = date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).expect("valid hour"));
            (start, start + TimeDelta::hours(1))
        })
        .collect()
}

/// Half-open interval overlap: [a1, a2) intersects [b1, b2)
fn overlaps(a: (NaiveDateTime, NaiveDateTime), b: (NaiveDateTime, NaiveDateTime)) -> bool {
    a.0 < b.1 && a.1 > b.0
}

fn validate_interval(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::ValidationError(
            "slot_start must be before slot_end".to_string(),
        ));
    }
    Ok(())
}

impl BookingService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn create_booking(&self, request: NewBooking) -> Result<Booking, AppError> {
        validate_interval(request.slot_start, request.slot_end)?;

        let available = self
            .repo
            .get_car(request.car_id)
            .await?
            .map(|car| car.available_for_test_drive)
            .unwrap_or(false);
        if !available {
            return Err(AppError::ValidationError(
                "Car not available for test drive".to_string(),
            ));
        }

        let booking = self
            .repo
            .create_booking(request.car_id, request.slot_start, request.slot_end)
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::SlotConflict) {
                    metrics::counter!("carhub_booking_conflicts_total").increment(1);
                }
            })?;

        metrics::counter!("carhub_bookings_created_total").increment(1);
        tracing::info!(
            booking_id = booking.id,
            car_id = booking.car_id,
            "Booking created"
        );
        Ok(booking)
    }

    /// Free standard slots for a car on a given day, formatted
    /// "HH:MM–HH:MM". Missing or unavailable cars yield an empty list.
    pub async fn available_slots(
        &self,
        car_id: i32,
        date: NaiveDate,
    ) -> Result<Vec<String>, AppError> {
        let available = self
            .repo
            .get_car(car_id)
            .await?
            .map(|car| car.available_for_test_drive)
            .unwrap_or(false);
        if !available {
            return Ok(Vec::new());
        }

        let slots = day_slots(date);
        let day_start = slots.first().expect("non-empty slot table").0;
        let day_end = slots.last().expect("non-empty slot table").1;

        let booked: Vec<(NaiveDateTime, NaiveDateTime)> = self
            .repo
            .bookings_for_car_between(car_id, day_start, day_end)
            .await?
            .into_iter()
            .map(|b| (b.slot_start, b.slot_end))
            .collect();

        Ok(slots
            .into_iter()
            .filter(|slot| !booked.iter().any(|b| overlaps(*slot, *b)))
            .map(|(start, end)| format!("{}–{}", start.format("%H:%M"), end.format("%H:%M")))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn at(hour: u32) -> NaiveDateTime {
        date().and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
    }

    #[test]
    fn nine_hourly_slots_per_day() {
        let slots = day_slots(date());
        assert_eq!(slots.len(), 9);
        assert_eq!(slots[0], (at(8), at(9)));
        assert_eq!(slots[8], (at(16), at(17)));
    }

    #[test]
    fn contained_interval_overlaps() {
        // Fully contained in an existing booked interval
        assert!(overlaps((at(9), at(10)), (at(8), at(12))));
    }

    #[test]
    fn disjoint_intervals_do_not_overlap() {
        assert!(!overlaps((at(8), at(9)), (at(10), at(11))));
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        // Half-open semantics: [8,9) and [9,10) share only the boundary
        assert!(!overlaps((at(8), at(9)), (at(9), at(10))));
    }

    #[test]
    fn interval_must_be_forward() {
        assert!(validate_interval(at(10), at(9)).is_err());
        assert!(validate_interval(at(9), at(9)).is_err());
        assert!(validate_interval(at(9), at(10)).is_ok());
    }
}
