// libs/availability-cell/src/services/conflict.rs
use chrono::NaiveDateTime;

use crate::models::{Reservation, SlotWindow};

/// Half-open overlap test: `[start1, end1)` and `[start2, end2)` share time.
pub fn windows_overlap(
    start1: NaiveDateTime,
    end1: NaiveDateTime,
    start2: NaiveDateTime,
    end2: NaiveDateTime,
) -> bool {
    start1 < end2 && end1 > start2
}

/// Decides whether a candidate slot collides with existing reservations.
///
/// Cancelled reservations never block. Everything else, pending included,
/// holds its window from the moment it is booked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictChecker {
    buffer_minutes: i64,
}

impl ConflictChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Widens each candidate by `buffer_minutes` on both sides before testing.
    pub fn with_buffer(buffer_minutes: i64) -> Self {
        Self {
            buffer_minutes: buffer_minutes.max(0),
        }
    }

    pub fn buffer_minutes(&self) -> i64 {
        self.buffer_minutes
    }

    pub fn is_blocking<R: Reservation>(&self, slot: &SlotWindow, reservation: &R) -> bool {
        if reservation.is_cancelled() {
            return false;
        }

        let candidate = if self.buffer_minutes > 0 {
            slot.widened(self.buffer_minutes)
        } else {
            *slot
        };

        windows_overlap(
            candidate.start_time,
            candidate.end_time,
            reservation.start_time(),
            reservation.end_time(),
        )
    }

    pub fn is_slot_free<R: Reservation>(&self, slot: &SlotWindow, reservations: &[R]) -> bool {
        !reservations.iter().any(|r| self.is_blocking(slot, r))
    }

    pub fn conflicts<'a, R: Reservation>(
        &'a self,
        slot: &'a SlotWindow,
        reservations: &'a [R],
    ) -> impl Iterator<Item = &'a R> + 'a {
        reservations.iter().filter(move |r| self.is_blocking(slot, *r))
    }
}

/// Plain conflict check without buffers.
pub fn is_slot_free<R: Reservation>(slot: &SlotWindow, reservations: &[R]) -> bool {
    ConflictChecker::new().is_slot_free(slot, reservations)
}
