use chrono::NaiveDate;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus, BookingType};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;

/// Who is allowed to trigger an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Owner,
    Traveler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Accept,
    Reject,
    Cancel,
    Complete,
}

impl BookingAction {
    pub fn target(self) -> BookingStatus {
        match self {
            BookingAction::Accept => BookingStatus::Accepted,
            BookingAction::Reject => BookingStatus::Rejected,
            BookingAction::Cancel => BookingStatus::Cancelled,
            BookingAction::Complete => BookingStatus::Completed,
        }
    }

    pub fn actor(self) -> Actor {
        match self {
            BookingAction::Cancel => Actor::Traveler,
            _ => Actor::Owner,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            BookingAction::Accept => "accept",
            BookingAction::Reject => "reject",
            BookingAction::Cancel => "cancel",
            BookingAction::Complete => "complete",
        }
    }
}

impl BookingStatus {
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Accepted, Completed)
                | (Accepted, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Completed | BookingStatus::Cancelled
        )
    }

    /// Whether the booking still holds hotel rooms.
    pub fn holds_capacity(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Accepted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Rejected => "rejected",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

/// Next status for `action`, or `Conflict` when the edge does not exist.
pub fn transition(current: BookingStatus, action: BookingAction) -> AppResult<BookingStatus> {
    let next = action.target();
    if current.can_transition_to(next) {
        Ok(next)
    } else {
        Err(AppError::Conflict(format!(
            "Cannot {} a booking that is {}",
            action.verb(),
            current.as_str()
        )))
    }
}

/// Check that `claims` may perform `action` on `booking`. Owner actions need
/// the booked resource's owner; a missing resource leaves nobody entitled.
/// Admins get no bypass here.
pub fn authorize(
    action: BookingAction,
    booking: &booking::Model,
    resource_owner: Option<Uuid>,
    claims: &Claims,
) -> AppResult<()> {
    match action.actor() {
        Actor::Traveler if booking.traveler_id == claims.sub => Ok(()),
        Actor::Traveler => Err(AppError::Forbidden(format!(
            "Only the traveler who made this booking can {} it",
            action.verb()
        ))),
        Actor::Owner if resource_owner == Some(claims.sub) => Ok(()),
        Actor::Owner => Err(AppError::Forbidden(format!(
            "Only the resource owner can {} this booking",
            action.verb()
        ))),
    }
}

/// Resource key columns for a new booking: exactly one is set.
pub fn resource_columns(
    booking_type: BookingType,
    resource_id: Uuid,
) -> (Option<Uuid>, Option<Uuid>, Option<Uuid>, Option<Uuid>) {
    let id = Some(resource_id);
    match booking_type {
        BookingType::Vehicle => (id, None, None, None),
        BookingType::Hotel => (None, id, None, None),
        BookingType::Driver => (None, None, id, None),
        BookingType::TourGuide => (None, None, None, id),
    }
}

/// The booked resource, checking that exactly one key is set and that it
/// matches `booking_type`.
pub fn resource_id(booking: &booking::Model) -> AppResult<Uuid> {
    let keys = [
        (BookingType::Vehicle, booking.vehicle_id),
        (BookingType::Hotel, booking.hotel_id),
        (BookingType::Driver, booking.driver_id),
        (BookingType::TourGuide, booking.tour_guide_id),
    ];

    let mut set = keys.iter().filter_map(|(kind, id)| id.map(|id| (*kind, id)));
    match (set.next(), set.next()) {
        (Some((kind, id)), None) if kind == booking.booking_type => Ok(id),
        _ => Err(AppError::Internal(format!(
            "Booking {} has inconsistent resource references",
            booking.id
        ))),
    }
}

/// Last occupied day plus one. The end date is a checkout day, matching
/// `pricing::billable_units`; a same-day range still occupies its start day.
fn occupied_until(start: NaiveDate, end: NaiveDate) -> NaiveDate {
    if end > start {
        end
    } else {
        start.succ_opt().unwrap_or(start)
    }
}

/// Whether two bookings occupy a common day. Back-to-back ranges, where one
/// ends on the day the other starts, do not overlap.
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < occupied_until(b_start, b_end) && b_start < occupied_until(a_start, a_end)
}
