use uuid::Uuid;

use crate::models::ReviewError;

/// Both parties must have ridden together: one is the trip's driver, the
/// other holds a confirmed booking on it.
///
/// `confirmed_passengers` are the passenger ids of the trip's confirmed
/// bookings, read in the same transaction as the review insert.
pub fn check_participation(
    driver_id: Uuid,
    author_id: Uuid,
    target_id: Uuid,
    confirmed_passengers: &[Uuid],
) -> Result<(), ReviewError> {
    if author_id == target_id {
        return Err(ReviewError::SelfReview);
    }
    let rode = |user: Uuid| confirmed_passengers.contains(&user);
    let ok = (author_id == driver_id && rode(target_id)) || (target_id == driver_id && rode(author_id));
    if ok {
        Ok(())
    } else {
        Err(ReviewError::NotParticipant)
    }
}
