pub mod models;
pub mod lifecycle;

pub use models::{
    BookedTrip, Booking, BookingDecision, BookingError, BookingRequest, BookingStatus,
    DriverBooking, PassengerBooking, TripBrief,
};
pub use lifecycle::{passenger_to_rate, plan_booking, plan_decision, quote_total, DecisionPlan, NewBooking};
