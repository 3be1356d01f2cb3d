pub mod trip;
pub mod inventory;
pub mod search;
pub mod listing;

pub use trip::{Amenities, NewTrip, Trip, TripError, TripStatus};
pub use inventory::{InventoryError, SeatInventory, MAX_SEATS};
pub use search::{SearchFilter, TripSearch};
pub use listing::{describe_car, DriverSummary, TripDetails, TripListing};
