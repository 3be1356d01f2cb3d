pub mod aggregate;
pub mod models;
pub mod participation;

pub use aggregate::RatingSummary;
pub use models::{
    NewReview, Rating, Review, ReviewCheck, ReviewEdit, ReviewError, ReviewSubmission, ReviewView,
};
pub use participation::check_participation;
