use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// A star rating, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(i32);

impl Rating {
    pub fn new(value: i32) -> Result<Self, ReviewError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ReviewError::RatingOutOfRange(value))
        }
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub author_id: Uuid,
    pub target_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn edit(&mut self, rating: Rating, comment: Option<String>, now: DateTime<Utc>) {
        self.rating = rating.value();
        self.comment = comment;
        self.updated_at = now;
    }

    pub fn ensure_author(&self, user_id: Uuid) -> Result<(), ReviewError> {
        if self.author_id == user_id {
            Ok(())
        } else {
            Err(ReviewError::NotAuthor)
        }
    }
}

/// `POST /reviews` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub trip_id: Uuid,
    pub target_id: Uuid,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Rating and comment only: `PUT /reviews/{id}` and `POST /bookings/{id}/rate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEdit {
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ReviewEdit {
    pub fn validate(self) -> Result<(Rating, Option<String>), ReviewError> {
        Ok((Rating::new(self.rating)?, normalize_comment(self.comment)))
    }
}

/// A review that passed the field checks. Participation is checked by the
/// store against the bookings it reads in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub trip_id: Uuid,
    pub author_id: Uuid,
    pub target_id: Uuid,
    pub rating: Rating,
    pub comment: Option<String>,
}

impl NewReview {
    pub fn new(
        trip_id: Uuid,
        author_id: Uuid,
        target_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Self, ReviewError> {
        let rating = Rating::new(rating)?;
        if author_id == target_id {
            return Err(ReviewError::SelfReview);
        }
        Ok(Self {
            trip_id,
            author_id,
            target_id,
            rating,
            comment: normalize_comment(comment),
        })
    }

    pub fn from_submission(author_id: Uuid, submission: ReviewSubmission) -> Result<Self, ReviewError> {
        Self::new(
            submission.trip_id,
            author_id,
            submission.target_id,
            submission.rating,
            submission.comment,
        )
    }

    pub fn into_review(self, now: DateTime<Utc>) -> Review {
        Review {
            id: Uuid::new_v4(),
            trip_id: self.trip_id,
            author_id: self.author_id,
            target_id: self.target_id,
            rating: self.rating.value(),
            comment: self.comment,
            created_at: now,
            updated_at: now,
        }
    }
}

fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}

/// A review joined with both parties and the trip it is about.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub target_name: String,
    pub target_avatar: Option<String>,
    pub from_city: String,
    pub to_city: String,
    pub trip_date: NaiveDate,
}

/// Answer to "did I already review this trip?".
#[derive(Debug, Clone, Serialize)]
pub struct ReviewCheck {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
}

impl From<Option<Review>> for ReviewCheck {
    fn from(review: Option<Review>) -> Self {
        Self {
            exists: review.is_some(),
            review,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i32),

    #[error("You cannot review yourself")]
    SelfReview,

    #[error("You didn't participate in this trip")]
    NotParticipant,

    #[error("Review already exists")]
    Duplicate,

    #[error("Not authorized to edit this review")]
    NotAuthor,
}
