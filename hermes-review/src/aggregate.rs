use serde::Serialize;

/// A user's derived rating: mean and count over every review targeting them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub rating: f64,
    pub reviews_count: i32,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        rating: 0.0,
        reviews_count: 0,
    };

    /// Full recompute. No reviews means 0.0 and 0.
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0i64, 0i32), |(sum, count), r| (sum + i64::from(r), count + 1));
        if count == 0 {
            return Self::EMPTY;
        }
        Self {
            rating: sum as f64 / f64::from(count),
            reviews_count: count,
        }
    }
}
