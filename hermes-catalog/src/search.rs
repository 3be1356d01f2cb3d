use chrono::NaiveDate;
use serde::Deserialize;

use crate::trip::{Trip, TripError, TripStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 50;

/// Raw `GET /trips/search` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripSearch {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Normalized search: blank terms dropped, date parsed, paging resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

impl TripSearch {
    pub fn into_filter(self) -> Result<SearchFilter, TripError> {
        let date = match non_blank(self.date) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .map_err(|_| TripError::InvalidSearch(format!("date must be YYYY-MM-DD, got {raw}")))?,
            ),
            None => None,
        };

        let page = self.page.unwrap_or(1);
        if page == 0 {
            return Err(TripError::InvalidSearch("page starts at 1".to_string()));
        }
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(TripError::InvalidSearch(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        Ok(SearchFilter {
            from: non_blank(self.from),
            to: non_blank(self.to),
            date,
            limit: i64::from(limit),
            offset: i64::from(page - 1) * i64::from(limit),
        })
    }
}

impl SearchFilter {
    /// Bookable trips only: active with at least one free seat.
    pub fn matches(&self, trip: &Trip) -> bool {
        trip.status == TripStatus::Active
            && trip.available_seats > 0
            && contains_ignore_case(&trip.from_city, self.from.as_deref())
            && contains_ignore_case(&trip.to_city, self.to.as_deref())
            && self.date.map_or(true, |date| trip.trip_date == date)
    }

    /// `%term%` for `ILIKE`, with wildcard characters in the term escaped.
    pub fn like_pattern(term: &str) -> String {
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}
