use hermes_shared::Masked;
use serde::Serialize;

use crate::trip::Trip;

/// Public driver information shown next to a trip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub driver_name: String,
    pub driver_rating: f64,
    pub driver_car: Option<String>,
}

/// A search result. Carries no contact data.
#[derive(Debug, Clone, Serialize)]
pub struct TripListing {
    #[serde(flatten)]
    pub trip: Trip,
    #[serde(flatten)]
    pub driver: DriverSummary,
}

/// Single-trip view; the only response that exposes the driver's phone.
#[derive(Debug, Clone, Serialize)]
pub struct TripDetails {
    #[serde(flatten)]
    pub trip: Trip,
    #[serde(flatten)]
    pub driver: DriverSummary,
    pub phone: Option<Masked<String>>,
}

/// "Brand Model" when at least one part is known.
pub fn describe_car(brand: Option<&str>, model: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [brand, model]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_car() {
        assert_eq!(describe_car(Some("Lada"), Some("Vesta")), Some("Lada Vesta".to_string()));
        assert_eq!(describe_car(None, Some("Vesta")), Some("Vesta".to_string()));
        assert_eq!(describe_car(Some(" "), None), None);
    }
}
