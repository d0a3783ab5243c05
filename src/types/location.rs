//! Location types

use serde::{Deserialize, Serialize};

/// Coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components finite and within WGS84 bounds
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// `lat,lng` form used in query strings and route links
    pub fn as_query(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }

    /// Google Maps pin link for display
    pub fn maps_link(&self) -> String {
        format!("https://www.google.com/maps?q={},{}", self.lat, self.lng)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// A location reference resolved to coordinates and a display address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    /// What the caller supplied (URL, place name, or `lat,lng`)
    pub reference: String,
    pub coordinates: Coordinates,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validity() {
        assert!(Coordinates::new(-33.86, 151.2).is_valid());
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, -180.5).is_valid());
        assert!(!Coordinates::new(f64::NAN, 10.0).is_valid());
    }

    #[test]
    fn test_coordinates_links() {
        let c = Coordinates::new(-33.5, 151.25);
        assert_eq!(c.as_query(), "-33.5,151.25");
        assert_eq!(c.maps_link(), "https://www.google.com/maps?q=-33.5,151.25");
        assert_eq!(c.to_string(), "-33.5, 151.25");
    }
}
