//! Google Maps link parsing
//!
//! Shared links come in several shapes; the most precise marker wins:
//! 1. `…!8m2!3d{lat}!4d{lng}…` place pin
//! 2. `…/@{lat},{lng},{zoom}z…` map viewport centre
//! 3. `?q={lat},{lng}` or `?q={place name}`
//! 4. `&d={lat},{lng}`

use reqwest::Url;

use crate::types::Coordinates;

/// What a location reference tells us before any network call
#[derive(Debug, Clone, PartialEq)]
pub enum LocationHint {
    Coordinates(Coordinates),
    /// Needs forward geocoding
    Query(String),
}

/// Parse `"lat,lng"` / `"lat, lng"`
pub fn parse_coordinate_pair(text: &str) -> Option<Coordinates> {
    let (lat, lng) = text.trim().split_once(',')?;
    let lat = parse_number(lat.trim())?;
    let lng = parse_number(lng.trim())?;
    Some(Coordinates::new(lat, lng)).filter(Coordinates::is_valid)
}

/// Full google.com/maps link, no redirect needed
pub fn is_full_maps_url(reference: &str) -> bool {
    reference.starts_with("https://www.google.com/maps")
        || reference.starts_with("https://maps.google.com/")
}

pub fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Extract coordinates or a place query from an expanded maps URL
pub fn extract_location(url: &str) -> Option<LocationHint> {
    if let Some(coords) = marker_pair(url, "8m2!3d", "!4d") {
        return Some(LocationHint::Coordinates(coords));
    }

    if let Some(coords) = marker_pair(url, "/@", ",") {
        return Some(LocationHint::Coordinates(coords));
    }

    if let Some(q) = query_param(url, "q") {
        let q = q.trim();
        if let Some(coords) = parse_coordinate_pair(q) {
            return Some(LocationHint::Coordinates(coords));
        }
        if !q.is_empty() {
            return Some(LocationHint::Query(q.to_string()));
        }
    }

    query_param(url, "d")
        .and_then(|d| parse_coordinate_pair(&d))
        .map(LocationHint::Coordinates)
}

/// `{prefix}{number}{separator}{number}` anywhere in `text`
fn marker_pair(text: &str, prefix: &str, separator: &str) -> Option<Coordinates> {
    let start = text.find(prefix)? + prefix.len();
    let (lat, rest) = take_number(&text[start..])?;
    let rest = rest.strip_prefix(separator)?;
    let (lng, _) = take_number(rest)?;
    Some(Coordinates::new(lat, lng)).filter(Coordinates::is_valid)
}

fn take_number(text: &str) -> Option<(f64, &str)> {
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || c == '-' || c == '.'))
        .unwrap_or(text.len());
    let value = parse_number(&text[..end])?;
    Some((value, &text[end..]))
}

fn parse_number(text: &str) -> Option<f64> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.') {
        return None;
    }
    text.parse().ok()
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
