//! Deterministic stand-ins for stage 1 output

use crate::models::ResolvedLocation;

pub const UNKNOWN_CITY: &str = "Unknown City";
pub const UNKNOWN_STATE: &str = "Unknown State";

/// Split "City, State" on the first comma
///
/// Missing or blank segments become [`UNKNOWN_CITY`] / [`UNKNOWN_STATE`].
#[must_use]
pub fn parse_location(location: &str) -> ResolvedLocation {
    let mut segments = location.split(',').map(str::trim);
    let city = segments.next().filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_CITY);
    let state = segments.next().filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_STATE);
    ResolvedLocation::new(city, state)
}

/// Generic weather text used when no forecast could be fetched
#[must_use]
pub fn weather_summary(location: &ResolvedLocation, days: u32) -> String {
    let day_word = if days == 1 { "day" } else { "days" };
    format!(
        "A live forecast for {}, {} is unavailable, so plan for typical seasonal conditions over the next {} {}. \
Pack versatile layers and a light rain layer in case the weather turns.",
        location.city, location.state, days, day_word
    )
}
