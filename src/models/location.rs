//! Resolved location model

use std::fmt;

use serde::{Deserialize, Serialize};

/// City and state (or region) a trip is headed to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub city: String,
    pub state: String,
}

impl ResolvedLocation {
    #[must_use]
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
        }
    }
}

impl fmt::Display for ResolvedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let location = ResolvedLocation::new("Paris", "Île-de-France");
        assert_eq!(location.to_string(), "Paris, Île-de-France");
    }

    #[test]
    fn test_deserialize_from_model_output() {
        let location: ResolvedLocation =
            serde_json::from_str(r#"{"city":"Austin","state":"Texas","country":"US"}"#).unwrap();
        assert_eq!(location, ResolvedLocation::new("Austin", "Texas"));
    }
}
