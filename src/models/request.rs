//! Caller input for one packing plan run

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::PackwiseError;

/// Longest trip the planner accepts
pub const MAX_TRIP_DAYS: u32 = 30;

/// What the traveller asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingRequest {
    /// Trip length in days
    pub number_of_days: u32,
    /// Free-text destination, e.g. "Paris, France"
    pub location: String,
    /// Free-text style preferences
    #[serde(default)]
    pub preferences: String,
    /// First day of the trip; today when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl PackingRequest {
    pub fn new(number_of_days: u32, location: impl Into<String>, preferences: impl Into<String>) -> Self {
        Self {
            number_of_days,
            location: location.into(),
            preferences: preferences.into(),
            start_date: None,
        }
    }

    #[must_use]
    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Reject malformed input before any model call is made
    pub fn validate(&self) -> crate::Result<()> {
        if self.number_of_days == 0 {
            return Err(PackwiseError::validation("number of days must be at least 1"));
        }
        if self.number_of_days > MAX_TRIP_DAYS {
            return Err(PackwiseError::validation(format!(
                "number of days cannot exceed {MAX_TRIP_DAYS}"
            )));
        }
        if self.location.trim().is_empty() {
            return Err(PackwiseError::validation("Location cannot be empty"));
        }
        Ok(())
    }

    /// One ISO date per trip day, starting at `start_date` or today
    #[must_use]
    pub fn trip_dates(&self) -> Vec<String> {
        let start = self.start_date.unwrap_or_else(|| Local::now().date_naive());
        (0..i64::from(self.number_of_days))
            .map(|offset| (start + Duration::days(offset)).format("%Y-%m-%d").to_string())
            .collect()
    }
}
