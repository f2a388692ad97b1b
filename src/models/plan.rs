//! Final packing plan returned to callers

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::{OutfitPlan, PackingChecklist, ResolvedLocation};

/// Where the location and weather data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Resolved by the model through geocoding and forecast tools
    Model,
    /// Parsed from the request text after the model call failed
    Fallback,
}

/// Everything the planner produced for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingPlanResult {
    pub location: ResolvedLocation,
    pub number_of_days: u32,
    pub weather_forecast: String,
    pub hero_image_url: String,
    pub checklist: PackingChecklist,
    pub outfit_plan: OutfitPlan,
    pub resolution: ResolutionSource,
}

impl Display for PackingPlanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "🧳 {}-day trip to {}", self.number_of_days, self.location)?;
        writeln!(f, "   🌦️ {}", self.weather_forecast)?;
        if self.resolution == ResolutionSource::Fallback {
            writeln!(f, "   ⚠️ Live weather unavailable, using a generic forecast")?;
        }
        writeln!(f, "   🖼️ {}", self.hero_image_url)?;

        writeln!(f)?;
        writeln!(f, "👕 Outfits")?;
        for day in &self.outfit_plan.outfits {
            writeln!(f, "   {}: {}", day.date, day.outfit)?;
        }

        writeln!(f)?;
        writeln!(f, "✅ Checklist")?;
        for item in &self.checklist.items {
            write!(f, "   [ ] {} x{}", item.name, item.quantity)?;
            if item.optional {
                write!(f, " (optional)")?;
            }
            if let Some(notes) = &item.notes {
                write!(f, " - {notes}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
