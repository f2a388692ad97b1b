//! Prompts, output shapes and sampling settings for each stage

use crate::llm::SamplingConfig;
use crate::schema::{Field, OutputSchema, Shape};
use crate::tools::{FORECAST_TOOL, GEOCODE_TOOL, IMAGE_SEARCH_TOOL};

pub const LOCATION_WEATHER_SCHEMA: &str = "location_weather";
pub const OUTFIT_PLAN_SCHEMA: &str = "outfit_plan";
pub const CHECKLIST_SCHEMA: &str = "packing_checklist";

/// Marker the stylist prompt asks the model to end with
pub const OUTFIT_STOP_MARKER: &str = "<END_OF_PLAN>";

pub const STYLIST_SYSTEM: &str = "You are a professional travel stylist. You plan practical, \
weather-appropriate outfits that respect the traveller's preferences and pack light.";

/// Stage 1: geocode, fetch forecast, summarize
#[must_use]
pub fn location_weather_prompt(location: &str, days: u32) -> String {
    format!(
        "A traveller is going to \"{location}\" for {days} days.\n\
1. Use the {GEOCODE_TOOL} tool to find the coordinates of this location.\n\
2. Use the {FORECAST_TOOL} tool with those coordinates to get the forecast for the next {days} days.\n\
3. From the geocoding result, extract the city and the state (use the region or country when there is no state).\n\
4. Summarize the weather for the whole trip in exactly two sentences.\n\
Respond only with JSON containing location.city, location.state and weatherForecast."
    )
}

#[must_use]
pub fn location_weather_schema() -> OutputSchema {
    OutputSchema::new(
        LOCATION_WEATHER_SCHEMA,
        Shape::object([
            Field::required(
                "location",
                Shape::object([
                    Field::required("city", Shape::NonEmptyString),
                    Field::required("state", Shape::NonEmptyString),
                ]),
            ),
            Field::required("weatherForecast", Shape::NonEmptyString)
                .describe("Exactly two sentences describing the trip's weather"),
        ]),
    )
}

#[must_use]
pub fn location_weather_tools() -> [&'static str; 2] {
    [GEOCODE_TOOL, FORECAST_TOOL]
}

#[must_use]
pub fn location_weather_sampling() -> SamplingConfig {
    SamplingConfig::precise(0.1)
}

/// Stage 2: one outfit per trip day
#[must_use]
pub fn outfit_prompt(weather: &str, dates: &[String], preferences: &str) -> String {
    let preferences = if preferences.trim().is_empty() {
        "none given"
    } else {
        preferences.trim()
    };
    format!(
        "Plan outfits for a {days}-day trip.\n\
Weather forecast: {weather}\n\
Traveller preferences: {preferences}\n\
Trip dates: {dates}\n\n\
Styling rules:\n\
- Plan exactly one outfit for each trip date, in order, using the dates above.\n\
- Every outfit includes a top and a bottom unless it is a dress.\n\
- Layering is encouraged when temperatures change during the day.\n\
- If it is cold or rainy on more than one day, include a jacket.\n\
- If it is sunny, suggest sunglasses or a hat.\n\n\
Return JSON with an \"outfits\" array of objects with \"date\" and \"outfit\", then write {OUTFIT_STOP_MARKER}.",
        days = dates.len(),
        dates = dates.join(", "),
    )
}

#[must_use]
pub fn outfit_schema() -> OutputSchema {
    OutputSchema::new(
        OUTFIT_PLAN_SCHEMA,
        Shape::object([Field::required(
            "outfits",
            Shape::array_of(Shape::object([
                Field::required("date", Shape::NonEmptyString),
                Field::required("outfit", Shape::NonEmptyString)
                    .describe("Full description of what to wear that day"),
            ])),
        )]),
    )
}

#[must_use]
pub fn outfit_sampling() -> SamplingConfig {
    SamplingConfig {
        temperature: Some(0.9),
        top_p: Some(0.95),
        top_k: Some(40),
        max_tokens: Some(2048),
        stop: vec![OUTFIT_STOP_MARKER.to_string()],
    }
}

/// Stage 3: fold the outfit plan into a checklist
#[must_use]
pub fn checklist_prompt(outfit_plan_json: &str) -> String {
    format!(
        "Here is a day-by-day outfit plan as JSON:\n{outfit_plan_json}\n\n\
Turn it into a packing checklist. Consolidate items that repeat across days into a single entry \
and give the exact quantity needed. For each item list the dates it is worn on. Mark accessories \
that are nice to have but not essential as optional, and add short notes only when useful.\n\
Return JSON with an \"items\" array of objects with name, quantity, applicableDates, optional and notes."
    )
}

#[must_use]
pub fn checklist_schema() -> OutputSchema {
    OutputSchema::new(
        CHECKLIST_SCHEMA,
        Shape::object([Field::required(
            "items",
            Shape::array_of(Shape::object([
                Field::required("name", Shape::NonEmptyString),
                Field::required("quantity", Shape::Integer { minimum: Some(0) }),
                Field::required("applicableDates", Shape::array_of(Shape::String)),
                Field::optional("notes", Shape::String),
                Field::optional("optional", Shape::Boolean),
            ])),
        )]),
    )
}

#[must_use]
pub fn checklist_sampling() -> SamplingConfig {
    SamplingConfig::precise(0.2)
}

/// Stage 4: a single image URL for the destination
#[must_use]
pub fn hero_image_prompt(destination: &str) -> String {
    format!(
        "Use the {IMAGE_SEARCH_TOOL} tool to find one photo for a trip to {destination}. \
Prefer a well-known tourist attraction in {destination}; if there is none, use the city skyline. \
Reply with the image URL only, no other text."
    )
}

#[must_use]
pub fn hero_image_tools() -> [&'static str; 1] {
    [IMAGE_SEARCH_TOOL]
}

#[must_use]
pub fn hero_image_sampling() -> SamplingConfig {
    SamplingConfig::precise(0.3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_prompt_mentions_tools() {
        let prompt = location_weather_prompt("Paris, France", 3);
        assert!(prompt.contains("\"Paris, France\""));
        assert!(prompt.contains(GEOCODE_TOOL));
        assert!(prompt.contains(FORECAST_TOOL));
        assert!(prompt.contains("exactly two sentences"));
    }

    #[test]
    fn test_outfit_prompt_lists_dates_and_rules() {
        let dates = vec!["2026-10-18".to_string(), "2026-10-19".to_string()];
        let prompt = outfit_prompt("Cold and rainy.", &dates, "");
        assert!(prompt.contains("2-day trip"));
        assert!(prompt.contains("2026-10-18, 2026-10-19"));
        assert!(prompt.contains("none given"));
        assert!(prompt.contains("include a jacket"));
        assert!(prompt.contains(OUTFIT_STOP_MARKER));
    }

    #[test]
    fn test_outfit_sampling_is_creative_and_bounded() {
        let sampling = outfit_sampling();
        assert!(sampling.temperature.unwrap() > location_weather_sampling().temperature.unwrap());
        assert_eq!(sampling.max_tokens, Some(2048));
        assert_eq!(sampling.stop, vec![OUTFIT_STOP_MARKER.to_string()]);
    }

    #[test]
    fn test_checklist_schema_accepts_model_output() {
        let output = json!({
            "items": [
                { "name": "T-shirt", "quantity": 3, "applicableDates": ["d1", "d2", "d3"], "optional": false },
                { "name": "Sunglasses", "quantity": 1, "applicableDates": [], "notes": "for sunny days" }
            ]
        });
        assert!(checklist_schema().shape.validate(&output).is_ok());

        let broken = json!({ "items": [{ "name": "Hat", "quantity": -1, "applicableDates": [] }] });
        assert!(checklist_schema().shape.validate(&broken).is_err());
    }

    #[test]
    fn test_hero_prompt_prefers_attraction() {
        let prompt = hero_image_prompt("Paris, France");
        assert!(prompt.contains(IMAGE_SEARCH_TOOL));
        assert!(prompt.contains("tourist attraction in Paris, France"));
        assert!(prompt.contains("skyline"));
    }
}
