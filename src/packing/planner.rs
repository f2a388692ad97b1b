//! Packing plan orchestration
//!
//! Runs the four stages in order:
//!
//! 1. location and weather resolution (falls back to a text parse on any failure)
//! 2. outfit planning
//! 3. checklist aggregation
//! 4. hero image lookup
//!
//! Each stage's prompt embeds the previous stage's output. Stages 2 to 4
//! have no fallback: the first failure ends the run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{Instrument, debug, info, warn};

use super::{fallback, prompts};
use crate::config::PipelineConfig;
use crate::error::{PackwiseError, Stage};
use crate::llm::{GenerateRequest, Generation, ModelError, ModelService};
use crate::models::{
    OutfitPlan, PackingChecklist, PackingPlanResult, PackingRequest, ResolutionSource,
    ResolvedLocation,
};
use crate::schema::OutputSchema;
use crate::telemetry;

/// Tuning knobs for a planner
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerOptions {
    /// Upper bound on each stage's model call
    pub stage_timeout: Duration,
    /// Run stages 3 and 4 concurrently
    pub parallel_finish: bool,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for PlannerOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            stage_timeout: config.stage_timeout(),
            parallel_finish: config.parallel_finish,
        }
    }
}

/// Stage 1 output, real or substituted
#[derive(Debug, Clone, PartialEq)]
pub struct LocationWeather {
    pub location: ResolvedLocation,
    pub weather: String,
    pub source: ResolutionSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationWeatherOutput {
    location: ResolvedLocation,
    weather_forecast: String,
}

/// Produces packing plans against an injected model service
pub struct PackingPlanner {
    model: Arc<dyn ModelService>,
    options: PlannerOptions,
}

impl PackingPlanner {
    pub fn new(model: Arc<dyn ModelService>) -> Self {
        Self::with_options(model, PlannerOptions::default())
    }

    pub fn with_options(model: Arc<dyn ModelService>, options: PlannerOptions) -> Self {
        Self { model, options }
    }

    #[must_use]
    pub fn options(&self) -> &PlannerOptions {
        &self.options
    }

    /// Run the full pipeline for `request`
    ///
    /// Invalid input is rejected before any model call. A stage 1 failure is
    /// absorbed by the fallback; any later failure is returned as
    /// [`PackwiseError::Stage`].
    pub async fn produce_packing_plan(&self, request: PackingRequest) -> crate::Result<PackingPlanResult> {
        request.validate()?;

        let span = telemetry::plan_span(request.number_of_days);
        let started = Instant::now();
        let outcome = self.run(&request).instrument(span.clone()).await;

        let resolution = outcome.as_ref().ok().map(|plan| match plan.resolution {
            ResolutionSource::Model => "model",
            ResolutionSource::Fallback => "fallback",
        });
        telemetry::record_plan_result(
            &span,
            outcome.is_ok(),
            resolution,
            started.elapsed().as_millis() as u64,
        );
        outcome
    }

    async fn run(&self, request: &PackingRequest) -> crate::Result<PackingPlanResult> {
        info!(
            location = %request.location,
            days = request.number_of_days,
            preferences = %request.preferences,
            "Producing packing plan"
        );

        let resolved = self.resolve_location_weather(request).await;
        let dates = request.trip_dates();
        let outfit_plan = self.plan_outfits(&resolved.weather, &dates, &request.preferences).await?;

        let destination = match resolved.source {
            ResolutionSource::Model => resolved.location.to_string(),
            ResolutionSource::Fallback => request.location.trim().to_string(),
        };
        let (checklist, hero_image_url) = if self.options.parallel_finish {
            tokio::try_join!(
                self.aggregate_checklist(&outfit_plan),
                self.find_hero_image(&destination)
            )?
        } else {
            let checklist = self.aggregate_checklist(&outfit_plan).await?;
            let hero_image_url = self.find_hero_image(&destination).await?;
            (checklist, hero_image_url)
        };

        info!(
            items = checklist.items.len(),
            total_quantity = checklist.total_quantity(),
            "Packing plan ready"
        );

        Ok(PackingPlanResult {
            location: resolved.location,
            number_of_days: request.number_of_days,
            weather_forecast: resolved.weather,
            hero_image_url,
            checklist,
            outfit_plan,
            resolution: resolved.source,
        })
    }

    /// Stage 1, never fails
    pub async fn resolve_location_weather(&self, request: &PackingRequest) -> LocationWeather {
        let generate = GenerateRequest::new(prompts::location_weather_prompt(
            request.location.trim(),
            request.number_of_days,
        ))
        .with_tools(prompts::location_weather_tools())
        .with_output(prompts::location_weather_schema())
        .with_sampling(prompts::location_weather_sampling());

        let schema = prompts::location_weather_schema();
        let outcome = self
            .invoke(Stage::LocationWeather, generate)
            .await
            .and_then(|generation| structured::<LocationWeatherOutput>(&generation, &schema));

        match outcome {
            Ok(output) => LocationWeather {
                location: ResolvedLocation::new(
                    output.location.city.trim(),
                    output.location.state.trim(),
                ),
                weather: output.weather_forecast.trim().to_string(),
                source: ResolutionSource::Model,
            },
            Err(e) => {
                warn!(error = %e, "Location and weather resolution failed, using fallback");
                let location = fallback::parse_location(&request.location);
                let weather = fallback::weather_summary(&location, request.number_of_days);
                LocationWeather {
                    location,
                    weather,
                    source: ResolutionSource::Fallback,
                }
            }
        }
    }

    /// Stage 2
    pub async fn plan_outfits(
        &self,
        weather: &str,
        dates: &[String],
        preferences: &str,
    ) -> crate::Result<OutfitPlan> {
        let generate = GenerateRequest::new(prompts::outfit_prompt(weather, dates, preferences))
            .with_system(prompts::STYLIST_SYSTEM)
            .with_output(prompts::outfit_schema())
            .with_sampling(prompts::outfit_sampling());

        let schema = prompts::outfit_schema();
        let stage = Stage::OutfitPlanning;
        let generation = self
            .invoke(stage, generate)
            .await
            .map_err(|e| PackwiseError::stage(stage, e))?;
        let mut plan: OutfitPlan =
            structured(&generation, &schema).map_err(|e| PackwiseError::stage(stage, e))?;

        let expected = dates.len();
        if plan.len() < expected {
            return Err(PackwiseError::stage(
                stage,
                ModelError::InvalidResponse(format!(
                    "expected {expected} outfits, got {}",
                    plan.len()
                )),
            ));
        }
        if plan.len() > expected {
            warn!(expected, got = plan.len(), "Model planned extra outfits, truncating");
            plan.truncate(expected);
        }
        Ok(plan)
    }

    /// Stage 3
    pub async fn aggregate_checklist(&self, outfit_plan: &OutfitPlan) -> crate::Result<PackingChecklist> {
        let stage = Stage::ChecklistAggregation;
        let plan_json = serde_json::to_string_pretty(outfit_plan)
            .map_err(|e| PackwiseError::stage(stage, e.into()))?;

        let generate = GenerateRequest::new(prompts::checklist_prompt(&plan_json))
            .with_output(prompts::checklist_schema())
            .with_sampling(prompts::checklist_sampling());

        let schema = prompts::checklist_schema();
        let generation = self
            .invoke(stage, generate)
            .await
            .map_err(|e| PackwiseError::stage(stage, e))?;
        let checklist: PackingChecklist =
            structured(&generation, &schema).map_err(|e| PackwiseError::stage(stage, e))?;
        Ok(checklist.consolidate())
    }

    /// Stage 4
    pub async fn find_hero_image(&self, destination: &str) -> crate::Result<String> {
        let generate = GenerateRequest::new(prompts::hero_image_prompt(destination))
            .with_tools(prompts::hero_image_tools())
            .with_sampling(prompts::hero_image_sampling());

        let generation = self
            .invoke(Stage::HeroImage, generate)
            .await
            .map_err(|e| PackwiseError::stage(Stage::HeroImage, e))?;

        let url = generation.text.trim().to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            warn!(%url, "Hero image result does not look like a URL");
        }
        Ok(url)
    }

    /// One model call with timeout, span and diagnostics
    async fn invoke(&self, stage: Stage, request: GenerateRequest) -> Result<Generation, ModelError> {
        let span = telemetry::stage_span(stage);
        let started = Instant::now();
        debug!(parent: &span, prompt = %request.prompt, tools = ?request.tools, "Stage request");

        let timeout = self.options.stage_timeout;
        let outcome = match tokio::time::timeout(timeout, self.model.generate(request))
            .instrument(span.clone())
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(timeout)),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(generation) => {
                debug!(parent: &span, output = %generation.text, "Stage output");
                telemetry::record_stage_result(&span, true, generation.tool_calls, elapsed_ms);
            }
            Err(e) => {
                debug!(parent: &span, error = %e, "Stage failed");
                telemetry::record_stage_result(&span, false, 0, elapsed_ms);
            }
        }
        outcome
    }
}

/// Validate structured output against `schema` and deserialize it
fn structured<T: DeserializeOwned>(generation: &Generation, schema: &OutputSchema) -> Result<T, ModelError> {
    let data = generation.data.as_ref().ok_or_else(|| {
        ModelError::InvalidResponse(format!("no structured output for {}", schema.name))
    })?;
    schema.shape.validate(data)?;
    Ok(serde_json::from_value(data.clone())?)
}
