//! The four-stage packing plan pipeline

pub mod fallback;
pub mod planner;
pub mod prompts;

pub use planner::{LocationWeather, PackingPlanner, PlannerOptions};
