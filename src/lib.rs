//! Packwise - packing plans from a destination, a trip length and a few preferences
//!
//! This library drives a generative model through four stages (location and
//! weather, outfits, checklist, hero image) and assembles the results into a
//! single [`PackingPlanResult`].

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod packing;
pub mod schema;
pub mod telemetry;
pub mod tools;
pub mod web;

// Re-export core types for public API
pub use crate::config::PackwiseConfig;
pub use error::{PackwiseError, Stage};
pub use llm::{ModelService, create_service};
pub use models::{
    ChecklistItem, DayOutfit, OutfitPlan, PackingChecklist, PackingPlanResult, PackingRequest,
    ResolutionSource, ResolvedLocation,
};
pub use packing::{PackingPlanner, PlannerOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PackwiseError>;
