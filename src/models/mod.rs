//! Data models for the packing planner
//!
//! This module contains the core domain models organized by concern:
//! - Request: caller input and its validation
//! - Location: resolved city and state
//! - Outfit: the day-by-day outfit plan
//! - Checklist: aggregated packing items and their consolidation
//! - Plan: the final result handed back to callers

pub mod checklist;
pub mod location;
pub mod outfit;
pub mod plan;
pub mod request;

// Re-export all public types for convenient access
pub use checklist::{ChecklistItem, PackingChecklist};
pub use location::ResolvedLocation;
pub use outfit::{DayOutfit, OutfitPlan};
pub use plan::{PackingPlanResult, ResolutionSource};
pub use request::{MAX_TRIP_DAYS, PackingRequest};
