//! Error types and handling for the packing planner

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::llm::ModelError;

/// Pipeline stage of a packing plan run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    LocationWeather,
    OutfitPlanning,
    ChecklistAggregation,
    HeroImage,
}

impl Stage {
    /// Short machine name, used for span fields and API error bodies
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::LocationWeather => "location_weather",
            Stage::OutfitPlanning => "outfit_planning",
            Stage::ChecklistAggregation => "checklist_aggregation",
            Stage::HeroImage => "hero_image",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::LocationWeather => "Location and weather resolution",
            Stage::OutfitPlanning => "Outfit planning",
            Stage::ChecklistAggregation => "Checklist aggregation",
            Stage::HeroImage => "Hero image lookup",
        };
        f.write_str(label)
    }
}

/// Main error type for the packing planner
#[derive(Error, Debug)]
pub enum PackwiseError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Caller input rejected before any model call
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A pipeline stage without a fallback failed
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: ModelError,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl PackwiseError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Wrap a model error with the stage it happened in
    #[must_use]
    pub fn stage(stage: Stage, source: ModelError) -> Self {
        Self::Stage { stage, source }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// The failed stage, if this error came out of the pipeline
    #[must_use]
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            PackwiseError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PackwiseError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            PackwiseError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            PackwiseError::Stage { stage, source } if source.is_timeout() => {
                format!("{stage} timed out. Please try again later.")
            }
            PackwiseError::Stage { stage, source } if source.is_bad_output() => {
                format!("{stage} failed. The model returned unusable data.")
            }
            PackwiseError::Stage { stage, .. } => {
                format!("{stage} failed. The model service may be unavailable.")
            }
            PackwiseError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            PackwiseError::General { message } => message.clone(),
        }
    }
}
