//! Model-invocation client
//!
//! The planner talks to the generative model only through [`ModelService`].
//! [`OpenAiCompatibleService`] is the production implementation.

use std::sync::Arc;

use tracing::debug;

mod error;
mod openai;
mod service;
mod types;

pub use error::ModelError;
pub use openai::{OpenAiCompatibleService, extract_json};
pub use service::ModelService;
#[cfg(test)]
pub use service::mock;
pub use types::{GenerateRequest, Generation, SamplingConfig};

use crate::config::PackwiseConfig;
use crate::tools::ToolRegistry;

/// Build the model service described by `config`, with all tools registered
pub fn create_service(config: &PackwiseConfig) -> Result<Arc<dyn ModelService>, ModelError> {
    debug!(base_url = %config.model.base_url, model = %config.model.model, "create_service: called");
    let tools = ToolRegistry::from_config(&config.tools).map_err(|e| ModelError::Tool {
        name: "registry".to_string(),
        message: e.to_string(),
    })?;
    debug!(tools = ?tools.names(), "create_service: tools registered");
    let service = OpenAiCompatibleService::new(&config.model, Arc::new(tools))?;
    Ok(Arc::new(service))
}
