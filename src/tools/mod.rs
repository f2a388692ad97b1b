//! Tools the model may call while generating
//!
//! Each tool is a named capability with a JSON argument shape. The model
//! service advertises the requested tools to the model and dispatches the
//! model's tool calls through a [`ToolRegistry`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::config::ToolsConfig;
use crate::schema::Shape;

pub mod forecast;
pub mod geocoding;
pub mod image_search;

pub use forecast::ForecastTool;
pub use geocoding::GeocodeTool;
pub use image_search::ImageSearchTool;

/// Tool name for location text to coordinates
pub const GEOCODE_TOOL: &str = "geocode_location";
/// Tool name for coordinates and day count to forecast
pub const FORECAST_TOOL: &str = "get_weather_forecast";
/// Tool name for query text to image URL
pub const IMAGE_SEARCH_TOOL: &str = "search_images";

/// Errors raised while executing a tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Tool not configured: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A capability the model can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// Shape of the JSON arguments object
    fn parameters(&self) -> Shape;
    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

/// Tools available to the model service, keyed by name
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with geocoding, forecast and image search wired to `config`
    pub fn from_config(config: &ToolsConfig) -> Result<Self, ToolError> {
        let http = http_client(Duration::from_secs(config.timeout_seconds.into()))?;
        let mut registry = Self::new();
        registry.register(GeocodeTool::new(http.clone(), &config.geocoding_base_url));
        registry.register(ForecastTool::new(http.clone(), &config.weather_base_url));
        registry.register(ImageSearchTool::new(http, &config.image_search));
        Ok(registry)
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        debug!(tool = tool.name(), "ToolRegistry::register");
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// OpenAI-style function definition for a registered tool
    pub fn definition(&self, name: &str) -> Option<Value> {
        self.tools.get(name).map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name(),
                    "description": tool.description(),
                    "parameters": tool.parameters().to_json_schema(),
                }
            })
        })
    }
}

/// Shared HTTP client for tool backends
pub fn http_client(timeout: Duration) -> Result<Client, ToolError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("Packwise/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Read a required string argument
pub(crate) fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("'{name}' must be a non-empty string")))
}

/// Read a required numeric argument, accepting numbers sent as strings
pub(crate) fn f64_arg(args: &Value, name: &str) -> Result<f64, ToolError> {
    match args.get(name) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ToolError::InvalidArguments(format!("'{name}' must be a number")))
}

/// Turn a non-success HTTP response into a [`ToolError::Api`]
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ToolError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(ToolError::Api { status, message })
}
