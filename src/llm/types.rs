//! Request and response types for the model service

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::OutputSchema;

/// Sampling knobs forwarded to the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stop: Vec<String>,
}

impl SamplingConfig {
    /// Low-randomness sampling at the given temperature
    #[must_use]
    pub fn precise(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Self::default()
        }
    }
}

/// One call to the model service
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system: Option<String>,
    /// Names of registered tools the model may call
    pub tools: Vec<String>,
    /// Requested structured output; `None` means plain text
    pub output: Option<OutputSchema>,
    pub sampling: SamplingConfig,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            tools: Vec::new(),
            output: None,
            sampling: SamplingConfig::default(),
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: OutputSchema) -> Self {
        self.output = Some(output);
        self
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }
}

/// What the model service produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// Final message text
    pub text: String,
    /// Parsed JSON when structured output was requested
    pub data: Option<Value>,
    /// Number of tool calls executed while generating
    pub tool_calls: usize,
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn structured(data: Value) -> Self {
        Self {
            text: data.to_string(),
            data: Some(data),
            tool_calls: 0,
        }
    }
}
