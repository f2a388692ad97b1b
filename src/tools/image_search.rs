//! Image search tool backed by the Google Custom Search JSON API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{IMAGE_SEARCH_TOOL, Tool, ToolError, check_status, str_arg};
use crate::config::ImageSearchConfig;
use crate::schema::{Field, Shape};

/// Finds a representative image URL for a text query
pub struct ImageSearchTool {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    engine_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    title: Option<String>,
    image: Option<ImageMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageMeta {
    context_link: Option<String>,
}

/// Top image hit handed back to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageHit {
    pub url: String,
    pub title: Option<String>,
    pub context_link: Option<String>,
}

impl SearchResponse {
    fn first_hit(self) -> Option<ImageHit> {
        self.items?.into_iter().next().map(|item| ImageHit {
            url: item.link,
            title: item.title,
            context_link: item.image.and_then(|meta| meta.context_link),
        })
    }
}

impl ImageSearchTool {
    pub fn new(http: Client, config: &ImageSearchConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            engine_id: config.engine_id.clone(),
        }
    }

    fn request_url(&self, query: &str) -> Result<String, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ToolError::Config("image search API key is not set".to_string()))?;
        let engine_id = self
            .engine_id
            .as_deref()
            .ok_or_else(|| ToolError::Config("image search engine id is not set".to_string()))?;
        Ok(format!(
            "{}?key={}&cx={}&q={}&searchType=image&num=1&safe=active",
            self.base_url,
            urlencoding::encode(api_key),
            urlencoding::encode(engine_id),
            urlencoding::encode(query)
        ))
    }

    pub async fn search(&self, query: &str) -> Result<ImageHit, ToolError> {
        let url = self.request_url(query)?;
        debug!(query, "Image search request");

        let response = check_status(self.http.get(url).send().await?).await?;
        let parsed: SearchResponse = response.json().await?;
        parsed
            .first_hit()
            .ok_or_else(|| ToolError::NotFound(format!("No images found for: {query}")))
    }
}

#[async_trait]
impl Tool for ImageSearchTool {
    fn name(&self) -> &str {
        IMAGE_SEARCH_TOOL
    }

    fn description(&self) -> &str {
        "Search the web for an image and return the URL of the best match."
    }

    fn parameters(&self) -> Shape {
        Shape::object([Field::required("query", Shape::NonEmptyString)
            .describe("What the image should show, e.g. \"Eiffel Tower Paris\"")])
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let query = str_arg(&args, "query")?;
        let hit = self.search(query).await?;
        info!("Image search for '{}' returned {}", query, hit.url);
        Ok(serde_json::to_value(hit)?)
    }
}
