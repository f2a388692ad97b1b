use std::sync::Arc;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::{PackingPlanResult, PackingPlanner, PackingRequest, PackwiseError};

#[derive(Serialize)]
pub struct ApiHealth {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
}

/// Maps planner errors onto HTTP responses
pub struct ApiError(PackwiseError);

impl From<PackwiseError> for ApiError {
    fn from(err: PackwiseError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(PackwiseError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PackwiseError::Validation { .. } => StatusCode::BAD_REQUEST,
            PackwiseError::Stage { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Packing plan request failed");
        } else {
            warn!(error = %self.0, "Packing plan request rejected");
        }
        let body = ApiErrorBody {
            error: self.0.user_message(),
            stage: self.0.failed_stage().map(|stage| stage.as_str()),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(planner: Arc<PackingPlanner>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/packing-plan", post(create_packing_plan))
        .with_state(planner)
}

async fn health() -> Json<ApiHealth> {
    Json(ApiHealth {
        status: "ok",
        version: crate::VERSION,
    })
}

async fn create_packing_plan(
    State(planner): State<Arc<PackingPlanner>>,
    payload: Result<Json<PackingRequest>, JsonRejection>,
) -> Result<Json<PackingPlanResult>, ApiError> {
    let Json(request) = payload?;
    let plan = planner.produce_packing_plan(request).await?;
    Ok(Json(plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedModel;
    use crate::llm::{Generation, ModelError};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(model: Arc<ScriptedModel>) -> Router {
        router(Arc::new(PackingPlanner::new(model)))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_plan(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/packing-plan")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::new(ScriptedModel::new(vec![])))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_invalid_days_is_bad_request() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let response = app(model.clone())
            .oneshot(post_plan(json!({ "numberOfDays": 0, "location": "Tokyo" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("at least 1"));
        assert!(body.get("stage").is_none());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_negative_days_is_bad_request() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let response = app(model.clone())
            .oneshot(post_plan(json!({ "numberOfDays": -1, "location": "Tokyo" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
        assert!(body["error"].as_str().unwrap().contains("numberOfDays"));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_location_is_bad_request() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let response = app(model.clone())
            .oneshot(post_plan(json!({ "numberOfDays": 3 })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("location"));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stage_failure_is_bad_gateway() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(ModelError::InvalidResponse("nothing".to_string())),
            Err(ModelError::InvalidResponse("nothing".to_string())),
        ]));
        let response = app(model)
            .oneshot(post_plan(json!({ "numberOfDays": 2, "location": "Paris" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["stage"], "outfit_planning");
    }

    #[tokio::test]
    async fn test_successful_plan() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(Generation::structured(json!({
                "location": { "city": "Paris", "state": "Île-de-France" },
                "weatherForecast": "Mild and dry. A light breeze in the evening."
            }))),
            Ok(Generation::structured(json!({
                "outfits": [{ "date": "2026-10-18", "outfit": "Chinos and a knit sweater" }]
            }))),
            Ok(Generation::structured(json!({
                "items": [{ "name": "Chinos", "quantity": 1, "applicableDates": ["2026-10-18"] }]
            }))),
            Ok(Generation::text("https://example.com/louvre.jpg")),
        ]));
        let response = app(model)
            .oneshot(post_plan(json!({
                "numberOfDays": 1,
                "location": "Paris",
                "preferences": "smart casual",
                "startDate": "2026-10-18"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["location"]["city"], "Paris");
        assert_eq!(body["numberOfDays"], 1);
        assert_eq!(body["heroImageUrl"], "https://example.com/louvre.jpg");
        assert_eq!(body["resolution"], "model");
        assert_eq!(body["checklist"]["items"][0]["name"], "Chinos");
    }
}
