//! ModelService trait definition

use async_trait::async_trait;

use super::{GenerateRequest, Generation, ModelError};

/// Stateless model-invocation service
///
/// Every call is independent: the prompt, optional system text, tool list,
/// output shape and sampling settings travel with the request. Tool calls
/// requested by the model are resolved inside `generate`.
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<Generation, ModelError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tracing::debug;

    /// Replays queued outcomes in order and records every request
    #[derive(Default)]
    pub struct ScriptedModel {
        outcomes: Mutex<VecDeque<Result<Generation, ModelError>>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedModel {
        pub fn new(outcomes: Vec<Result<Generation, ModelError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn requests(&self) -> Vec<GenerateRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelService for ScriptedModel {
        async fn generate(&self, request: GenerateRequest) -> Result<Generation, ModelError> {
            debug!(prompt_len = request.prompt.len(), "ScriptedModel::generate: called");
            self.requests.lock().unwrap().push(request);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ModelError::InvalidResponse("No more scripted outcomes".to_string())))
        }
    }

    #[tokio::test]
    async fn test_scripted_model_replays_in_order() {
        let model = ScriptedModel::new(vec![
            Ok(Generation::text("first")),
            Err(ModelError::InvalidResponse("second".to_string())),
        ]);

        let first = model.generate(GenerateRequest::new("a")).await.unwrap();
        assert_eq!(first.text, "first");
        assert!(model.generate(GenerateRequest::new("b")).await.is_err());
        assert!(model.generate(GenerateRequest::new("c")).await.is_err());
        assert_eq!(model.call_count(), 3);
        assert_eq!(model.requests()[1].prompt, "b");
    }
}
