//! # Mock Models
//!
//! Models that return predictable output so agent loops can be tested
//! without a real backend.

use async_trait::async_trait;
use covey_core::{GenerationOptions, Model, ModelError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

type Responder = dyn Fn(&str) -> Result<String, ModelError> + Send + Sync;

#[derive(Default)]
struct Script {
    queue: VecDeque<Result<String, ModelError>>,
    prompts: Vec<String>,
    options: Vec<GenerationOptions>,
}

/// A model that replays queued replies in order.
///
/// Once the queue is empty it falls back to the responder, if any, and
/// otherwise fails with [`ModelError::Generation`].
#[derive(Clone)]
pub struct ScriptedModel {
    name: String,
    script: Arc<Mutex<Script>>,
    responder: Option<Arc<Responder>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Arc::new(Mutex::new(Script::default())),
            responder: None,
            delay: None,
        }
    }

    /// A model with the given replies queued.
    pub fn with_replies<I, S>(name: impl Into<String>, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let model = Self::new(name);
        for reply in replies {
            model.push_reply(reply);
        }
        model
    }

    /// A model whose every reply is computed from the prompt.
    pub fn responding<F>(name: impl Into<String>, responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ModelError> + Send + Sync + 'static,
    {
        Self::new(name).with_responder(responder)
    }

    /// Used once the queue runs dry.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ModelError> + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Always reply `reply` once the queue runs dry.
    pub fn with_fallback(self, reply: impl Into<String>) -> Self {
        let reply = reply.into();
        self.with_responder(move |_| Ok(reply.clone()))
    }

    /// Sleep before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.script().queue.push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: ModelError) {
        self.script().queue.push_back(Err(error));
    }

    pub fn call_count(&self) -> usize {
        self.script().prompts.len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.script().prompts.clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.script().prompts.last().cloned()
    }

    /// Sampling options received with each call.
    pub fn options(&self) -> Vec<GenerationOptions> {
        self.script().options.clone()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Model for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ModelError> {
        let queued = {
            let mut script = self.script();
            script.prompts.push(prompt.to_string());
            script.options.push(options.clone());
            script.queue.pop_front()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match (queued, &self.responder) {
            (Some(reply), _) => reply,
            (None, Some(responder)) => responder(prompt),
            (None, None) => Err(ModelError::Generation(format!(
                "{} has no scripted reply left",
                self.name
            ))),
        }
    }
}

/// A model that always fails with the same error.
#[derive(Debug, Clone)]
pub struct FailingModel {
    error: ModelError,
}

impl FailingModel {
    pub fn new(error: ModelError) -> Self {
        Self { error }
    }

    pub fn unavailable() -> Self {
        Self::new(ModelError::Unavailable("mock backend offline".to_string()))
    }
}

#[async_trait]
impl Model for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ModelError> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_then_falls_back() {
        let model = ScriptedModel::with_replies("m", ["one", "two"]).with_fallback("rest");
        let options = GenerationOptions::default();

        assert_eq!(model.generate("a", &options).await.unwrap(), "one");
        assert_eq!(model.generate("b", &options).await.unwrap(), "two");
        assert_eq!(model.generate("c", &options).await.unwrap(), "rest");
        assert_eq!(model.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_exhausted_script_fails() {
        let model = ScriptedModel::new("m");
        let err = model
            .generate("p", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ModelError::Generation(_)));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_history() {
        let model = ScriptedModel::responding("m", |prompt| Ok(prompt.to_uppercase()));
        let clone = model.clone();
        let reply = clone
            .generate("hi", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "HI");
        assert_eq!(model.last_prompt().as_deref(), Some("hi"));
    }
}
