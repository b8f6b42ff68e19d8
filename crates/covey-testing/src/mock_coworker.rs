//! # Mock Coworkers
//!
//! Stand-ins for whole agents when testing team orchestration.

use async_trait::async_trait;
use covey_agent::{AgentError, AgentResult, Coworker};
use covey_core::ModelError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

type Handler = dyn Fn(&str) -> AgentResult<String> + Send + Sync;

#[derive(Default)]
struct Stats {
    tasks: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// A coworker whose answers come from a closure.
///
/// Records every task it receives and the highest number of its runs that
/// were in flight at the same time.
#[derive(Clone)]
pub struct MockCoworker {
    name: String,
    description: String,
    handler: Arc<Handler>,
    delay: Option<Duration>,
    stats: Arc<Stats>,
}

impl MockCoworker {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str) -> AgentResult<String> + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            description: format!("Mock coworker {name}"),
            name,
            handler: Arc::new(handler),
            delay: None,
            stats: Arc::new(Stats::default()),
        }
    }

    /// Always answers `reply`.
    pub fn replying(name: impl Into<String>, reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::new(name, move |_| Ok(reply.clone()))
    }

    /// Always fails with a model error carrying `message`.
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(name, move |_| {
            Err(AgentError::Model(ModelError::Generation(message.clone())))
        })
    }

    /// Wait `delay` before answering. Cancellation interrupts the wait.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Tasks received so far, in arrival order.
    pub fn tasks(&self) -> Vec<String> {
        self.stats
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.tasks().len()
    }

    /// Highest number of concurrent runs observed.
    pub fn peak_concurrency(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Coworker for MockCoworker {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, task: &str, cancel: &CancellationToken) -> AgentResult<String> {
        self.stats
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task.to_string());

        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(now, Ordering::SeqCst);

        let outcome = match self.delay {
            Some(delay) => tokio::select! {
                _ = cancel.cancelled() => Err(AgentError::Cancelled),
                _ = tokio::time::sleep(delay) => (self.handler)(task),
            },
            None if cancel.is_cancelled() => Err(AgentError::Cancelled),
            None => (self.handler)(task),
        };

        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_tasks() {
        let coworker = MockCoworker::new("echo", |task| Ok(format!("seen {task}")));
        let cancel = CancellationToken::new();
        assert_eq!(coworker.run("a", &cancel).await.unwrap(), "seen a");
        assert_eq!(coworker.tasks(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_failing_coworker() {
        let coworker = MockCoworker::failing("bad", "boom");
        let err = coworker.run("x", &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Generation failed: boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_delay() {
        let coworker = MockCoworker::replying("slow", "late").with_delay(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(
            coworker.run("x", &cancel).await,
            Err(AgentError::Cancelled)
        );
    }
}
