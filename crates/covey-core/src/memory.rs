//! Memory capability.

use serde_json::Value;

/// A context provider that agents read from before reasoning and write to
/// after answering.
///
/// Methods take `&self`; implementations shared between agents use interior
/// mutability.
pub trait Memory: Send + Sync {
    /// Record `content`, optionally with structured metadata.
    fn add(&self, content: &str, metadata: Option<Value>);

    /// Render stored content as prompt context. An empty string means there
    /// is nothing worth showing. `query` lets implementations rank entries.
    fn context(&self, query: Option<&str>) -> String;

    /// Forget everything.
    fn clear(&self);
}

/// Memory that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemory;

impl Memory for NoMemory {
    fn add(&self, _content: &str, _metadata: Option<Value>) {}

    fn context(&self, _query: Option<&str>) -> String {
        String::new()
    }

    fn clear(&self) {}
}
