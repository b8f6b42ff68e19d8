use covey_core::Tool;
use std::sync::Arc;
use tracing::debug;

/// Ordered collection of tools with case-insensitive lookup.
///
/// Agents show tools to the model in registry order, so insertion order is
/// preserved. Adding a tool whose name matches an existing one (ignoring
/// case) replaces it in place.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Add a tool using the builder pattern.
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.add(tool);
        self
    }

    /// Add a tool that is already shared with other owners.
    pub fn with_shared(mut self, tool: Arc<dyn Tool>) -> Self {
        self.add_shared(tool);
        self
    }

    pub fn add(&mut self, tool: impl Tool + 'static) {
        self.add_shared(Arc::new(tool));
    }

    pub fn add_shared(&mut self, tool: Arc<dyn Tool>) {
        match self.position(tool.name()) {
            Some(idx) => {
                debug!(tool = %tool.name(), "Replacing registered tool");
                self.tools[idx] = tool;
            }
            None => self.tools.push(tool),
        }
    }

    /// Remove a tool by name. Returns `true` if a tool was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.tools.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Look a tool up, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.position(name).map(|idx| Arc::clone(&self.tools[idx]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Prompt block describing every tool and its arguments.
    ///
    /// Returns an empty string for an empty registry.
    pub fn describe(&self) -> String {
        if self.tools.is_empty() {
            return String::new();
        }

        let mut out = String::from("You have access to the following tools:\n\n");
        for tool in &self.tools {
            out.push_str(&format!("- {}: {}\n", tool.name(), tool.description()));
            let schema = tool.args_schema();
            if !schema.is_empty()
                && let Ok(rendered) = serde_json::to_string_pretty(schema)
            {
                out.push_str(&format!("  Arguments: {rendered}\n"));
            }
        }
        out
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools
            .iter()
            .position(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl FromIterator<Arc<dyn Tool>> for ToolRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Tool>>>(iter: I) -> Self {
        let mut registry = ToolRegistry::new();
        for tool in iter {
            registry.add_shared(tool);
        }
        registry
    }
}
