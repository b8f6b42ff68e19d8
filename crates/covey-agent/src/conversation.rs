//! Conversation state fed to the model.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Prefix used when the conversation is flattened into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered list of messages for one agent run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    pub fn system(&mut self, content: impl Into<String>) {
        self.push(Role::System, content);
    }

    pub fn user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content);
    }

    pub fn assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Flatten into a single prompt.
    ///
    /// Every message becomes `"<Role>: <content>\n\n"` and the prompt ends
    /// with `"Assistant: "` so the model continues as the assistant.
    pub fn render_prompt(&self) -> String {
        let mut prompt = String::new();
        for message in &self.messages {
            prompt.push_str(message.role.label());
            prompt.push_str(": ");
            prompt.push_str(&message.content);
            prompt.push_str("\n\n");
        }
        prompt.push_str("Assistant: ");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt() {
        let mut conversation = Conversation::new();
        conversation.system("Be brief.");
        conversation.user("Hi");
        conversation.assistant("Hello");
        assert_eq!(
            conversation.render_prompt(),
            "System: Be brief.\n\nUser: Hi\n\nAssistant: Hello\n\nAssistant: "
        );
    }

    #[test]
    fn test_empty_prompt_still_prompts_assistant() {
        assert_eq!(Conversation::new().render_prompt(), "Assistant: ");
    }
}
