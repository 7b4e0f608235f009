use chrono::Utc;
use serde::{Deserialize, Serialize};

pub use super::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to or from the model. Content is always the raw, unformatted text.
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: String,
}

impl Message {
    /// Create a new user message with the current timestamp
    pub fn user<S: Into<String>>(text: S) -> Self {
        Message {
            role: Role::User,
            created: Utc::now().timestamp(),
            content: text.into(),
        }
    }

    /// Create a new assistant message with the current timestamp
    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Message {
            role: Role::Assistant,
            created: Utc::now().timestamp(),
            content: text.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// The reasoning channel text of one assistant turn, possibly empty
pub struct ReasoningRecord {
    pub content: String,
}

impl ReasoningRecord {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_roles() {
        assert!(Message::user("hi").is_user());
        assert!(Message::assistant("hello").is_assistant());
        assert!(!Message::assistant("hello").is_user());
    }

    #[test]
    fn test_message_serialization() -> anyhow::Result<()> {
        let message = Message::assistant("x = 2");
        let value = serde_json::to_value(&message)?;
        assert_eq!(value["role"], json!("assistant"));
        assert_eq!(value["content"], json!("x = 2"));

        let back: Message = serde_json::from_value(value)?;
        assert_eq!(back, message);
        Ok(())
    }
}
