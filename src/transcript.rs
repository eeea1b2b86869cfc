//! Append-only workflow transcript shared by all nodes of one run
//!
//! Every node (dispatcher, specialists, quality gate) appends exactly one
//! tagged message per visit. Messages are never mutated or removed; index 0
//! is always the original user request.

use serde::{Deserialize, Serialize};

/// Message roles in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Assistant,
    System,
}

/// Which node produced a message
///
/// Closed enum instead of the free-text name field the wire formats use;
/// serde carries the wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorTag {
    /// Seed user input (no producing node)
    User,
    Supervisor,
    Validator,
    Order,
    OrderError,
    Support,
    SupportError,
    #[serde(rename = "web_search_node")]
    WebSearch,
    #[serde(rename = "web_search_error")]
    WebSearchError,
    #[serde(rename = "human_node")]
    Human,
}

impl AuthorTag {
    /// Tags produced by routing nodes rather than substantive responders
    pub fn is_control(self) -> bool {
        matches!(self, AuthorTag::Supervisor | AuthorTag::Validator)
    }
}

/// A single immutable transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub tag: AuthorTag,
    pub role: Role,
}

impl Message {
    pub fn new(content: impl Into<String>, tag: AuthorTag, role: Role) -> Self {
        Self {
            content: content.into(),
            tag,
            role,
        }
    }

    /// The seed user request that starts a run
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, AuthorTag::User, Role::Human)
    }
}

/// Ordered, append-only sequence of messages for one workflow run
///
/// Created with the seed request, grows by one message per node visited,
/// dropped when the run terminates. Not shared across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript from the user's request
    pub fn seeded(request: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(request)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The original user request (index 0)
    pub fn seed(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the most recent human-role message; falls back to the seed
    pub fn latest_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Human)
            .or_else(|| self.seed())
            .map(|m| m.content.as_str())
    }

    /// The answer a front end should surface: the last message that is
    /// neither routing chatter nor the seed request itself
    pub fn visible_answer(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| !m.tag.is_control() && m.tag != AuthorTag::User)
    }
}
