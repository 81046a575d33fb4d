use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::session::Role;

/// One message in the dialogue model's running context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: Role,
    pub content: String,
}

/// Running message log shared by the dialogue stage and the context-append stages.
///
/// Doubles as the fallback transcript source when the capture buffer is empty.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    messages: Arc<Mutex<Vec<ContextMessage>>>,
}

impl ConversationContext {
    /// Create a context seeded with a single system message
    pub fn seeded(system_prompt: &str) -> Self {
        Self {
            messages: Arc::new(Mutex::new(vec![ContextMessage {
                role: Role::System,
                content: system_prompt.to_string(),
            }])),
        }
    }

    pub async fn push(&self, role: Role, content: impl Into<String>) {
        let mut messages = self.messages.lock().await;
        messages.push(ContextMessage {
            role,
            content: content.into(),
        });
    }

    pub async fn messages(&self) -> Vec<ContextMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }
}
