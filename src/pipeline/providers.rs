use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use super::context::ConversationContext;
use super::processor::FrameProcessor;
use crate::session::ProviderSelection;

pub type StageFactory =
    Arc<dyn Fn(&ProviderSelection) -> Result<Box<dyn FrameProcessor>> + Send + Sync>;

pub type DialogueFactory = Arc<
    dyn Fn(&ProviderSelection, ConversationContext) -> Result<Box<dyn FrameProcessor>>
        + Send
        + Sync,
>;

/// Provider stages the assembler can build, keyed by provider tag.
///
/// Concrete vendor clients live outside this crate and register here.
#[derive(Default, Clone)]
pub struct StageRegistry {
    recognition: HashMap<String, StageFactory>,
    dialogue: HashMap<String, DialogueFactory>,
    synthesis: HashMap<String, StageFactory>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_recognition<F>(&mut self, provider: &str, factory: F) -> &mut Self
    where
        F: Fn(&ProviderSelection) -> Result<Box<dyn FrameProcessor>> + Send + Sync + 'static,
    {
        self.recognition.insert(provider.to_string(), Arc::new(factory));
        self
    }

    pub fn register_dialogue<F>(&mut self, provider: &str, factory: F) -> &mut Self
    where
        F: Fn(&ProviderSelection, ConversationContext) -> Result<Box<dyn FrameProcessor>>
            + Send
            + Sync
            + 'static,
    {
        self.dialogue.insert(provider.to_string(), Arc::new(factory));
        self
    }

    pub fn register_synthesis<F>(&mut self, provider: &str, factory: F) -> &mut Self
    where
        F: Fn(&ProviderSelection) -> Result<Box<dyn FrameProcessor>> + Send + Sync + 'static,
    {
        self.synthesis.insert(provider.to_string(), Arc::new(factory));
        self
    }

    pub fn recognition(&self, provider: &str) -> Option<&StageFactory> {
        self.recognition.get(provider)
    }

    pub fn dialogue(&self, provider: &str) -> Option<&DialogueFactory> {
        self.dialogue.get(provider)
    }

    pub fn synthesis(&self, provider: &str) -> Option<&StageFactory> {
        self.synthesis.get(provider)
    }

    pub fn is_empty(&self) -> bool {
        self.recognition.is_empty() && self.dialogue.is_empty() && self.synthesis.is_empty()
    }
}
