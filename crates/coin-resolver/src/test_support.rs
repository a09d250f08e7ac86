//! Test support: a language-model provider that replays scripted replies.
//!
//! Extraction steps only care about the text a model returns, so tests
//! script those texts in order and inspect the prompts that were sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use advisor_core::{Completion, GenerationOptions, LlmError, LlmProvider, Message};
use async_trait::async_trait;

enum Reply {
    Text(String),
    Fail(String),
}

/// Replies are consumed in order; once exhausted every call answers `none`
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for reply in replies {
            provider.push_reply(reply);
        }
        provider
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Reply::Text(text.into()));
        }
    }

    /// Queue a provider failure
    pub fn push_failure(&self, message: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Reply::Fail(message.into()));
        }
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Messages sent with each completion request, oldest first
    pub fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn health_check(&self) -> advisor_core::Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> advisor_core::Result<Completion> {
        let reply = {
            let mut prompts = self
                .prompts
                .lock()
                .map_err(|_| LlmError::Other("scripted provider lock poisoned".into()))?;
            prompts.push(messages.to_vec());

            let mut replies = self
                .replies
                .lock()
                .map_err(|_| LlmError::Other("scripted provider lock poisoned".into()))?;
            replies.pop_front()
        };

        match reply {
            Some(Reply::Text(text)) => Ok(Completion::text(&options.model, text)),
            Some(Reply::Fail(message)) => Err(LlmError::ProviderUnavailable(message)),
            None => Ok(Completion::text(&options.model, "none")),
        }
    }
}
