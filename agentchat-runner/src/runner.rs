use crate::error::{Result, RunnerError};
use agentchat_core::{
    Agent, ChatMessage, ChatMessagePart, GeoLocation, GroundingChunk, InlineData, Integration,
    MessageUpdate, Role, now_millis,
};
use agentchat_memory::ChatMemory;
use agentchat_model::{GenerationInput, TextGenerator};
use agentchat_telemetry::{Instrument, chat_turn_span};
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct RunnerConfig {
    pub generator: Arc<dyn TextGenerator>,
    pub memory: Arc<ChatMemory>,
    pub integrations: Vec<Integration>,
    pub friendly_mode: bool,
    pub location: Option<GeoLocation>,
}

/// Text written into the reply when a turn fails.
pub fn error_reply(error: &impl std::fmt::Display) -> String {
    format!("Sorry, I encountered an error: {}", error)
}

pub struct ChatRunner {
    generator: Arc<dyn TextGenerator>,
    memory: Arc<ChatMemory>,
    integrations: Vec<Integration>,
    friendly_mode: bool,
    location: Option<GeoLocation>,
    last_stamp: AtomicI64,
}

impl ChatRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            generator: config.generator,
            memory: config.memory,
            integrations: config.integrations,
            friendly_mode: config.friendly_mode,
            location: config.location,
            last_stamp: AtomicI64::new(0),
        }
    }

    pub fn memory(&self) -> &Arc<ChatMemory> {
        &self.memory
    }

    /// Run one turn and return the finished reply.
    pub async fn send_message(
        &self,
        agent: &Agent,
        prompt: &str,
        image: Option<InlineData>,
    ) -> Result<ChatMessage> {
        self.send_message_with(agent, prompt, image, |_| {}).await
    }

    /// Like [`send_message`](Self::send_message), calling `on_text` with the
    /// accumulated reply text each time it grows.
    ///
    /// Generation failures do not surface as errors: the reply carries an
    /// apology with the failure message instead. Only an empty turn is
    /// rejected, before anything is written.
    pub async fn send_message_with<F>(
        &self,
        agent: &Agent,
        prompt: &str,
        image: Option<InlineData>,
        mut on_text: F,
    ) -> Result<ChatMessage>
    where
        F: FnMut(&str) + Send,
    {
        let has_text = !prompt.trim().is_empty();
        if !has_text && image.is_none() {
            return Err(RunnerError::EmptyTurn);
        }

        let history = self.memory.messages(&agent.id).await;

        let stamp = self.next_stamp();
        let mut parts = Vec::new();
        if has_text {
            parts.push(ChatMessagePart::text(prompt));
        }
        if let Some(image) = &image {
            parts.push(ChatMessagePart::inline_data(&image.mime_type, &image.data));
        }
        let model_id = format!("model-{}", stamp);
        self.memory
            .add_message(&agent.id, ChatMessage::new(format!("user-{}", stamp), Role::User, parts))
            .await;
        self.memory.add_message(&agent.id, ChatMessage::thinking(&model_id)).await;

        let mut input = GenerationInput::new(agent.clone(), prompt)
            .with_history(history)
            .with_friendly_mode(self.friendly_mode)
            .with_integrations(self.integrations.clone())
            .with_location(self.location);
        if let Some(image) = image {
            input = input.with_image(image);
        }

        let span = chat_turn_span(&agent.id);
        let streamed =
            self.stream_reply(&agent.id, &model_id, input, &mut on_text).instrument(span).await;

        let update = match streamed {
            Ok((text, grounding_chunks)) => {
                let text = if text.is_empty() { " ".to_string() } else { text };
                MessageUpdate::text(text)
                    .with_grounding_chunks(grounding_chunks.unwrap_or_default())
                    .finished()
            }
            Err(e) => {
                tracing::error!(agent.id = %agent.id, error = %e, "Chat turn failed");
                MessageUpdate::text(error_reply(&e)).finished()
            }
        };

        let mut reply = ChatMessage::thinking(&model_id);
        reply.apply(update.clone());
        self.memory.update_message(&agent.id, &model_id, update).await;
        Ok(reply)
    }

    /// Stream the reply into the placeholder. Returns the full text and the
    /// grounding chunks of the last fragment.
    async fn stream_reply<F>(
        &self,
        agent_id: &str,
        model_id: &str,
        input: GenerationInput,
        on_text: &mut F,
    ) -> Result<(String, Option<Vec<GroundingChunk>>)>
    where
        F: FnMut(&str) + Send,
    {
        let mut stream = self.generator.generate_stream(input).await?;
        let mut full_text = String::new();
        let mut grounding_chunks = None;

        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            if let Some(text) = fragment.text.as_deref().filter(|t| !t.is_empty()) {
                full_text.push_str(text);
                self.memory
                    .update_message(agent_id, model_id, MessageUpdate::text(&full_text).finished())
                    .await;
                on_text(&full_text);
            }
            grounding_chunks = fragment.grounding_chunks;
        }

        tracing::debug!(chars = full_text.len(), "Reply complete");
        Ok((full_text, grounding_chunks))
    }

    /// Millisecond stamp for message ids, strictly increasing per runner.
    fn next_stamp(&self) -> i64 {
        let now = now_millis();
        let previous = self
            .last_stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}
