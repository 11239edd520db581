//! Chat orchestration for the Calmly companion.
//!
//! One turn runs `awaiting-input -> generating -> responded`. A message that
//! trips the crisis detector jumps straight to `responded` with the fixed
//! safety script and never reaches the generation endpoint.
//!
//! Generation failures are never surfaced: the student always gets a reply,
//! and the full transcript is persisted after every turn.

use std::fmt;
use std::time::Duration;

use askama::Template;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use calmly_core::{MessageKind, RequestContext, crisis};

use crate::db::ChatHistoryStore;
use crate::error::AppError;
use crate::genai::{GenerationError, TextGenerator};
use crate::models::ChatMessage;
use crate::random::{RandomSource, choose};

/// Persona prompt for the companion.
#[derive(Template)]
#[template(path = "chat/system_prompt.txt")]
struct SystemPromptTemplate;

/// Render the persona prompt.
fn render_system_prompt() -> String {
    // Static template with no variables.
    SystemPromptTemplate.render().unwrap_or_else(|_| {
        String::from(
            "You are Calmly AI, a warm, empathetic mental health assistant for students. \
             The following is the conversation history:",
        )
    })
}

/// Replies used when generation fails or returns nothing usable.
pub const FALLBACK_REPLIES: [&str; 4] = [
    "I hear you and appreciate your openness. You’re not alone.",
    "Your feelings are valid. How can I support you today?",
    "Thank you for sharing. Feel free to tell me more when ready.",
    "I'm here to listen. What's on your mind?",
];

/// Reply used when the endpoint answers with a non-success status.
pub const TROUBLE_CONNECTING: &str =
    "I'm having a little trouble connecting right now. Please try again soon.";

/// Longest message a student can send in one turn.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Where a turn's reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Generated,
    Fallback,
    Crisis,
}

/// Turn state, logged as the orchestrator advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitingInput,
    Generating,
    Responded,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitingInput => "awaiting-input",
            Self::Generating => "generating",
            Self::Responded => "responded",
        })
    }
}

/// The two entries a turn appended, plus how the reply was produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub user_message: ChatMessage,
    pub reply: ChatMessage,
    pub source: ReplySource,
}

/// Build the single-string prompt sent to the generation endpoint.
///
/// The client-side `welcome` greeting is not part of the conversation.
#[must_use]
pub fn build_prompt(persona: &str, history: &[ChatMessage], new_message: &str) -> String {
    let transcript = history
        .iter()
        .filter(|m| !m.is_welcome())
        .map(|m| {
            let prefix = if m.is_bot { "AI:" } else { "User:" };
            format!("{prefix} {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{persona}\n\n{transcript}\nUser: {new_message}\nAI:")
}

pub struct ChatOrchestrator<'a, S, G, R> {
    store: &'a S,
    generator: &'a G,
    random: &'a R,
    timeout: Duration,
}

impl<'a, S, G, R> ChatOrchestrator<'a, S, G, R>
where
    S: ChatHistoryStore,
    G: TextGenerator,
    R: RandomSource,
{
    #[must_use]
    pub const fn new(store: &'a S, generator: &'a G, random: &'a R, timeout: Duration) -> Self {
        Self {
            store,
            generator,
            random,
            timeout,
        }
    }

    /// The caller's transcript, empty when none is stored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the store fails.
    pub async fn history(&self, ctx: &RequestContext) -> Result<Vec<ChatMessage>, AppError> {
        Ok(self.store.load_history(ctx.user_id).await?)
    }

    /// Run one chat turn and persist the resulting transcript.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank message, or an oversized one
    /// without crisis language, and
    /// `AppError::Persistence` if the transcript cannot be loaded or saved.
    /// Generation failures are absorbed into a fallback reply.
    #[instrument(skip(self, ctx, message), fields(user_id = %ctx.user_id))]
    pub async fn send_turn(
        &self,
        ctx: &RequestContext,
        message: &str,
    ) -> Result<TurnOutcome, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::validation("Missing message"));
        }

        // Crisis language always gets the safety script, whatever the length.
        let in_crisis = crisis::is_crisis(message);
        if !in_crisis && message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::validation(format!(
                "Message must be at most {MAX_MESSAGE_CHARS} characters"
            )));
        }

        debug!(phase = %Phase::AwaitingInput, "Chat turn started");
        let mut transcript = self.store.load_history(ctx.user_id).await?;

        let (kind, reply, source) = if in_crisis {
            warn!("Crisis language detected, returning safety script");
            (
                MessageKind::Crisis,
                crisis::SAFETY_MESSAGE.to_string(),
                ReplySource::Crisis,
            )
        } else {
            debug!(phase = %Phase::Generating, "Requesting reply");
            let prompt = build_prompt(&render_system_prompt(), &transcript, message);
            let (reply, source) = self.generate_reply(&prompt).await;
            (MessageKind::Normal, reply, source)
        };

        let user_message = ChatMessage::from_user(message, kind, Utc::now());
        let reply = ChatMessage::from_bot(reply, kind, Utc::now());
        transcript.push(user_message.clone());
        transcript.push(reply.clone());

        self.store.save_history(ctx.user_id, &transcript).await?;

        info!(
            phase = %Phase::Responded,
            source = ?source,
            transcript_len = transcript.len(),
            "Chat turn completed"
        );

        Ok(TurnOutcome {
            user_message,
            reply,
            source,
        })
    }

    /// One bounded call to the generator; never fails.
    async fn generate_reply(&self, prompt: &str) -> (String, ReplySource) {
        let result = tokio::time::timeout(self.timeout, self.generator.generate(prompt))
            .await
            .unwrap_or(Err(GenerationError::Timeout(self.timeout)))
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(GenerationError::EmptyResponse)
                } else {
                    Ok(text)
                }
            });

        match result {
            Ok(text) => (text, ReplySource::Generated),
            Err(e) if e.is_api_refusal() => {
                warn!(error = %e, "Generation endpoint refused the request");
                (TROUBLE_CONNECTING.to_string(), ReplySource::Fallback)
            }
            Err(e) => {
                warn!(error = %e, "Generation failed, using fallback reply");
                (self.fallback_reply().to_string(), ReplySource::Fallback)
            }
        }
    }

    fn fallback_reply(&self) -> &'static str {
        choose(self.random, &FALLBACK_REPLIES).copied().unwrap_or(FALLBACK_REPLIES[0])
    }

    /// Replace the caller's transcript with a client-supplied one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation("Missing messages")` when no transcript
    /// was supplied.
    pub async fn save_transcript(
        &self,
        ctx: &RequestContext,
        messages: Option<Vec<ChatMessage>>,
    ) -> Result<usize, AppError> {
        let messages = messages.ok_or_else(|| AppError::validation("Missing messages"))?;
        self.store.save_history(ctx.user_id, &messages).await?;
        Ok(messages.len())
    }

    /// Delete the caller's transcript.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Persistence` if the store fails.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.user_id))]
    pub async fn clear(&self, ctx: &RequestContext) -> Result<(), AppError> {
        self.store.clear_history(ctx.user_id).await?;
        info!("Chat history cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(millis: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_prompt_layout() {
        let history = vec![
            ChatMessage {
                id: "welcome".to_string(),
                content: "Hello Riya!".to_string(),
                is_bot: true,
                timestamp: at(1),
                kind: MessageKind::Normal,
            },
            ChatMessage::from_user("I can't sleep", MessageKind::Normal, at(2)),
            ChatMessage::from_bot("That sounds hard.", MessageKind::Normal, at(3)),
        ];

        let prompt = build_prompt("PERSONA", &history, "exams are close");
        assert_eq!(
            prompt,
            "PERSONA\n\nUser: I can't sleep\nAI: That sounds hard.\nUser: exams are close\nAI:"
        );
    }

    #[test]
    fn test_prompt_with_empty_history() {
        assert_eq!(build_prompt("P", &[], "hi"), "P\n\n\nUser: hi\nAI:");
    }

    #[test]
    fn test_system_prompt_renders() {
        let persona = render_system_prompt();
        assert!(persona.starts_with("You are Calmly AI"));
        assert!(persona.trim_end().ends_with("conversation history:"));
    }

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::AwaitingInput.to_string(), "awaiting-input");
        assert_eq!(Phase::Responded.to_string(), "responded");
    }
}
