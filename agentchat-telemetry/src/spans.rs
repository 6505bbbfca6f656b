//! Span helpers for common agentchat operations.

use tracing::Span;

/// Create a span covering one realtime voice session.
///
/// # Example
/// ```
/// use agentchat_telemetry::live_session_span;
/// let span = live_session_span("session-1", "gemini-live");
/// let _enter = span.enter();
/// ```
pub fn live_session_span(session_id: &str, model_name: &str) -> Span {
    tracing::info_span!(
        "live.session",
        session.id = session_id,
        model.name = model_name,
        otel.kind = "client"
    )
}

/// Create a span for model API calls.
///
/// # Example
/// ```
/// use agentchat_telemetry::model_call_span;
/// let span = model_call_span("gemini-2.5-flash");
/// let _enter = span.enter();
/// ```
pub fn model_call_span(model_name: &str) -> Span {
    tracing::info_span!("model.call", model.name = model_name, otel.kind = "client")
}

/// Create a span for one chat turn with a persona.
pub fn chat_turn_span(agent_id: &str) -> Span {
    tracing::info_span!("chat.turn", agent.id = agent_id, otel.kind = "internal")
}
