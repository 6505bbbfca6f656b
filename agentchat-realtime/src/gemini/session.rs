use crate::config::LiveConfig;
use crate::error::{RealtimeError, Result};
use crate::events::{AudioPayload, MediaFrame, ServerContent, ServerEvent};
use crate::session::RealtimeSession;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{connect_async, tungstenite::Message};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = futures::stream::SplitSink<WsStream, Message>;
type WsSource = futures::stream::SplitStream<WsStream>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiClientMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    setup: Option<GeminiSetup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    realtime_input: Option<GeminiRealtimeInput>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiSetup {
    model: String,
    generation_config: GeminiGenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_audio_transcription: Option<EmptyConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_audio_transcription: Option<EmptyConfig>,
}

#[derive(Debug, Clone, Serialize)]
struct EmptyConfig {}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    response_modalities: Vec<String>,
    speech_config: GeminiSpeechConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiSpeechConfig {
    voice_config: GeminiVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiVoiceConfig {
    prebuilt_voice_config: GeminiPrebuiltVoice,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPrebuiltVoice {
    voice_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRealtimeInput {
    media_chunks: Vec<MediaFrame>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiServerMessage {
    setup_complete: Option<serde_json::Value>,
    server_content: Option<GeminiServerContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiServerContent {
    model_turn: Option<GeminiContent>,
    #[serde(default)]
    turn_complete: bool,
    #[serde(default)]
    interrupted: bool,
    input_transcription: Option<GeminiTranscription>,
    output_transcription: Option<GeminiTranscription>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiTranscription {
    #[serde(default)]
    text: String,
}

fn setup_message(model: &str, config: LiveConfig) -> GeminiClientMessage {
    let model = if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    };
    GeminiClientMessage {
        setup: Some(GeminiSetup {
            model,
            generation_config: GeminiGenerationConfig {
                response_modalities: config.response_modalities,
                speech_config: GeminiSpeechConfig {
                    voice_config: GeminiVoiceConfig {
                        prebuilt_voice_config: GeminiPrebuiltVoice { voice_name: config.voice },
                    },
                },
            },
            system_instruction: config.instruction.map(|text| GeminiContent {
                parts: vec![GeminiPart { text: Some(text), inline_data: None }],
            }),
            input_audio_transcription: config.input_transcription.then_some(EmptyConfig {}),
            output_audio_transcription: config.output_transcription.then_some(EmptyConfig {}),
        }),
        realtime_input: None,
    }
}

/// Translate one Gemini server message into a [`ServerEvent`].
fn translate_server_message(raw: &str) -> Result<ServerEvent> {
    let message: GeminiServerMessage = serde_json::from_str(raw).inspect_err(|e| {
        tracing::debug!(error = %e, raw, "Unparseable server message");
    })?;

    if message.setup_complete.is_some() {
        return Ok(ServerEvent::SetupComplete);
    }

    let Some(content) = message.server_content else {
        return Ok(ServerEvent::Unknown);
    };

    let audio = content
        .model_turn
        .into_iter()
        .flat_map(|turn| turn.parts)
        .find_map(|part| part.inline_data)
        .map(|inline| AudioPayload { data: inline.data, mime_type: inline.mime_type });

    Ok(ServerEvent::Content(ServerContent {
        input_transcription: content.input_transcription.map(|t| t.text),
        output_transcription: content.output_transcription.map(|t| t.text),
        turn_complete: content.turn_complete,
        audio,
        interrupted: content.interrupted,
    }))
}

/// Gemini Live session.
///
/// Manages a WebSocket connection to Google's Gemini Live API.
pub struct GeminiLiveSession {
    session_id: String,
    connected: Arc<AtomicBool>,
    sender: Arc<Mutex<WsSink>>,
    receiver: Arc<Mutex<WsSource>>,
}

impl GeminiLiveSession {
    /// Connect to the Live API and send the setup message.
    pub async fn connect(
        endpoint: &str,
        api_key: &str,
        model: &str,
        config: LiveConfig,
    ) -> Result<Self> {
        let url = format!("{}?key={}", endpoint, api_key);
        let request = url.into_client_request().map_err(|e| {
            RealtimeError::connection(format!("Failed to create client request: {}", e))
        })?;
        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| RealtimeError::connection(format!("WebSocket connect error: {}", e)))?;

        let (sink, source) = stream.split();
        let session = Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            connected: Arc::new(AtomicBool::new(true)),
            sender: Arc::new(Mutex::new(sink)),
            receiver: Arc::new(Mutex::new(source)),
        };

        tracing::info!(model_id = %model, session_id = %session.session_id, "Sending setup message");
        session.send_raw(&setup_message(model, config)).await?;
        Ok(session)
    }

    async fn send_raw<T: Serialize>(&self, value: &T) -> Result<()> {
        let msg = serde_json::to_string(value)?;

        let mut sender = self.sender.lock().await;
        sender
            .send(Message::Text(msg.into()))
            .await
            .map_err(|e| RealtimeError::connection(format!("Send error: {}", e)))
    }

    async fn receive_raw(&self) -> Option<Result<ServerEvent>> {
        let mut receiver = self.receiver.lock().await;

        match receiver.next().await {
            Some(Ok(Message::Text(text))) => Some(translate_server_message(&text)),
            Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                Ok(text) => Some(translate_server_message(text)),
                Err(e) => Some(Err(RealtimeError::protocol(format!(
                    "Invalid UTF-8 in binary message: {}",
                    e
                )))),
            },
            Some(Ok(Message::Close(frame))) => {
                tracing::debug!(?frame, "Gemini closed the session");
                self.connected.store(false, Ordering::SeqCst);
                None
            }
            Some(Ok(_)) => Some(Ok(ServerEvent::Unknown)),
            Some(Err(e)) => {
                self.connected.store(false, Ordering::SeqCst);
                Some(Err(RealtimeError::connection(format!("Receive error: {}", e))))
            }
            None => {
                self.connected.store(false, Ordering::SeqCst);
                None
            }
        }
    }
}

#[async_trait]
impl RealtimeSession for GeminiLiveSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send_media(&self, frame: MediaFrame) -> Result<()> {
        if !self.is_connected() {
            return Err(RealtimeError::NotConnected);
        }
        let msg = GeminiClientMessage {
            setup: None,
            realtime_input: Some(GeminiRealtimeInput { media_chunks: vec![frame] }),
        };
        self.send_raw(&msg).await
    }

    async fn next_event(&self) -> Option<Result<ServerEvent>> {
        self.receive_raw().await
    }

    async fn close(&self) -> Result<()> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Err(RealtimeError::SessionClosed);
        }

        let mut sender = self.sender.lock().await;
        sender
            .send(Message::Close(None))
            .await
            .map_err(|e| RealtimeError::connection(format!("Close error: {}", e)))
    }
}

impl std::fmt::Debug for GeminiLiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiLiveSession")
            .field("session_id", &self.session_id)
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish()
    }
}
