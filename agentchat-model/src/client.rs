//! Gemini `streamGenerateContent` client.

use crate::error::{
    BadPartSnafu, BadResponseSnafu, BuildClientSnafu, ConstructUrlSnafu, DeserializeSnafu,
    InvalidApiKeySnafu, MissingApiKeySnafu, PerformRequestSnafu, Result,
};
use crate::request::{GenerateContentRequest, GenerationInput};
use crate::response::{GenerationResponse, ResponseFragment};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::{
    Client, Response,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use snafu::{OptionExt, ResultExt};
use std::pin::Pin;
use tracing::Instrument;
use url::Url;

/// Environment variables checked for an API key, in order.
pub const API_KEY_VARS: [&str; 3] = ["GOOGLE_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// Root of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// First non-empty API key from the environment.
pub fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

/// A finite, non-restartable sequence of reply fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<ResponseFragment>> + Send>>;

/// Produces a streamed reply for one chat turn.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_stream(&self, input: GenerationInput) -> Result<FragmentStream>;
}

async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let description = response.text().await.ok();
        BadResponseSnafu { code: status.as_u16(), description }.fail()
    } else {
        Ok(response)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiTextClient {
    http_client: Client,
    base_url: Url,
}

impl GeminiTextClient {
    pub fn new(api_key: impl AsRef<str>) -> Result<Self> {
        let headers = HeaderMap::from_iter([(
            HeaderName::from_static("x-goog-api-key"),
            HeaderValue::from_str(api_key.as_ref()).context(InvalidApiKeySnafu)?,
        )]);
        let http_client =
            Client::builder().default_headers(headers).build().context(BuildClientSnafu)?;
        let base_url =
            Url::parse(DEFAULT_BASE_URL).context(ConstructUrlSnafu { suffix: DEFAULT_BASE_URL })?;
        Ok(Self { http_client, base_url })
    }

    /// Build a client from `GOOGLE_API_KEY`, `GEMINI_API_KEY` or `API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = api_key_from_env().context(MissingApiKeySnafu)?;
        Self::new(api_key)
    }

    /// Point the client at another API root, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    fn build_url(&self, model: &str, endpoint: &str) -> Result<Url> {
        let suffix = format!("models/{}:{}", model.trim_start_matches("models/"), endpoint);
        self.base_url.join(&suffix).context(ConstructUrlSnafu { suffix })
    }
}

#[async_trait]
impl TextGenerator for GeminiTextClient {
    async fn generate_stream(&self, input: GenerationInput) -> Result<FragmentStream> {
        let model = input.model();
        let request = GenerateContentRequest::from(&input);
        let mut url = self.build_url(model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");

        let span = agentchat_telemetry::model_call_span(model);
        let response = async move {
            tracing::debug!(turns = request.contents.len(), "Sending generation request");
            let response = self
                .http_client
                .post(url.clone())
                .json(&request)
                .send()
                .await
                .context(PerformRequestSnafu { url })?;
            check_response(response).await
        }
        .instrument(span)
        .await?;

        let stream = response
            .bytes_stream()
            .eventsource()
            .map(|event| event.context(BadPartSnafu))
            .and_then(|event| async move {
                serde_json::from_str::<GenerationResponse>(&event.data).context(DeserializeSnafu)
            })
            .map_ok(ResponseFragment::from);

        Ok(Box::pin(stream))
    }
}
