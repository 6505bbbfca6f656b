use eventsource_stream::EventStreamError;
use reqwest::header::InvalidHeaderValue;
use snafu::Snafu;
use url::Url;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to parse API key"))]
    InvalidApiKey { source: InvalidHeaderValue },

    #[snafu(display("no API key found in GOOGLE_API_KEY, GEMINI_API_KEY or API_KEY"))]
    MissingApiKey,

    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl { source: url::ParseError, suffix: String },

    #[snafu(display("failed to build HTTP client"))]
    BuildClient { source: reqwest::Error },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// HTTP error description
        description: Option<String>,
    },

    #[snafu(display("failed to obtain stream SSE part"))]
    BadPart { source: EventStreamError<reqwest::Error> },

    #[snafu(display("failed to deserialize JSON response"))]
    Deserialize { source: serde_json::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
