use serde::{Deserialize, Serialize};

use super::errors::{ApiError, ApiResult};

/// Prefix prepended to the caller's text by the sentence endpoint.
pub const SENTENCE_PREFIX: &str = "Your input was: ";

/// Fixed message returned by the random delay endpoint.
pub const DELAY_MESSAGE: &str = "Response after random delay";

/// Request body for `POST /api/v1/sentence`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Response body for `POST /api/v1/sentence`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceResponse {
    pub sentence: String,
}

/// Response body for `GET /api/v1/random-delay`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayedResponse {
    pub message: String,
    pub delay_ms: u64,
}

impl SentenceRequest {
    /// Decode a raw request body. An absent or malformed payload is an
    /// `InvalidInput`; a payload without usable text is `EmptyText`.
    pub fn from_body(body: &[u8]) -> ApiResult<Self> {
        serde_json::from_slice(body).map_err(|_| ApiError::InvalidInput)
    }

    /// Turn the request into the echoed sentence.
    pub fn into_sentence(self) -> ApiResult<SentenceResponse> {
        match self.text {
            Some(text) if !text.is_empty() => Ok(SentenceResponse {
                sentence: format!("{}{}", SENTENCE_PREFIX, text),
            }),
            _ => Err(ApiError::EmptyText),
        }
    }
}

impl DelayedResponse {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            message: DELAY_MESSAGE.to_string(),
            delay_ms,
        }
    }
}
