use serde::{Deserialize, Serialize};

use crate::Error;
use crate::types::ImageDescriptor;

/// What came back from one generation attempt.
///
/// On disk this is either the descriptor object or the error string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ImageResponse {
    /// The first generated image.
    Generated(ImageDescriptor),

    /// The user-facing error text.
    Failed(String),
}

/// A prompt together with what the image endpoint answered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageAttempt {
    /// The prompt as typed by the user.
    pub prompt: String,

    /// The outcome.
    pub response: ImageResponse,
}

impl ImageAttempt {
    /// Returns true if the attempt produced an image.
    pub fn succeeded(&self) -> bool {
        matches!(self.response, ImageResponse::Generated(_))
    }
}

/// An image attempt that has been started but not yet settled.
///
/// Obtain one with [`PendingImage::begin`] before calling the API and turn it
/// into an [`ImageAttempt`] with [`PendingImage::finish`] on every path, so no
/// attempt goes unrecorded.
#[must_use = "a pending image must be finished so the attempt is recorded"]
#[derive(Debug)]
pub struct PendingImage {
    prompt: String,
}

impl PendingImage {
    /// Open an attempt for `prompt`.
    pub fn begin(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    /// The prompt of this attempt.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Settle the attempt with the outcome of the call.
    pub fn finish(self, outcome: &Result<ImageDescriptor, Error>) -> ImageAttempt {
        let response = match outcome {
            Ok(descriptor) => ImageResponse::Generated(descriptor.clone()),
            Err(err) => ImageResponse::Failed(format!("Error creating image: {err}")),
        };
        ImageAttempt {
            prompt: self.prompt,
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn finished_with_descriptor() {
        let pending = PendingImage::begin("a cat");
        let attempt = pending.finish(&Ok(ImageDescriptor::from_url("https://img.example/cat.png")));
        assert!(attempt.succeeded());
        assert_eq!(
            to_value(&attempt).unwrap(),
            json!({"prompt": "a cat", "response": {"url": "https://img.example/cat.png"}})
        );
    }

    #[test]
    fn finished_with_error() {
        let pending = PendingImage::begin("a cat");
        let attempt = pending.finish(&Err(Error::rate_limit("too many images", None)));
        assert!(!attempt.succeeded());
        assert_eq!(
            attempt.response,
            ImageResponse::Failed(
                "Error creating image: Rate limit exceeded: too many images".to_string()
            )
        );
    }

    #[test]
    fn error_string_parses_back() {
        let attempt: ImageAttempt =
            serde_json::from_value(json!({"prompt": "p", "response": "Error creating image: x"}))
                .unwrap();
        assert_eq!(
            attempt.response,
            ImageResponse::Failed("Error creating image: x".to_string())
        );
    }
}
