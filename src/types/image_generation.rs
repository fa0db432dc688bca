use serde::{Deserialize, Serialize};

/// Request body for the image generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageGenerateParams {
    /// The image model, e.g. `dall-e-3`.
    pub model: String,

    /// What to draw.
    pub prompt: String,

    /// Number of images to generate.
    pub n: u32,

    /// Size as `WIDTHxHEIGHT`.
    pub size: String,

    /// `vivid` or `natural`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,

    /// `standard` or `hd`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl ImageGenerateParams {
    /// Create parameters for a single image.
    pub fn new(
        model: impl Into<String>,
        prompt: impl Into<String>,
        size: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            n: 1,
            size: size.into(),
            style: None,
            quality: None,
        }
    }

    /// Set the style.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Set the quality.
    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = Some(quality.into());
        self
    }
}

/// One generated image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Where the image can be downloaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// The prompt the model actually used, when it rewrote ours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,

    /// Inline image data when requested as base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
}

impl ImageDescriptor {
    /// Create a descriptor pointing at `url`.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Attach a revised prompt.
    pub fn with_revised_prompt(mut self, revised_prompt: impl Into<String>) -> Self {
        self.revised_prompt = Some(revised_prompt.into());
        self
    }
}

/// Response body of the image generation endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImagesResponse {
    /// Unix timestamp of creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,

    /// The generated images.
    #[serde(default)]
    pub data: Vec<ImageDescriptor>,
}
