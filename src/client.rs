use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::env;
use std::time::Duration;
use url::Url;

use crate::chat::{API_KEY_VAR, ChatBackend};
use crate::error::{Error, Result};
use crate::types::{ChatCompletion, ChatCompletionParams, ImageGenerateParams, ImagesResponse};

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
const IMAGE_GENERATIONS_PATH: &str = "images/generations";

/// Client for the OpenAI-compatible completion and image APIs.
#[derive(Debug, Clone)]
pub struct OpenAi {
    api_key: String,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl OpenAi {
    /// Create a new client.
    ///
    /// The API key can be provided directly or read from the
    /// AI_ASSISTANT_OPENAI_API_KEY environment variable.
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `base_url` must be an absolute URL; a missing trailing slash is added so
    /// endpoint paths join underneath it.
    pub fn with_options(
        api_key: Option<String>,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = match api_key.filter(|key| !key.is_empty()) {
            Some(key) => key,
            None => env::var(API_KEY_VAR)
                .ok()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    Error::authentication(format!(
                        "API key not provided and {API_KEY_VAR} environment variable not set"
                    ))
                })?,
        };

        let base_url = parse_base_url(base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            api_key,
            client,
            base_url,
            timeout,
        })
    }

    /// The base every endpoint path is joined to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::authentication("API key contains invalid header characters"))?;
        headers.insert(header::AUTHORIZATION, bearer);
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        match response.text().await {
            Ok(body) => error_from_status(status_code, &body, retry_after),
            Err(e) => Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            ),
        }
    }

    async fn post_json<P, R>(&self, path: &str, params: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(path)?;

        let response = self
            .client
            .post(url)
            .headers(self.default_headers()?)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {}", e),
                        Some(self.timeout.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<R>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Send the transcript to the chat completion endpoint.
    pub async fn create_chat_completion(
        &self,
        params: &ChatCompletionParams,
    ) -> Result<ChatCompletion> {
        self.post_json(CHAT_COMPLETIONS_PATH, params).await
    }

    /// Ask the image endpoint to generate images.
    pub async fn generate_image(&self, params: &ImageGenerateParams) -> Result<ImagesResponse> {
        self.post_json(IMAGE_GENERATIONS_PATH, params).await
    }
}

#[async_trait::async_trait]
impl ChatBackend for OpenAi {
    async fn create_chat_completion(&self, params: ChatCompletionParams) -> Result<ChatCompletion> {
        OpenAi::create_chat_completion(self, &params).await
    }

    async fn generate_image(&self, params: ImageGenerateParams) -> Result<ImagesResponse> {
        OpenAi::generate_image(self, &params).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{raw} cannot be used as a base URL"), None));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Map a non-success status and its body onto an [`Error`].
///
/// The body is expected to look like
/// `{"error": {"message": ..., "type": ..., "param": ..., "code": ...}}`; any
/// other body is used verbatim as the message.
fn error_from_status(status_code: u16, body: &str, retry_after: Option<u64>) -> Error {
    #[derive(Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(rename = "type")]
        error_type: Option<String>,
        message: Option<String>,
        param: Option<String>,
    }

    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error);
    let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
    let param = detail.as_ref().and_then(|e| e.param.clone());
    let message = detail
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.to_string());

    match status_code {
        400 => Error::bad_request(message, param),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message),
        408 => Error::timeout(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, error_type, message),
    }
}
