//! The chat client.
//!
//! [`ChatSession`] owns the transcript and the image attempts of one run and
//! talks to the API through a [`ChatBackend`].

use std::time::Instant;

use crate::chat::config::Config;
use crate::error::{Error, Result};
use crate::observability::{
    CHAT_EMPTY_REPLIES, CHAT_REQUEST_DURATION, CHAT_REQUEST_ERRORS, CHAT_REQUESTS,
    IMAGE_REQUEST_DURATION, IMAGE_REQUEST_ERRORS, IMAGE_REQUESTS,
};
use crate::types::{
    ChatCompletion, ChatCompletionParams, ImageAttempt, ImageDescriptor, ImageGenerateParams,
    ImagesResponse, Message, PendingImage,
};

/// The remote API as seen by a chat session.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Complete the transcript in `params`.
    async fn create_chat_completion(&self, params: ChatCompletionParams) -> Result<ChatCompletion>;

    /// Generate the images described by `params`.
    async fn generate_image(&self, params: ImageGenerateParams) -> Result<ImagesResponse>;
}

/// A chat session holding the conversation state of one run.
///
/// The transcript always starts with a system message and only grows.
pub struct ChatSession<B: ChatBackend> {
    backend: B,
    config: Config,
    messages: Vec<Message>,
    images: Vec<ImageAttempt>,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Creates a session whose transcript holds just the system message.
    pub fn new(backend: B, config: Config) -> Self {
        let messages = vec![Message::system(config.system_message())];
        Self {
            backend,
            config,
            messages,
            images: Vec::new(),
        }
    }

    /// Creates a session continuing `transcript`.
    ///
    /// A system message from `config` is put in front when the transcript
    /// does not already start with one.
    pub fn resume(backend: B, config: Config, transcript: Vec<Message>) -> Self {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        if !transcript.first().is_some_and(Message::is_system) {
            messages.push(Message::system(config.system_message()));
        }
        messages.extend(transcript);
        Self {
            backend,
            config,
            messages,
            images: Vec::new(),
        }
    }

    /// Sends `prompt` and returns the assistant's reply.
    ///
    /// The user message is appended before the request and stays in the
    /// transcript when the request fails.  The reply is appended only when it
    /// is non-empty.
    ///
    /// # Errors
    ///
    /// Returns the API error after logging it.
    pub async fn send_text_chat(&mut self, prompt: &str) -> Result<String> {
        self.messages.push(Message::user(prompt));
        let params = ChatCompletionParams::new(self.config.text_model(), self.messages.clone());

        CHAT_REQUESTS.click();
        let start = Instant::now();
        let outcome = self.backend.create_chat_completion(params).await;
        CHAT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        match outcome {
            Ok(completion) => {
                let reply = completion.reply_text().unwrap_or_default().to_string();
                if reply.is_empty() {
                    CHAT_EMPTY_REPLIES.click();
                } else {
                    self.messages.push(Message::assistant(reply.clone()));
                }
                Ok(reply)
            }
            Err(err) => {
                CHAT_REQUEST_ERRORS.click();
                tracing::error!(
                    error = %err,
                    model = self.config.text_model(),
                    "Error sending message"
                );
                Err(err)
            }
        }
    }

    /// Generates one image for `prompt`.
    ///
    /// Every call records exactly one [`ImageAttempt`], whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the API error, or an empty-response error when no image came
    /// back, after logging it.
    pub async fn create_image(&mut self, prompt: &str) -> Result<ImageDescriptor> {
        let pending = PendingImage::begin(prompt);
        let params = ImageGenerateParams::new(
            self.config.image_model(),
            pending.prompt(),
            self.config.image_size(),
        )
        .with_style(self.config.image_style())
        .with_quality(self.config.image_quality());

        IMAGE_REQUESTS.click();
        let start = Instant::now();
        let outcome = self
            .backend
            .generate_image(params)
            .await
            .and_then(|response| {
                response
                    .data
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::empty_response("no image data returned"))
            });
        IMAGE_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        self.images.push(pending.finish(&outcome));
        if let Err(err) = &outcome {
            IMAGE_REQUEST_ERRORS.click();
            tracing::error!(
                error = %err,
                model = self.config.image_model(),
                "Error creating image"
            );
        }
        outcome
    }

    /// The transcript, system message first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Every image attempt of this session.
    pub fn image_attempts(&self) -> &[ImageAttempt] {
        &self.images
    }

    /// The configuration the session runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns true once there is something worth saving.
    pub fn has_history(&self) -> bool {
        !self.images.is_empty() || self.messages.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::chat::config::keys;
    use crate::types::{ImageResponse, MessageRole};

    #[derive(Default)]
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ChatCompletion>>>,
        images: Mutex<VecDeque<Result<ImagesResponse>>>,
        chat_requests: Mutex<Vec<ChatCompletionParams>>,
        image_requests: Mutex<Vec<ImageGenerateParams>>,
    }

    impl ScriptedBackend {
        fn reply(self, reply: Result<ChatCompletion>) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        fn image(self, image: Result<ImagesResponse>) -> Self {
            self.images.lock().unwrap().push_back(image);
            self
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn create_chat_completion(
            &self,
            params: ChatCompletionParams,
        ) -> Result<ChatCompletion> {
            self.chat_requests.lock().unwrap().push(params);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::internal_server("no scripted reply")))
        }

        async fn generate_image(&self, params: ImageGenerateParams) -> Result<ImagesResponse> {
            self.image_requests.lock().unwrap().push(params);
            self.images
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::internal_server("no scripted image")))
        }
    }

    fn helper_config() -> Config {
        let mut config = Config::new();
        config
            .set(keys::TEXT_MODEL, "gpt-4")
            .set(keys::SYSTEM_MESSAGE, "You are a helper");
        config
    }

    #[test]
    fn new_session_has_system_message() {
        let session = ChatSession::new(ScriptedBackend::default(), helper_config());
        assert_eq!(session.messages(), &[Message::system("You are a helper")]);
        assert!(!session.has_history());
    }

    #[tokio::test]
    async fn hello_hi() {
        let backend = ScriptedBackend::default().reply(Ok(ChatCompletion::with_reply("hi")));
        let mut session = ChatSession::new(backend, helper_config());

        let reply = session.send_text_chat("hello").await.unwrap();
        assert_eq!(reply, "hi");
        assert_eq!(
            session.messages(),
            &[
                Message::system("You are a helper"),
                Message::user("hello"),
                Message::assistant("hi"),
            ]
        );
        assert!(session.has_history());

        let requests = session.backend.chat_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4");
        assert_eq!(requests[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn failed_request_keeps_user_message() {
        let backend =
            ScriptedBackend::default().reply(Err(Error::authentication("Incorrect API key")));
        let mut session = ChatSession::new(backend, helper_config());

        let err = session.send_text_chat("hello").await.unwrap_err();
        assert_eq!(
            format!("Error sending message: {err}"),
            "Error sending message: Authentication error: Incorrect API key"
        );
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[1], Message::user("hello"));
        assert!(
            session
                .messages()
                .iter()
                .all(|m| m.role != MessageRole::Assistant)
        );
    }

    #[tokio::test]
    async fn empty_reply_not_appended() {
        let backend = ScriptedBackend::default().reply(Ok(ChatCompletion::with_reply("")));
        let mut session = ChatSession::new(backend, helper_config());

        assert_eq!(session.send_text_chat("hello").await.unwrap(), "");
        assert_eq!(session.messages().len(), 2);
    }

    #[tokio::test]
    async fn resumed_transcript_is_sent_in_full() {
        let backend = ScriptedBackend::default().reply(Ok(ChatCompletion::with_reply("again")));
        let transcript = vec![
            Message::system("You are a helper"),
            Message::user("hello"),
            Message::assistant("hi"),
        ];
        let mut session = ChatSession::resume(backend, helper_config(), transcript);
        session.send_text_chat("once more").await.unwrap();

        let requests = session.backend.chat_requests.lock().unwrap();
        assert_eq!(requests[0].messages.len(), 4);
        assert_eq!(session.messages().len(), 5);
    }

    #[test]
    fn resume_prepends_missing_system_message() {
        let session = ChatSession::resume(
            ScriptedBackend::default(),
            helper_config(),
            vec![Message::user("hello"), Message::assistant("hi")],
        );
        assert_eq!(session.messages()[0], Message::system("You are a helper"));
        assert_eq!(session.messages().len(), 3);
    }

    #[tokio::test]
    async fn image_attempt_recorded_on_success() {
        let image = ImageDescriptor::from_url("https://img.example/1.png")
            .with_revised_prompt("a red fox in snow");
        let backend = ScriptedBackend::default().image(Ok(ImagesResponse {
            created: Some(1),
            data: vec![image.clone()],
        }));
        let mut config = helper_config();
        config
            .set(keys::IMAGE_MODEL, "dall-e-3")
            .set(keys::IMAGE_SIZE, "1024x1024");
        let mut session = ChatSession::new(backend, config);

        let descriptor = session.create_image("a fox").await.unwrap();
        assert_eq!(descriptor, image);
        assert_eq!(session.image_attempts().len(), 1);
        assert_eq!(
            session.image_attempts()[0].response,
            ImageResponse::Generated(image)
        );
        assert!(session.has_history());

        let requests = session.backend.image_requests.lock().unwrap();
        assert_eq!(requests[0].model, "dall-e-3");
        assert_eq!(requests[0].size, "1024x1024");
        assert_eq!(requests[0].n, 1);
        assert_eq!(requests[0].style.as_deref(), Some("vivid"));
        assert_eq!(requests[0].quality.as_deref(), Some("standard"));
    }

    #[tokio::test]
    async fn image_attempt_recorded_on_failure() {
        let backend = ScriptedBackend::default()
            .image(Err(Error::bad_request("prompt rejected", None)))
            .image(Ok(ImagesResponse::default()));
        let mut session = ChatSession::new(backend, helper_config());

        assert!(session.create_image("first").await.is_err());
        let err = session.create_image("second").await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse { .. }));

        let attempts = session.image_attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].prompt, "first");
        assert_eq!(
            attempts[0].response,
            ImageResponse::Failed("Error creating image: Bad request: prompt rejected".to_string())
        );
        assert!(!attempts[1].succeeded());
    }
}
