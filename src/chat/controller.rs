//! The interactive session controller.
//!
//! An [`Assistant`] walks one run of the program: parse the flags it was
//! given, optionally configure, optionally resume the last conversation, then
//! ask and answer until the user leaves.  Leaving always saves.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::chat::config::{ChatArgs, Config, DEFAULT_IMAGE_MODEL, keys};
use crate::chat::prompter::{Prompter, SelectOption};
use crate::chat::session::{ChatBackend, ChatSession};
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::render::Renderer;
use crate::types::{Message, ModelType};

/// Banner shown when the assistant starts.
pub const TITLE: &str = "Your Terminal AI Assistant";

/// Prompt for the next question of a text session.
pub const TEXT_PROMPT: &str = "Ask a question or hit enter to quit:";

/// Prompt for the next image of an image session.
pub const IMAGE_PROMPT: &str = "Enter a prompt to generate an image or hit enter to quit";

const MODEL_TYPES: &[SelectOption] = &[
    SelectOption::new("text", "Text"),
    SelectOption::new("image", "Image"),
];

const TEXT_MODELS: &[SelectOption] = &[
    SelectOption::new("gpt-3.5-turbo", "gpt-3.5-turbo"),
    SelectOption::new("gpt-4", "gpt-4"),
    SelectOption::new("gpt-4-1106-preview", "gpt-4 turbo"),
];

/// Size and model pairs, as `<size>_<model>`.
const IMAGE_PRESETS: &[SelectOption] = &[
    SelectOption::new("256x256_dall-e-2", "256×256px with dall-e-2"),
    SelectOption::new("512x512_dall-e-2", "512×512px with dall-e-2"),
    SelectOption::new("1024x1024_dall-e-2", "1024×1024px with dall-e-2"),
    SelectOption::new("1024x1024_dall-e-3", "1024×1024px with dall-e-3"),
    SelectOption::new("1792x1024_dall-e-3", "1792×1024px with dall-e-3"),
    SelectOption::new("1024x1792_dall-e-3", "1024×1792px with dall-e-3"),
];

const IMAGE_STYLES: &[SelectOption] = &[
    SelectOption::new("vivid", "Vivid: hyper-real and dramatic images"),
    SelectOption::new("natural", "Natural: more natural, less hyper-real looking images"),
];

const IMAGE_QUALITIES: &[SelectOption] = &[
    SelectOption::new("standard", "Standard"),
    SelectOption::new("hd", "HD: finer details and greater consistency"),
];

/// The only image model with style and quality settings.
const STYLED_IMAGE_MODEL: &str = "dall-e-3";

/// What a finished run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// The line reported by saving history, if a save was attempted.
    pub save_result: Option<String>,

    /// Whether the previous conversation was continued.
    pub resumed: bool,

    /// Number of prompts sent to the API.
    pub exchanges: usize,
}

/// Drives one run of the assistant.
pub struct Assistant<P: Prompter, R: Renderer> {
    config: Config,
    args: ChatArgs,
    history: HistoryStore,
    prompter: P,
    renderer: R,
    interrupt: Arc<AtomicBool>,
}

impl<P: Prompter, R: Renderer> Assistant<P, R> {
    /// Creates an assistant starting from `config`.
    pub fn new(
        config: Config,
        args: ChatArgs,
        history: HistoryStore,
        prompter: P,
        renderer: R,
    ) -> Self {
        Self {
            config,
            args,
            history,
            prompter,
            renderer,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Watches `interrupt`; once set, the session ends after the request in
    /// flight.
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Runs the session to completion.
    ///
    /// `connect` is called once, after configuration, to obtain the backend.
    /// With `--help` it is never called.
    ///
    /// # Errors
    ///
    /// Only a failure of `connect` is returned.  Remote and filesystem
    /// failures are reported to the user and the session goes on.
    pub async fn run<B, F>(mut self, connect: F) -> Result<SessionSummary>
    where
        B: ChatBackend,
        F: FnOnce() -> Result<B>,
    {
        self.renderer.print_intro(TITLE);
        if self.args.help {
            return Ok(self.exit(None, SessionSummary::default()));
        }

        if self.args.image {
            self.config.set(keys::MODEL_TYPE, ModelType::Image.as_str());
        }
        if self.args.config && self.configure().is_none() {
            return Ok(self.exit(None, SessionSummary::default()));
        }

        let model_type = self.config.model_type();
        let mut transcript = None;
        match model_type {
            ModelType::Image => {
                if self.configure_image().is_none() {
                    return Ok(self.exit(None, SessionSummary::default()));
                }
            }
            ModelType::Text => {
                if !self.args.new
                    && self.history.has_pointer()
                    && let Some(record) = self.history.load_last()
                {
                    let mut messages = record.transcript();
                    if self.args.config {
                        if let Some(first) = messages.first_mut()
                            && first.is_system()
                        {
                            *first = Message::system(self.config.system_message());
                        }
                    } else {
                        self.config = record.config;
                    }
                    transcript = Some(messages);
                    self.config.set(keys::MODEL_TYPE, ModelType::Text.as_str());
                }
            }
        }

        let backend = connect()?;
        let resumed = transcript.is_some();
        let mut session = match transcript {
            Some(transcript) => {
                self.renderer
                    .print_info("Continuing your last conversation. Run with --new to start over.");
                for message in transcript.iter().filter(|m| !m.is_system()) {
                    self.renderer
                        .print_transcript_entry(message.role, &message.content);
                }
                ChatSession::resume(backend, self.config.clone(), transcript)
            }
            None => ChatSession::new(backend, self.config.clone()),
        };

        let exchanges = self.converse(model_type, &mut session).await;

        let save_result = self.history.save(
            model_type,
            session.config(),
            session.messages(),
            session.image_attempts(),
        );
        let summary = SessionSummary {
            save_result: save_result.clone(),
            resumed,
            exchanges,
        };
        Ok(self.exit(save_result.as_deref(), summary))
    }

    /// The ask and answer loop.  Returns how many prompts were sent.
    async fn converse<B: ChatBackend>(
        &mut self,
        model_type: ModelType,
        session: &mut ChatSession<B>,
    ) -> usize {
        let message = match model_type {
            ModelType::Text => TEXT_PROMPT,
            ModelType::Image => IMAGE_PROMPT,
        };
        let mut exchanges = 0;
        while let Some(line) = self.prompter.text(message, None) {
            if line.is_empty() {
                break;
            }
            exchanges += 1;
            match model_type {
                ModelType::Text => match session.send_text_chat(&line).await {
                    Ok(answer) if answer.is_empty() => {
                        self.renderer.print_info("The assistant returned an empty answer.");
                    }
                    Ok(answer) => self.renderer.print_answer(&answer),
                    Err(err) => self.report("Error sending message", &err),
                },
                ModelType::Image => match session.create_image(&line).await {
                    Ok(image) => self.renderer.print_image(&image),
                    Err(err) => self.report("Error creating image", &err),
                },
            }
            if self.interrupt.load(Ordering::SeqCst) {
                tracing::debug!("interrupted; ending session");
                break;
            }
        }
        exchanges
    }

    fn report(&mut self, context: &str, err: &Error) {
        self.renderer.print_error(&format!("{context}: {err}"));
        if let Some(hint) = err.hint() {
            self.renderer.print_info(&hint);
        }
    }

    /// Interactive configuration.  `None` when the user cancelled.
    fn configure(&mut self) -> Option<()> {
        self.renderer.print_info("Configure your assistant for this session.");
        let model_type = self
            .prompter
            .select("Pick a generation model type.", MODEL_TYPES)?;
        self.config.set(keys::MODEL_TYPE, model_type.as_str());
        if ModelType::from_config_value(&model_type) != ModelType::Text {
            return Some(());
        }

        let text_model = self.prompter.select("Pick a text model.", TEXT_MODELS)?;
        self.config.set(keys::TEXT_MODEL, text_model);

        let current = self.config.system_message().to_string();
        let system_message = self.prompter.text(
            "Add a system message to set the context and guide the behavior of the model during the conversation",
            Some(&current),
        )?;
        let system_message = system_message.trim();
        if !system_message.is_empty() {
            self.config.set(keys::SYSTEM_MESSAGE, system_message);
        }
        Some(())
    }

    /// Image size, model, and for dall-e-3 style and quality.  `None` when
    /// the user cancelled.
    fn configure_image(&mut self) -> Option<()> {
        let preset = self
            .prompter
            .select("Choose your image size and generation model.", IMAGE_PRESETS)?;
        let (size, model) = split_preset(&preset);
        self.config
            .set(keys::IMAGE_SIZE, size)
            .set(keys::IMAGE_MODEL, model);
        if model != STYLED_IMAGE_MODEL {
            return Some(());
        }

        let style = self.prompter.select(
            "Select an image style (only available for dall-e-3)",
            IMAGE_STYLES,
        )?;
        self.config.set(keys::IMAGE_STYLE, style);
        let quality = self.prompter.select(
            "Select the image quality (only available for dall-e-3)",
            IMAGE_QUALITIES,
        )?;
        self.config.set(keys::IMAGE_QUALITY, quality);
        Some(())
    }

    fn exit(&mut self, save_result: Option<&str>, summary: SessionSummary) -> SessionSummary {
        self.renderer
            .print_goodbye(save_result, &ChatArgs::flag_reference());
        summary
    }
}

/// Splits `<size>_<model>`.  A value without a model keeps the default one.
fn split_preset(preset: &str) -> (&str, &str) {
    preset
        .split_once('_')
        .unwrap_or((preset, DEFAULT_IMAGE_MODEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_split_into_size_and_model() {
        for option in IMAGE_PRESETS {
            let (size, model) = split_preset(option.value);
            assert!(size.contains('x'), "{size}");
            assert!(model.starts_with("dall-e-"), "{model}");
        }
        assert_eq!(split_preset("1792x1024_dall-e-3"), ("1792x1024", "dall-e-3"));
        assert_eq!(split_preset("512x512"), ("512x512", "dall-e-2"));
    }

    #[test]
    fn only_dall_e_3_is_styled() {
        let styled: Vec<_> = IMAGE_PRESETS
            .iter()
            .filter(|option| split_preset(option.value).1 == STYLED_IMAGE_MODEL)
            .map(|option| option.value)
            .collect();
        assert_eq!(
            styled,
            vec!["1024x1024_dall-e-3", "1792x1024_dall-e-3", "1024x1792_dall-e-3"]
        );
    }
}
