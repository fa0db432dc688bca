//! Configuration for the assistant.
//!
//! [`Config`] is the flat key/value store that travels with every saved
//! session.  [`ChatArgs`] covers the command line.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ModelType;

/// Environment variable holding the API credential.
pub const API_KEY_VAR: &str = "AI_ASSISTANT_OPENAI_API_KEY";
/// Environment variable overriding the default model type.
pub const MODEL_TYPE_VAR: &str = "AI_ASSISTANT_OPENAI_MODEL_TYPE";
/// Environment variable overriding the default text model.
pub const TEXT_MODEL_VAR: &str = "AI_ASSISTANT_OPENAI_TEXT_MODEL";
/// Environment variable overriding the default system message.
pub const SYSTEM_MESSAGE_VAR: &str = "AI_ASSISTANT_OPENAI_SYSTEM_MESSAGE";
/// Environment variable overriding the API base URL.
pub const BASE_URL_VAR: &str = "AI_ASSISTANT_OPENAI_BASE_URL";
/// Environment variable overriding where history is kept.
pub const HISTORY_DIR_VAR: &str = "AI_ASSISTANT_HISTORY_DIR";

/// Keys of the values every config carries.
pub mod keys {
    /// `text` or `image`.
    pub const MODEL_TYPE: &str = "modelType";
    /// Chat completion model.
    pub const TEXT_MODEL: &str = "textModel";
    /// First message of every transcript.
    pub const SYSTEM_MESSAGE: &str = "systemMessage";
    /// Image generation model.
    pub const IMAGE_MODEL: &str = "imageModel";
    /// `WIDTHxHEIGHT`.
    pub const IMAGE_SIZE: &str = "imageSize";
    /// `vivid` or `natural`.
    pub const IMAGE_STYLE: &str = "imageStyle";
    /// `standard` or `hd`.
    pub const IMAGE_QUALITY: &str = "imageQuality";
}

const DEFAULT_MODEL_TYPE: &str = "text";
const DEFAULT_TEXT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_SYSTEM_MESSAGE: &str = "You are a software developer assistant";
pub(crate) const DEFAULT_IMAGE_MODEL: &str = "dall-e-2";
const DEFAULT_IMAGE_SIZE: &str = "256x256";
const DEFAULT_IMAGE_STYLE: &str = "vivid";
const DEFAULT_IMAGE_QUALITY: &str = "standard";

const DEFAULTS: &[(&str, &str)] = &[
    (keys::MODEL_TYPE, DEFAULT_MODEL_TYPE),
    (keys::TEXT_MODEL, DEFAULT_TEXT_MODEL),
    (keys::SYSTEM_MESSAGE, DEFAULT_SYSTEM_MESSAGE),
    (keys::IMAGE_MODEL, DEFAULT_IMAGE_MODEL),
    (keys::IMAGE_SIZE, DEFAULT_IMAGE_SIZE),
    (keys::IMAGE_STYLE, DEFAULT_IMAGE_STYLE),
    (keys::IMAGE_QUALITY, DEFAULT_IMAGE_QUALITY),
];

/// Session settings as an ordered key/value map.
///
/// Any key may be set to any string; nothing is validated.  The typed
/// accessors fall back to the built-in defaults when a key is absent, which
/// matters for configs read back from older session files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    /// Creates a config holding the built-in defaults.
    pub fn new() -> Self {
        let mut config = Self { values: Map::new() };
        for (key, value) in DEFAULTS {
            config.set(*key, *value);
        }
        config
    }

    /// Creates a config from the defaults overlaid with the environment.
    ///
    /// Only the model type, text model and system message come from the
    /// environment.  Empty variables are ignored.
    pub fn from_env(vars: &HashMap<String, String>) -> Self {
        let mut config = Self::new();
        let overrides = [
            (MODEL_TYPE_VAR, keys::MODEL_TYPE),
            (TEXT_MODEL_VAR, keys::TEXT_MODEL),
            (SYSTEM_MESSAGE_VAR, keys::SYSTEM_MESSAGE),
        ];
        for (var, key) in overrides {
            if let Some(value) = vars.get(var).filter(|v| !v.is_empty()) {
                config.set(key, value.as_str());
            }
        }
        config
    }

    /// Returns the value for `key`, if it is set to a string.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Sets `key` to `value`, returning `self` for chaining.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn get_or(&self, key: &str, default: &'static str) -> &str {
        self.get(key).unwrap_or(default)
    }

    /// The kind of session to run.
    pub fn model_type(&self) -> ModelType {
        ModelType::from_config_value(self.get_or(keys::MODEL_TYPE, DEFAULT_MODEL_TYPE))
    }

    /// The chat completion model.
    pub fn text_model(&self) -> &str {
        self.get_or(keys::TEXT_MODEL, DEFAULT_TEXT_MODEL)
    }

    /// The system message that opens every transcript.
    pub fn system_message(&self) -> &str {
        self.get_or(keys::SYSTEM_MESSAGE, DEFAULT_SYSTEM_MESSAGE)
    }

    /// The image generation model.
    pub fn image_model(&self) -> &str {
        self.get_or(keys::IMAGE_MODEL, DEFAULT_IMAGE_MODEL)
    }

    /// The image size.
    pub fn image_size(&self) -> &str {
        self.get_or(keys::IMAGE_SIZE, DEFAULT_IMAGE_SIZE)
    }

    /// The image style.
    pub fn image_style(&self) -> &str {
        self.get_or(keys::IMAGE_STYLE, DEFAULT_IMAGE_STYLE)
    }

    /// The image quality.
    pub fn image_quality(&self) -> &str {
        self.get_or(keys::IMAGE_QUALITY, DEFAULT_IMAGE_QUALITY)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Where history lives when the environment does not say.
///
/// `AI_ASSISTANT_HISTORY_DIR` wins; otherwise the platform data directory,
/// otherwise `./history`.
pub fn history_root(vars: &HashMap<String, String>) -> PathBuf {
    if let Some(dir) = vars.get(HISTORY_DIR_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .map(|dir| dir.join("termassist").join("history"))
        .unwrap_or_else(|| PathBuf::from("history"))
}

/// Command-line flags, as long name, short name and description.
const FLAGS: &[(&str, &str, &str)] = &[
    ("help", "h", "show this help message"),
    ("config", "c", "configure the assistant before starting"),
    ("image", "i", "create an image"),
    ("new", "n", "start a new conversation instead of resuming"),
];

/// Command-line arguments for the termassist binary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChatArgs {
    /// Show usage and exit without prompting.
    pub help: bool,

    /// Run interactive configuration before starting.
    pub config: bool,

    /// Force image mode.
    pub image: bool,

    /// Skip resumption even if a previous session exists.
    pub new: bool,

    /// Disable ANSI colors and styles.
    pub no_color: bool,
}

/// Error returned when the command line cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatArgsError {
    message: String,
}

impl fmt::Display for ChatArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ChatArgsError {}

impl ChatArgs {
    fn options() -> getopts::Options {
        let mut opts = getopts::Options::new();
        for (long, short, description) in FLAGS {
            opts.optflag(short, long, description);
        }
        opts.optflag("", "no-color", "disable ANSI colors/styles");
        opts
    }

    /// Parses arguments (without the program name).
    pub fn parse<I, S>(args: I) -> Result<Self, ChatArgsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let matches = Self::options()
            .parse(args)
            .map_err(|err| ChatArgsError {
                message: err.to_string(),
            })?;
        Ok(Self {
            help: matches.opt_present("help"),
            config: matches.opt_present("config"),
            image: matches.opt_present("image"),
            new: matches.opt_present("new"),
            no_color: matches.opt_present("no-color"),
        })
    }

    /// Usage text for `program`.
    pub fn usage(program: &str) -> String {
        Self::options().usage(&format!("Usage: {program} [OPTIONS]"))
    }

    /// The documented flags as `("--long or -s", description)` pairs.
    pub fn flag_reference() -> Vec<(String, &'static str)> {
        FLAGS
            .iter()
            .map(|(long, short, description)| (format!("--{long} or -{short}"), *description))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_config() {
        let config = Config::new();
        assert_eq!(config.model_type(), ModelType::Text);
        assert_eq!(config.text_model(), "gpt-3.5-turbo");
        assert_eq!(config.system_message(), "You are a software developer assistant");
        assert_eq!(config.image_model(), "dall-e-2");
        assert_eq!(config.image_size(), "256x256");
        assert_eq!(config.image_style(), "vivid");
        assert_eq!(config.image_quality(), "standard");
        assert_eq!(
            config.keys().collect::<Vec<_>>(),
            vec![
                "modelType",
                "textModel",
                "systemMessage",
                "imageModel",
                "imageSize",
                "imageStyle",
                "imageQuality"
            ]
        );
    }

    #[test]
    fn config_from_env() {
        let config = Config::from_env(&env(&[
            (MODEL_TYPE_VAR, "image"),
            (TEXT_MODEL_VAR, "gpt-4"),
            (SYSTEM_MESSAGE_VAR, ""),
            ("UNRELATED", "x"),
        ]));
        assert_eq!(config.model_type(), ModelType::Image);
        assert_eq!(config.text_model(), "gpt-4");
        assert_eq!(config.system_message(), "You are a software developer assistant");
        assert_eq!(config.get("UNRELATED"), None);
    }

    #[test]
    fn set_is_chainable_and_unvalidated() {
        let mut config = Config::new();
        config
            .set(keys::IMAGE_SIZE, "1024x1024")
            .set(keys::IMAGE_MODEL, "dall-e-3")
            .set("favoriteColor", "teal");
        assert_eq!(config.image_size(), "1024x1024");
        assert_eq!(config.image_model(), "dall-e-3");
        assert_eq!(config.get("favoriteColor"), Some("teal"));
        assert_eq!(config.get("missing"), None);
    }

    #[test]
    fn missing_keys_fall_back() {
        let config: Config =
            serde_json::from_str(r#"{"modelType": "text", "textModel": "gpt-4"}"#).unwrap();
        assert_eq!(config.text_model(), "gpt-4");
        assert_eq!(config.system_message(), "You are a software developer assistant");
    }

    #[test]
    fn serializes_flat_in_order() {
        let mut config = Config::new();
        config.set(keys::TEXT_MODEL, "gpt-4");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.starts_with(r#"{"modelType":"text","textModel":"gpt-4","#));
    }

    #[test]
    fn args_long_and_short() {
        let args = ChatArgs::parse(["--config", "-i", "-n"]).unwrap();
        assert_eq!(
            args,
            ChatArgs {
                help: false,
                config: true,
                image: true,
                new: true,
                no_color: false,
            }
        );
        let args = ChatArgs::parse(["-h", "--no-color"]).unwrap();
        assert!(args.help);
        assert!(args.no_color);
        assert_eq!(ChatArgs::parse(Vec::<String>::new()).unwrap(), ChatArgs::default());
    }

    #[test]
    fn args_unknown_flag() {
        assert!(ChatArgs::parse(["--bogus"]).is_err());
    }

    #[test]
    fn flag_reference_lists_every_flag() {
        let reference = ChatArgs::flag_reference();
        assert_eq!(reference.len(), 4);
        assert_eq!(reference[0].0, "--help or -h");
        assert_eq!(reference[3].0, "--new or -n");
    }

    #[test]
    fn history_root_from_env() {
        let root = history_root(&env(&[(HISTORY_DIR_VAR, "/tmp/somewhere")]));
        assert_eq!(root, PathBuf::from("/tmp/somewhere"));
    }
}
