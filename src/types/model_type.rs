use serde::{Deserialize, Serialize};

/// Which kind of generation a session performs.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Chat completion.
    #[default]
    Text,

    /// Image generation.
    Image,
}

impl ModelType {
    /// The lowercase name, also used as the history subdirectory.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Text => "text",
            ModelType::Image => "image",
        }
    }

    /// Interpret a raw config value.
    ///
    /// Only `image` selects image generation; every other value is text.
    pub fn from_config_value(value: &str) -> Self {
        if value == "image" {
            ModelType::Image
        } else {
            ModelType::Text
        }
    }
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModelType {
    type Err = String;

    /// Parse a model type, accepting `text` or `image` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ModelType::Text),
            "image" => Ok(ModelType::Image),
            _ => Err(format!(
                "Invalid model type: {}. Valid options: text, image",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_config_value() {
        assert_eq!(ModelType::from_config_value("image"), ModelType::Image);
        assert_eq!(ModelType::from_config_value("text"), ModelType::Text);
        assert_eq!(ModelType::from_config_value("video"), ModelType::Text);
    }

    #[test]
    fn strict_parse() {
        assert_eq!("IMAGE".parse::<ModelType>(), Ok(ModelType::Image));
        assert!("video".parse::<ModelType>().is_err());
    }
}
