use serde::{Deserialize, Serialize};

use crate::types::{Message, MessageRole};

/// Request body for the chat completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionParams {
    /// The model identifier, e.g. `gpt-4`.
    pub model: String,

    /// The full transcript, system message first.
    pub messages: Vec<Message>,
}

impl ChatCompletionParams {
    /// Create new completion parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
        }
    }
}

/// The message inside a completion choice.
///
/// `content` is nullable on the wire (tool calls, refusals), so it is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceMessage {
    /// The role, normally `assistant`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,

    /// The generated text, if any.
    #[serde(default)]
    pub content: Option<String>,
}

/// One candidate reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatChoice {
    /// Position of this choice in the response.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    pub message: ChoiceMessage,

    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token accounting for a completion.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,

    /// Tokens in the generated reply.
    pub completion_tokens: u32,

    /// Sum of both.
    pub total_tokens: u32,
}

/// Response body of the chat completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletion {
    /// Identifier assigned by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The model that actually served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Candidate replies; only the first is used.
    pub choices: Vec<ChatChoice>,

    /// Token usage, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CompletionUsage>,
}

impl ChatCompletion {
    /// Build a single-choice completion carrying `content`.
    pub fn with_reply(content: impl Into<String>) -> Self {
        Self {
            id: None,
            model: None,
            choices: vec![ChatChoice {
                index: 0,
                message: ChoiceMessage {
                    role: Some(MessageRole::Assistant),
                    content: Some(content.into()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
        }
    }

    /// The text of the first choice, if the API produced one.
    pub fn reply_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn params_serialization() {
        let params = ChatCompletionParams::new(
            "gpt-4",
            vec![Message::system("You are a helper"), Message::user("hello")],
        );
        assert_eq!(
            to_value(&params).unwrap(),
            json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "You are a helper"},
                    {"role": "user", "content": "hello"}
                ]
            })
        );
    }

    #[test]
    fn completion_deserialization() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1677652288,
            "model": "gpt-4-0613",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "hi"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 1, "total_tokens": 10}
        }))
        .unwrap();
        assert_eq!(completion.reply_text(), Some("hi"));
        assert_eq!(completion.usage.unwrap().total_tokens, 10);
    }

    #[test]
    fn null_content_has_no_reply() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert_eq!(completion.reply_text(), None);

        let empty: ChatCompletion = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(empty.reply_text(), None);
    }
}
