// Public modules
pub mod chat_completion;
pub mod chat_message;
pub mod image_attempt;
pub mod image_generation;
pub mod model_type;

// Re-exports
pub use chat_completion::{
    ChatChoice, ChatCompletion, ChatCompletionParams, ChoiceMessage, CompletionUsage,
};
pub use chat_message::{Message, MessageRole};
pub use image_attempt::{ImageAttempt, ImageResponse, PendingImage};
pub use image_generation::{ImageDescriptor, ImageGenerateParams, ImagesResponse};
pub use model_type::ModelType;
