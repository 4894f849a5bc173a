// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod assistant;
mod factory;
mod openai;
mod traits;
mod types;

// Public re-exports - the ONLY way to access model functionality
pub use assistant::Assistant;
pub use factory::ModelFactory;
pub use openai::OpenAiModel;
pub use traits::Model;
pub use types::{
    ChatMessage, Dialog, MessageRole, ModelConfig, ModelResponse, StreamCallback, TokenUsage,
};
