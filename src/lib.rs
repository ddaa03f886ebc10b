pub mod backend;
pub mod config;
pub mod conversation;
pub mod fallback;
pub mod input;
pub mod resolver;
pub mod widget;

// Re-export main types for convenience
pub use backend::{BackendReply, ChatBackend, ExchangeError, HttpBackend};
pub use config::Config;
pub use conversation::{Conversation, Message, Role};
pub use resolver::{resolve, Resolution};
pub use widget::ChatWidget;
