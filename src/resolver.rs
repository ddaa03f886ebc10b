//! Turns a user message into the bot's reply text.
//!
//! Resolution never fails: backend errors degrade to a local canned reply
//! and a reply-less backend answer degrades to [`MISSING_REPLY`].

use crate::backend::ChatBackend;
use crate::fallback::fallback;

pub const MISSING_REPLY: &str = "Sem resposta definida no backend.";

/// Which path produced the reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Remote(String),
    MissingReply,
    Fallback(String),
}

impl Resolution {
    pub fn into_text(self) -> String {
        match self {
            Resolution::Remote(text) | Resolution::Fallback(text) => text,
            Resolution::MissingReply => MISSING_REPLY.to_string(),
        }
    }
}

pub async fn resolve_detailed<B: ChatBackend + ?Sized>(backend: &B, user_text: &str) -> Resolution {
    let start = std::time::Instant::now();
    match backend.exchange(user_text).await {
        Ok(body) => match body.reply {
            Some(reply) if !reply.is_empty() => {
                tracing::info!(
                    endpoint = %backend.endpoint(),
                    duration_ms = %start.elapsed().as_millis(),
                    "backend replied"
                );
                Resolution::Remote(reply)
            }
            _ => {
                tracing::warn!(
                    endpoint = %backend.endpoint(),
                    "backend answered without a reply"
                );
                Resolution::MissingReply
            }
        },
        Err(e) => {
            tracing::warn!(
                endpoint = %backend.endpoint(),
                duration_ms = %start.elapsed().as_millis(),
                error = %e,
                "backend unavailable, using local reply"
            );
            Resolution::Fallback(fallback(user_text))
        }
    }
}

pub async fn resolve<B: ChatBackend + ?Sized>(backend: &B, user_text: &str) -> String {
    resolve_detailed(backend, user_text).await.into_text()
}

#[cfg(test)]
pub(crate) mod fakes {
    use async_trait::async_trait;

    use crate::backend::{BackendReply, ChatBackend, ExchangeError};

    /// Backend whose answer is fixed up front
    pub struct FakeBackend {
        answer: Box<dyn Fn() -> Result<BackendReply, ExchangeError> + Send + Sync>,
    }

    impl FakeBackend {
        pub fn replying(text: &'static str) -> Self {
            Self {
                answer: Box::new(move || {
                    Ok(BackendReply {
                        reply: Some(text.to_string()),
                    })
                }),
            }
        }

        pub fn empty() -> Self {
            Self {
                answer: Box::new(|| Ok(BackendReply::default())),
            }
        }

        pub fn down() -> Self {
            Self::failing(|| ExchangeError::Transport("connection refused".to_string()))
        }

        pub fn failing(err: fn() -> ExchangeError) -> Self {
            Self {
                answer: Box::new(move || Err(err())),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn exchange(&self, _message: &str) -> Result<BackendReply, ExchangeError> {
            (self.answer)()
        }

        fn endpoint(&self) -> &str {
            "fake://backend"
        }
    }
}
