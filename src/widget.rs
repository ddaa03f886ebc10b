//! Chat widget state: open/closed toggle, transcript, input and the send
//! interaction.
//!
//! Submissions are serialized. A message sent while another exchange is
//! pending shows up in the transcript right away and waits in a FIFO queue;
//! only one exchange is in flight at a time, so replies land in the order
//! the messages were sent.

use std::collections::VecDeque;

use crate::backend::ChatBackend;
use crate::conversation::{Conversation, Message};
use crate::input::InputBuffer;
use crate::resolver::resolve;

#[derive(Debug, Default)]
pub struct ChatWidget {
    conversation: Conversation,
    pub input: InputBuffer,
    open: bool,
    queued: VecDeque<String>,
    in_flight: bool,
}

impl ChatWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// True from a non-blank submission until its reply is appended
    pub fn is_typing(&self) -> bool {
        self.in_flight || !self.queued.is_empty()
    }

    /// Record a user message. Blank input is ignored and leaves both the
    /// transcript and the input buffer untouched.
    pub fn submit(&mut self, raw_input: &str) -> bool {
        let trimmed = raw_input.trim();
        if trimmed.is_empty() {
            return false;
        }

        self.conversation.push(Message::user(trimmed));
        self.input.clear();
        self.queued.push_back(trimmed.to_string());
        true
    }

    /// Submit whatever is in the input buffer
    pub fn submit_input(&mut self) -> bool {
        let raw = self.input.as_str().to_string();
        self.submit(&raw)
    }

    /// Next message to send to the backend, if nothing is in flight
    pub fn begin_exchange(&mut self) -> Option<String> {
        if self.in_flight {
            return None;
        }
        let text = self.queued.pop_front()?;
        self.in_flight = true;
        Some(text)
    }

    /// Append the reply for the in-flight exchange
    pub fn complete_exchange(&mut self, reply: String) {
        if !self.in_flight {
            tracing::warn!("reply arrived with no exchange in flight, dropping it");
            return;
        }
        self.conversation.push(Message::bot(reply));
        self.in_flight = false;
    }

    /// Submit `raw_input` and resolve every pending exchange before returning
    pub async fn send<B: ChatBackend + ?Sized>(&mut self, backend: &B, raw_input: &str) {
        if !self.submit(raw_input) {
            return;
        }
        while let Some(text) = self.begin_exchange() {
            let reply = resolve(backend, &text).await;
            self.complete_exchange(reply);
        }
    }
}
