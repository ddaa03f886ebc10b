use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc;

use aiisel_chat::backend::ChatBackend;
use aiisel_chat::resolver::resolve;
use aiisel_chat::widget::ChatWidget;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub widget: ChatWidget,

    // Transcript scrolling
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of the transcript for scroll calculations
    pub chat_width: u16,  // Inner width of the transcript for wrap calculations
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Areas for mouse hit-testing, set on render
    pub button_area: Option<Rect>,
    pub chat_area: Option<Rect>,
    pub input_area: Option<Rect>,
    pub send_area: Option<Rect>,

    backend: Arc<dyn ChatBackend>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(backend: Arc<dyn ChatBackend>, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            widget: ChatWidget::new(),

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,

            button_area: None,
            chat_area: None,
            input_area: None,
            send_area: None,

            backend,
            events,
        }
    }

    pub fn toggle_widget(&mut self) {
        self.widget.toggle();
        self.input_mode = if self.widget.is_open() {
            self.scroll_chat_to_bottom();
            InputMode::Editing
        } else {
            InputMode::Normal
        };
    }

    /// Send whatever is in the input box. Both Enter and the send button land here.
    pub fn submit(&mut self) {
        if self.widget.submit_input() {
            self.scroll_chat_to_bottom();
            self.dispatch_next_exchange();
        }
    }

    /// Reply for the in-flight exchange arrived
    pub fn on_reply(&mut self, reply: String) {
        self.widget.complete_exchange(reply);
        self.scroll_chat_to_bottom();
        self.dispatch_next_exchange();
    }

    /// Start the next queued exchange on a background task; its reply comes
    /// back through the event channel.
    fn dispatch_next_exchange(&mut self) {
        let Some(text) = self.widget.begin_exchange() else {
            return;
        };

        tracing::debug!(chars = text.chars().count(), "sending message to backend");
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let reply = resolve(backend.as_ref(), &text).await;
            if events.send(AppEvent::Reply(reply)).is_err() {
                tracing::debug!("event loop gone, reply discarded");
            }
        });
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.widget.is_typing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.total_chat_lines().saturating_sub(self.visible_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    /// Scroll the transcript so the newest message (or the typing indicator) is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.total_chat_lines();
        let visible_height = self.visible_height();
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    fn total_chat_lines(&self) -> u16 {
        // Default to a 40 column transcript until the first render
        let width = if self.chat_width > 0 { self.chat_width } else { 40 };
        crate::ui::transcript_lines(&self.widget, width, self.animation_frame).len() as u16
    }
}
