use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // The next draw re-lays out the window and clamps the scroll
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply(reply) => app.on_reply(reply),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('o') | KeyCode::Char(' ') => app.toggle_widget(),
        _ if !app.widget.is_open() => {}

        KeyCode::Char('i') | KeyCode::Tab => app.input_mode = InputMode::Editing,
        KeyCode::Esc => app.toggle_widget(),

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(1)),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(1)),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll = 0,
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.widget.input.backspace(),
        KeyCode::Delete => app.widget.input.delete(),
        KeyCode::Left => app.widget.input.move_left(),
        KeyCode::Right => app.widget.input.move_right(),
        KeyCode::Home => app.widget.input.move_home(),
        KeyCode::End => app.widget.input.move_end(),
        KeyCode::PageUp => app.scroll_up(app.chat_height.max(1)),
        KeyCode::PageDown => app.scroll_down(app.chat_height.max(1)),
        KeyCode::Char(c) => app.widget.input.insert(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;
    let hit = |area: Option<Rect>| area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if hit(app.button_area) {
                app.toggle_widget();
            } else if hit(app.send_area) {
                app.submit();
            } else if hit(app.input_area) {
                app.input_mode = InputMode::Editing;
            }
        }
        MouseEventKind::ScrollDown if hit(app.chat_area) => app.scroll_down(3),
        MouseEventKind::ScrollUp if hit(app.chat_area) => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use aiisel_chat::backend::{BackendReply, ChatBackend, ExchangeError};
    use async_trait::async_trait;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use tokio::sync::mpsc;

    struct SilentBackend;

    #[async_trait]
    impl ChatBackend for SilentBackend {
        async fn exchange(&self, _message: &str) -> Result<BackendReply, ExchangeError> {
            Err(ExchangeError::Transport("offline".to_string()))
        }

        fn endpoint(&self) -> &str {
            "offline://"
        }
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn click(column: u16, row: u16) -> AppEvent {
        AppEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(Arc::new(SilentBackend), tx), rx)
    }

    #[tokio::test]
    async fn test_enter_and_send_button_share_the_submit_path() {
        let (mut app, mut rx) = test_app();
        handle_event(&mut app, key(KeyCode::Char('o')));
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "Olá".chars() {
            handle_event(&mut app, key(KeyCode::Char(c)));
        }
        handle_event(&mut app, key(KeyCode::Enter));
        assert!(app.widget.input.is_empty());
        assert_eq!(app.widget.conversation().len(), 2);

        let reply = rx.recv().await.unwrap();
        handle_event(&mut app, reply);
        assert_eq!(app.widget.conversation().len(), 3);

        app.send_area = Some(Rect::new(10, 10, 5, 3));
        for c in "obrigado".chars() {
            handle_event(&mut app, key(KeyCode::Char(c)));
        }
        handle_event(&mut app, click(12, 11));
        assert_eq!(app.widget.conversation().len(), 4);

        let reply = rx.recv().await.unwrap();
        handle_event(&mut app, reply);
        assert_eq!(app.widget.conversation().len(), 5);
        assert!(!app.widget.is_typing());
    }

    #[test]
    fn test_blank_enter_does_nothing() {
        let (mut app, _rx) = test_app();
        app.toggle_widget();
        handle_event(&mut app, key(KeyCode::Char(' ')));
        handle_event(&mut app, key(KeyCode::Enter));
        assert_eq!(app.widget.conversation().len(), 1);
        assert_eq!(app.widget.input.as_str(), " ");
        assert!(!app.widget.is_typing());
    }

    #[test]
    fn test_clicking_the_button_toggles() {
        let (mut app, _rx) = test_app();
        app.button_area = Some(Rect::new(70, 20, 8, 3));
        handle_event(&mut app, click(72, 21));
        assert!(app.widget.is_open());
        handle_event(&mut app, click(72, 21));
        assert!(!app.widget.is_open());
        handle_event(&mut app, click(0, 0));
        assert!(!app.widget.is_open());
    }

    #[test]
    fn test_navigation_keys_ignored_while_closed() {
        let (mut app, _rx) = test_app();
        handle_event(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.input_mode, InputMode::Normal);
        handle_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_while_typing() {
        let (mut app, _rx) = test_app();
        app.toggle_widget();
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(app.should_quit);
        assert!(app.widget.input.is_empty());
    }
}
