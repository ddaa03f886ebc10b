use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use unicode_width::UnicodeWidthChar;
use aiisel_chat::conversation::Role;
use aiisel_chat::widget::ChatWidget;
use crate::app::{App, InputMode};

const WINDOW_TITLE: &str = " ISEL ChatBot 🤖 ";
const PLACEHOLDER: &str = "Escreva aqui...";
const SEND_LABEL: &str = "➤";
const BUTTON_WIDTH: u16 = 8;
const BUTTON_HEIGHT: u16 = 3;
const WINDOW_WIDTH: u16 = 50;
const WINDOW_HEIGHT: u16 = 24;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str, base: Style) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut current_text), base));
            }

            // Find closing **
            let mut bold_text = String::new();
            let mut found_close = false;

            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'*') {
                    chars.next();
                    found_close = true;
                    break;
                }
                bold_text.push(c);
            }

            if found_close && !bold_text.is_empty() {
                spans.push(Span::styled(bold_text, base.add_modifier(Modifier::BOLD)));
            } else {
                // No closing **, treat as literal
                current_text.push_str("**");
                current_text.push_str(&bold_text);
            }
        } else {
            current_text.push(c);
        }
    }

    if !current_text.is_empty() {
        spans.push(Span::styled(current_text, base));
    }

    Line::from(spans)
}

type StyledChar = (char, Style);

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Greedy word wrap of one line of styled spans to `width` terminal columns.
/// Words wider than `width` are split. Styles survive the break, so a bold
/// phrase stays bold on both lines.
fn wrap_spans(spans: &[Span<'_>], width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let chars: Vec<StyledChar> = spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |c| (c, span.style)))
        .collect();

    let mut lines = Vec::new();
    let mut current: Vec<StyledChar> = Vec::new();
    let mut current_width = 0;

    for word in chars.split(|(c, _)| c.is_whitespace()).filter(|w| !w.is_empty()) {
        let mut word = word;
        let mut word_width: usize = word.iter().map(|(c, _)| char_width(*c)).sum();

        while word_width > width {
            if !current.is_empty() {
                lines.push(styled_line(std::mem::take(&mut current)));
                current_width = 0;
            }
            let mut taken = 0;
            let mut taken_width = 0;
            for (c, _) in word {
                let w = char_width(*c);
                if taken > 0 && taken_width + w > width {
                    break;
                }
                taken += 1;
                taken_width += w;
            }
            lines.push(styled_line(word[..taken].to_vec()));
            word = &word[taken..];
            word_width -= taken_width;
        }
        if word.is_empty() {
            continue;
        }

        if !current.is_empty() && current_width + 1 + word_width > width {
            lines.push(styled_line(std::mem::take(&mut current)));
            current_width = 0;
        }
        if let Some(&(_, style)) = current.last() {
            current.push((' ', style));
            current_width += 1;
        }
        current.extend_from_slice(word);
        current_width += word_width;
    }

    lines.push(styled_line(current));
    lines
}

/// Merge runs of equally styled characters back into spans
fn styled_line(chars: Vec<StyledChar>) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut run_style: Option<Style> = None;

    for (c, style) in chars {
        match run_style {
            Some(current) if current != style => {
                spans.push(Span::styled(std::mem::take(&mut text), current));
            }
            _ => {}
        }
        run_style = Some(style);
        text.push(c);
    }
    if let Some(style) = run_style {
        spans.push(Span::styled(text, style));
    }

    Line::from(spans)
}

/// Styles each source line with `to_line`, then wraps it
fn wrap_message(text: &str, width: usize, to_line: impl Fn(&str) -> Line<'static>) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = text
        .lines()
        .flat_map(|raw| wrap_spans(&to_line(raw).spans, width))
        .collect();
    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

/// Width of a message bubble inside a transcript `chat_width` columns wide
pub fn bubble_width(chat_width: u16) -> u16 {
    (chat_width.saturating_mul(4) / 5).max(10)
}

/// Transcript rendered as bubbles: bot messages on the left, user messages
/// on the right, followed by the typing indicator when a reply is pending.
pub fn transcript_lines(widget: &ChatWidget, chat_width: u16, animation_frame: u8) -> Vec<Line<'static>> {
    let wrap_width = bubble_width(chat_width) as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in widget.conversation().messages() {
        match msg.sender {
            Role::User => {
                let style = Style::default().fg(Color::Cyan);
                lines.push(
                    Line::from(Span::styled(
                        "Tu",
                        style.add_modifier(Modifier::BOLD),
                    ))
                    .alignment(Alignment::Right),
                );
                let text = wrap_message(&msg.text, wrap_width, |raw| {
                    Line::from(Span::styled(raw.to_string(), style))
                });
                lines.extend(text.into_iter().map(|line| line.alignment(Alignment::Right)));
            }
            Role::Bot => {
                lines.push(Line::from(Span::styled(
                    "ISEL ChatBot",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(wrap_message(&msg.text, wrap_width, |raw| {
                    parse_markdown_line(raw, Style::default())
                }));
            }
        }
        lines.push(Line::default());
    }

    if widget.is_typing() {
        lines.push(Line::from(Span::styled(
            "ISEL ChatBot",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize % 3) + 1);
        lines.push(Line::from(Span::styled(
            format!("A escrever{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_backdrop(frame, body_area);
    render_footer(app, frame, footer_area);

    let button_area = toggle_button_area(body_area);
    render_toggle_button(app, frame, button_area);
    app.button_area = Some(button_area);

    if app.widget.is_open() {
        render_chat_window(app, frame, body_area, button_area);
    } else {
        app.chat_area = None;
        app.input_area = None;
        app.send_area = None;
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" AI ISEL ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_backdrop(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            "Instituto Superior de Engenharia de Lisboa",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Precisa de ajuda? Abra o chat no canto inferior direito.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INPUT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match (app.widget.is_open(), app.input_mode) {
        (false, _) => vec![
            Span::styled(" o ", key_style),
            Span::styled(" open chat ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (true, InputMode::Normal) => vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" o ", key_style),
            Span::styled(" close chat ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (true, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn toggle_button_area(body: Rect) -> Rect {
    let width = BUTTON_WIDTH.min(body.width);
    let height = BUTTON_HEIGHT.min(body.height);
    Rect::new(
        body.x + body.width - width,
        body.y + body.height - height,
        width,
        height,
    )
}

fn render_toggle_button(app: &App, frame: &mut Frame, area: Rect) {
    let (label, color) = if app.widget.is_open() {
        ("✕", Color::Red)
    } else {
        ("💬", Color::Cyan)
    };

    let button = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color)),
        );

    frame.render_widget(Clear, area);
    frame.render_widget(button, area);
}

fn render_chat_window(app: &mut App, frame: &mut Frame, body: Rect, button: Rect) {
    // Anchored bottom-right, just above the toggle button
    let width = WINDOW_WIDTH.min(body.width);
    let height = WINDOW_HEIGHT.min(body.height.saturating_sub(button.height));
    if width < 12 || height < 6 {
        app.chat_area = None;
        app.input_area = None;
        app.send_area = None;
        return;
    }
    let window_area = Rect::new(
        body.x + body.width - width,
        button.y - height,
        width,
        height,
    );

    frame.render_widget(Clear, window_area);

    let window = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(WINDOW_TITLE, Style::default().fg(Color::Cyan).bold()));
    let inner = window.inner(window_area);
    frame.render_widget(window, window_area);

    let [chat_area, input_row] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(inner);

    let [input_area, send_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(5),
    ])
    .areas(input_row);

    // Store areas for mouse hit-testing and scroll calculations
    app.chat_area = Some(chat_area);
    app.input_area = Some(input_area);
    app.send_area = Some(send_area);
    app.chat_height = chat_area.height;
    app.chat_width = chat_area.width;

    let lines = transcript_lines(&app.widget, chat_area.width, app.animation_frame);
    // A taller window or a resize can leave the offset past the last line
    let max_scroll = lines.len().saturating_sub(chat_area.height as usize);
    app.chat_scroll = app.chat_scroll.min(max_scroll.min(u16::MAX as usize) as u16);
    let chat = Paragraph::new(Text::from(lines)).scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);

    let send_color = if app.widget.input.as_str().trim().is_empty() {
        Color::DarkGray
    } else {
        Color::Cyan
    };
    let send = Paragraph::new(SEND_LABEL)
        .alignment(Alignment::Center)
        .style(Style::default().fg(send_color).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(send_color)),
        );
    frame.render_widget(send, send_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.widget.input.cursor();

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.widget.input.is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let visible_text: String = app
            .widget
            .input
            .as_str()
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
