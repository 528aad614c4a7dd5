use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use smartlife_core::ChatRole;
use crate::app::{App, FocusPane, InputMode};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current_text = String::new();

    while let Some(c) = chars.next() {
        if c == '*' && chars.peek() == Some(&'*') {
            chars.next();

            if !current_text.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut current_text)));
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
                spans.push(Span::styled(
                    bold_text,
                    Style::default().add_modifier(Modifier::BOLD),
                ));
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
        spans.push(Span::raw(current_text));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, tabs_area, body_area, status_area, input_area, footer_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .areas(area);

    let [presets_area, transcript_area] =
        Layout::horizontal([Constraint::Percentage(32), Constraint::Percentage(68)])
            .areas(body_area);

    render_header(app, frame, header_area);
    render_tabs(app, frame, tabs_area);
    render_presets(app, frame, presets_area);
    render_transcript(app, frame, transcript_area);
    render_status(app, frame, status_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            format!(" 🤖 {}'s Smart Life ", app.user_name),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(app.base_url.clone(), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let categories = app.session.categories();
    let active = app.session.active_category();

    let line = if categories.is_empty() {
        Line::from(Span::styled(
            " no categories ",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut spans = Vec::with_capacity(categories.len() * 2);
        for (i, category) in categories.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
            }
            let style = if category.category_id == active {
                Style::default().fg(Color::Black).bg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(format!(" {} ", category.category_name), style));
        }
        Line::from(spans)
    };

    let tabs = Paragraph::new(line).block(pane_block(" Categories ", app.focus == FocusPane::Tabs));
    frame.render_widget(tabs, area);
}

fn render_presets(app: &mut App, frame: &mut Frame, area: Rect) {
    app.presets_area = Some(area);

    let items: Vec<ListItem> = app
        .session
        .preset_questions()
        .iter()
        .map(|q| ListItem::new(q.preset_question.clone()))
        .collect();

    let block = pane_block(" Questions ", app.focus == FocusPane::Presets);

    if items.is_empty() {
        let hint = Paragraph::new(Span::styled(
            "Pick a category tab for quick questions",
            Style::default().fg(Color::DarkGray),
        ))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow))
        .highlight_symbol("▶ ");
    frame.render_stateful_widget(list, area, &mut app.preset_state);
}

/// The transcript as it is drawn, minus the border. `App` counts wrapped
/// rows with this same paragraph so scrolling matches the screen.
pub fn transcript_paragraph(app: &App) -> Paragraph<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in app.session.transcript() {
        let color = match msg.role {
            ChatRole::User => Color::Green,
            ChatRole::Assistant => Color::Magenta,
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", app.speaker(msg.role)),
            Style::default().fg(color).bold(),
        )));
        for line in msg.content.lines() {
            lines.push(parse_markdown_line(line));
        }
        lines.push(Line::default());
    }

    if app.session.in_flight() {
        lines.push(Line::from(Span::styled(
            format!("{}:", app.assistant_name),
            Style::default().fg(Color::Magenta).bold(),
        )));
        let dots = ".".repeat(app.animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{dots}"),
            Style::default().fg(Color::DarkGray).italic(),
        )));
    }

    Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false })
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.transcript_area = Some(area);
    // Inner size, minus borders
    app.transcript_width = area.width.saturating_sub(2);
    app.transcript_height = area.height.saturating_sub(2);

    let transcript = transcript_paragraph(app)
        .block(pane_block(" Chat ", app.focus == FocusPane::Transcript))
        .scroll((app.transcript_scroll, 0));
    frame.render_widget(transcript, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let line = if let Some(error) = app.session.error() {
        Line::from(Span::styled(format!(" {error}"), Style::default().fg(Color::Red)))
    } else if app.session.in_flight() {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        Line::from(Span::styled(
            format!(" {} is thinking{dots}", app.assistant_name),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let busy = app.session.in_flight();

    let title = if busy { " Message (waiting for reply) " } else { " Message " };
    let block = pane_block(title, editing || app.focus == FocusPane::Input);

    let content = if app.session.input().is_empty() && !editing {
        Span::styled("Say anything to get started", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(app.session.input().to_string())
    };

    frame.render_widget(Paragraph::new(content).block(block), area);

    if editing {
        let before: String = app.session.input().chars().take(app.session.cursor()).collect();
        let offset = u16::try_from(Span::raw(before).width()).unwrap_or(u16::MAX);
        let x = area
            .x
            .saturating_add(1)
            .saturating_add(offset)
            .min(area.x.saturating_add(area.width.saturating_sub(2)));
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    let hints: &[(&str, &str)] = match (app.input_mode, app.focus) {
        (InputMode::Editing, _) => &[(" Enter ", " send "), (" Esc ", " done ")],
        (InputMode::Normal, FocusPane::Tabs) => &[
            (" h/l ", " category "),
            (" 1-9 ", " jump "),
            (" Tab ", " focus "),
            (" i ", " type "),
            (" q ", " quit "),
        ],
        (InputMode::Normal, FocusPane::Presets) => &[
            (" j/k ", " nav "),
            (" Enter ", " ask "),
            (" Tab ", " focus "),
            (" i ", " type "),
            (" q ", " quit "),
        ],
        (InputMode::Normal, FocusPane::Transcript) => &[
            (" j/k ", " scroll "),
            (" g/G ", " top/bottom "),
            (" Tab ", " focus "),
            (" i ", " type "),
            (" q ", " quit "),
        ],
        (InputMode::Normal, FocusPane::Input) => &[
            (" Enter ", " edit "),
            (" Tab ", " focus "),
            (" q ", " quit "),
        ],
    };
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use smartlife_core::{Category, Outcome, Settings};

    fn screen_text(app: &mut App) -> String {
        screen_text_sized(app, 100, 30)
    }

    fn screen_text_sized(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_parse_markdown_line_bold() {
        let line = parse_markdown_line("save **10%** monthly");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "10%");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_line_unclosed() {
        let line = parse_markdown_line("a **b");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "a **b");
    }

    #[test]
    fn test_renders_tabs_greeting_and_error() {
        let mut app = App::new(&Settings::default());
        app.session.start();
        app.apply_outcome(Outcome::Categories(Ok(vec![
            Category {
                category_id: "general".to_string(),
                category_name: "Chat".to_string(),
            },
            Category {
                category_id: "money".to_string(),
                category_name: "Money".to_string(),
            },
        ])));
        app.apply_outcome(Outcome::Chat(Err("offline".to_string())));

        let text = screen_text(&mut app);
        assert!(text.contains("Money"));
        assert!(text.contains("Ken(AI):"));
        assert!(text.contains("Chat API error: offline"));
    }

    #[test]
    fn test_renders_thinking_while_busy() {
        let mut app = App::new(&Settings::default());
        app.session.set_input("hi");
        app.session.submit_chat();

        let text = screen_text(&mut app);
        assert!(text.contains("is thinking"));
        assert!(text.contains("Ken:"));
    }

    fn reply_tail_visible(reply: String) {
        let mut app = App::new(&Settings::default());
        // First draw records the transcript size
        screen_text_sized(&mut app, 80, 20);

        app.session.set_input("教えて");
        app.session.submit_chat();
        app.apply_outcome(Outcome::Chat(Ok(Some(reply))));
        assert!(screen_text_sized(&mut app, 80, 20).contains("END"));

        app.scroll_transcript_up(1000);
        app.scroll_transcript_down(1000);
        assert!(screen_text_sized(&mut app, 80, 20).contains("END"));
    }

    #[test]
    fn test_long_cjk_reply_tail_is_visible() {
        reply_tail_visible(format!("{}\nEND", "日本語の長い返事です。".repeat(30)));
    }

    #[test]
    fn test_long_word_wrapped_reply_tail_is_visible() {
        reply_tail_visible(format!("{}\nEND", "budget savings rent ".repeat(40)));
    }

    #[test]
    fn test_cursor_stays_inside_input_on_huge_paste() {
        let mut app = App::new(&Settings::default());
        app.input_mode = InputMode::Editing;
        app.session.set_input(&"x".repeat(70_000));

        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let cursor = terminal.get_cursor_position().unwrap();
        assert_eq!(cursor.x, 78);
    }
}
