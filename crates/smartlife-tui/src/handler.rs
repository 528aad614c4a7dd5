use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use smartlife_core::Request;
use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Apply one event to the app. Returns the backend call to start, if any.
pub fn handle_event(app: &mut App, event: AppEvent) -> Option<Request> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => {
            handle_mouse(app, mouse);
            None
        }
        AppEvent::Resize(_, _) => None,
        AppEvent::Tick => {
            app.tick_animation();
            None
        }
        AppEvent::Backend(outcome) => {
            app.apply_outcome(outcome);
            None
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Option<Request> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return None;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Option<Request> {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            None
        }

        KeyCode::Tab => {
            app.focus = app.focus.next();
            None
        }

        // Jump straight to the input box
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
            None
        }

        // 1-9 pick a tab directly
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            let category_id = app.session.categories().get(index)?.category_id.clone();
            change_category(app, |app| app.session.select_category(&category_id))
        }

        _ => match app.focus {
            FocusPane::Tabs => handle_tabs(app, key),
            FocusPane::Presets => handle_presets(app, key),
            FocusPane::Transcript => {
                handle_transcript(app, key);
                None
            }
            FocusPane::Input => {
                if key.code == KeyCode::Enter {
                    app.input_mode = InputMode::Editing;
                }
                None
            }
        },
    }
}

fn handle_tabs(app: &mut App, key: KeyEvent) -> Option<Request> {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => {
            change_category(app, |app| app.session.cycle_category(-1))
        }
        KeyCode::Char('l') | KeyCode::Right => {
            change_category(app, |app| app.session.cycle_category(1))
        }
        KeyCode::Enter | KeyCode::Char('j') | KeyCode::Down => {
            app.focus = FocusPane::Presets;
            None
        }
        _ => None,
    }
}

/// Run a tab change and reset the preset highlight if the tab moved.
fn change_category(
    app: &mut App,
    change: impl FnOnce(&mut App) -> Option<Request>,
) -> Option<Request> {
    let before = app.session.active_category().to_string();
    let request = change(app);
    if app.session.active_category() != before {
        app.preset_state.select(None);
        app.sync_preset_selection();
    }
    request
}

fn handle_presets(app: &mut App, key: KeyEvent) -> Option<Request> {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            app.preset_nav_down();
            None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.preset_nav_up();
            None
        }
        KeyCode::Enter => {
            let index = app.selected_preset()?;
            let request = app.session.invoke_preset(index);
            app.scroll_transcript_to_bottom();
            request
        }
        _ => None,
    }
}

fn handle_transcript(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_transcript_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_transcript_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_transcript_down(app.transcript_height / 2);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_transcript_up(app.transcript_height / 2);
        }
        KeyCode::Char('g') => app.transcript_scroll = 0,
        KeyCode::Char('G') => app.scroll_transcript_to_bottom(),
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) -> Option<Request> {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            let request = app.session.submit_chat();
            if request.is_some() {
                // Scroll to bottom so "Thinking..." is visible
                app.scroll_transcript_to_bottom();
            }
            return request;
        }
        KeyCode::Backspace => app.session.backspace(),
        KeyCode::Delete => app.session.delete(),
        KeyCode::Left => app.session.cursor_left(),
        KeyCode::Right => app.session.cursor_right(),
        KeyCode::Home => app.session.cursor_home(),
        KeyCode::End => app.session.cursor_end(),
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            app.session.insert_char(c)
        }
        _ => {}
    }
    None
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Determine which area the mouse is in (position-based scrolling)
    let in_presets = app.presets_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_transcript = app.transcript_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_transcript {
                app.scroll_transcript_down(3);
            } else if in_presets {
                app.preset_nav_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_transcript {
                app.scroll_transcript_up(3);
            } else if in_presets {
                app.preset_nav_up();
            }
        }
        _ => {}
    }
}
