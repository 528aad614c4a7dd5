use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use smartlife_core::{ChatRole, Outcome, Settings, Session};

use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Tabs,
    Presets,
    Transcript,
    Input,
}

impl FocusPane {
    /// Next pane for `Tab`. The input box is entered with `i`, not cycled to.
    pub fn next(self) -> Self {
        match self {
            FocusPane::Tabs => FocusPane::Presets,
            FocusPane::Presets => FocusPane::Transcript,
            FocusPane::Transcript | FocusPane::Input => FocusPane::Tabs,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub session: Session,

    // Display names
    pub user_name: String,
    pub assistant_name: String,
    pub base_url: String,

    // Preset list selection
    pub preset_state: ListState,

    // Transcript viewport
    pub transcript_scroll: u16,
    pub transcript_height: u16, // Height of transcript area for scroll calculations
    pub transcript_width: u16,  // Width of transcript area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub presets_area: Option<Rect>,
    pub transcript_area: Option<Rect>,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Tabs,
            session: Session::new(&settings.user_name),

            user_name: settings.user_name.clone(),
            assistant_name: settings.assistant_name.clone(),
            base_url: settings.base_url.clone(),

            preset_state: ListState::default(),

            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,

            animation_frame: 0,

            presets_area: None,
            transcript_area: None,
        }
    }

    /// Label shown before a transcript entry
    pub fn speaker(&self, role: ChatRole) -> &str {
        match role {
            ChatRole::User => &self.user_name,
            ChatRole::Assistant => &self.assistant_name,
        }
    }

    /// Fold a finished backend call into the session and refresh the view.
    pub fn apply_outcome(&mut self, outcome: Outcome) {
        let transcript_len = self.session.transcript().len();
        self.session.apply(outcome);
        self.sync_preset_selection();
        if self.session.transcript().len() != transcript_len || self.session.in_flight() {
            self.scroll_transcript_to_bottom();
        }
    }

    /// Keep the list highlight inside the current preset list.
    pub fn sync_preset_selection(&mut self) {
        let len = self.session.preset_questions().len();
        match self.preset_state.selected() {
            _ if len == 0 => self.preset_state.select(None),
            Some(i) if i >= len => self.preset_state.select(Some(len - 1)),
            None => self.preset_state.select(Some(0)),
            Some(_) => {}
        }
    }

    pub fn selected_preset(&self) -> Option<usize> {
        self.preset_state
            .selected()
            .filter(|i| *i < self.session.preset_questions().len())
    }

    pub fn preset_nav_down(&mut self) {
        let len = self.session.preset_questions().len();
        if len > 0 {
            let i = self.preset_state.selected().unwrap_or(0);
            self.preset_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn preset_nav_up(&mut self) {
        let i = self.preset_state.selected().unwrap_or(0);
        self.preset_state.select(Some(i.saturating_sub(1)));
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_transcript_down(&mut self, lines: u16) {
        let max_scroll = self.transcript_line_count().saturating_sub(self.visible_height());
        self.transcript_scroll = self.transcript_scroll.saturating_add(lines).min(max_scroll);
    }

    pub fn scroll_transcript_up(&mut self, lines: u16) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(lines);
    }

    /// Scroll so the newest entry (and the "thinking" line) is visible
    pub fn scroll_transcript_to_bottom(&mut self) {
        let total_lines = self.transcript_line_count();
        let visible_height = self.visible_height();

        self.transcript_scroll = total_lines.saturating_sub(visible_height);
    }

    /// Wrapped line count of the transcript as the UI lays it out.
    pub fn transcript_line_count(&self) -> u16 {
        // Use actual transcript width for wrap calculation, default to 50 if not set
        let wrap_width = if self.transcript_width > 0 {
            self.transcript_width
        } else {
            50
        };

        let total_lines = ui::transcript_paragraph(self).line_count(wrap_width);
        u16::try_from(total_lines).unwrap_or(u16::MAX)
    }

    fn visible_height(&self) -> u16 {
        if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        }
    }
}
