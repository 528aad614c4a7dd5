//! Session view-state
//!
//! `Session` is the single state container behind the chat screen. Every user
//! action mutates it and hands back the backend [`Request`] it wants issued
//! (if any). The caller runs the request wherever it likes and feeds the
//! [`Outcome`] back through [`Session::apply`]. Requests are never cancelled;
//! the only concurrency guard is the in-flight check on free-text chat.

use tracing::{debug, info, warn};

use crate::api::{Category, PresetQuestion};
use crate::client::BackendClient;
use crate::state::{greeting, ChatMessage};

/// The default tab. It has no preset questions.
pub const GENERAL_CATEGORY: &str = "general";

/// Shown in place of an answer when the backend omits `ai_response`.
pub const FALLBACK_REPLY: &str = "Sorry, the AI hit an error…";

pub const CATEGORIES_ERROR: &str = "Could not reach the backend. Is the API server running?";

/// A backend call the session wants made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Categories,
    PresetQuestions { category_id: String },
    Knowledge { knowledge_id: String },
    /// `history` is the transcript before `prompt` was appended.
    Chat { history: Vec<ChatMessage>, prompt: String },
}

/// A settled backend call. Errors are already flattened to display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Categories(Result<Vec<Category>, String>),
    PresetQuestions {
        category_id: String,
        result: Result<Vec<PresetQuestion>, String>,
    },
    Knowledge(Result<Option<String>, String>),
    Chat(Result<Option<String>, String>),
}

impl Request {
    /// Perform the call against the backend.
    pub async fn run(self, client: &BackendClient) -> Outcome {
        match self {
            Request::Categories => {
                Outcome::Categories(client.fetch_categories().await.map_err(|e| e.to_string()))
            }
            Request::PresetQuestions { category_id } => {
                let result = client
                    .fetch_preset_questions(&category_id)
                    .await
                    .map_err(|e| e.to_string());
                Outcome::PresetQuestions { category_id, result }
            }
            Request::Knowledge { knowledge_id } => Outcome::Knowledge(
                client
                    .fetch_knowledge_answer(&knowledge_id)
                    .await
                    .map_err(|e| e.to_string()),
            ),
            Request::Chat { history, prompt } => Outcome::Chat(
                client
                    .send_chat(&history, &prompt)
                    .await
                    .map_err(|e| e.to_string()),
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    categories: Vec<Category>,
    active_category: String,
    preset_questions: Vec<PresetQuestion>,
    transcript: Vec<ChatMessage>,
    input: String,
    cursor: usize, // char index into `input`
    in_flight: bool,
    error: Option<String>,
}

impl Session {
    /// Fresh session with the greeting already in the transcript.
    pub fn new(user_name: &str) -> Self {
        Self {
            categories: Vec::new(),
            active_category: GENERAL_CATEGORY.to_string(),
            preset_questions: Vec::new(),
            transcript: vec![greeting(user_name)],
            input: String::new(),
            cursor: 0,
            in_flight: false,
            error: None,
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn active_category(&self) -> &str {
        &self.active_category
    }

    /// Position of the active tab, if it is one of the loaded categories.
    pub fn active_category_index(&self) -> Option<usize> {
        self.categories
            .iter()
            .position(|c| c.category_id == self.active_category)
    }

    pub fn preset_questions(&self) -> &[PresetQuestion] {
        &self.preset_questions
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Category loader. Call once when the session opens.
    pub fn start(&mut self) -> Request {
        info!("loading categories");
        self.in_flight = true;
        Request::Categories
    }

    /// Preset-question loader, fired by a tab change.
    pub fn select_category(&mut self, category_id: &str) -> Option<Request> {
        if category_id == self.active_category {
            return None;
        }

        if category_id == GENERAL_CATEGORY {
            self.active_category = GENERAL_CATEGORY.to_string();
            self.preset_questions.clear();
            return None;
        }

        if !self.categories.iter().any(|c| c.category_id == category_id) {
            debug!(category_id, "ignoring unknown category");
            return None;
        }

        self.active_category = category_id.to_string();
        info!(category_id, "loading preset questions");
        Some(Request::PresetQuestions {
            category_id: category_id.to_string(),
        })
    }

    /// Move the active tab by `offset`, wrapping around the loaded categories.
    pub fn cycle_category(&mut self, offset: isize) -> Option<Request> {
        let len = self.categories.len();
        if len == 0 {
            return None;
        }

        let next = match self.active_category_index() {
            Some(i) => (i as isize + offset).rem_euclid(len as isize) as usize,
            None if offset < 0 => len - 1,
            None => 0,
        };
        let category_id = self.categories[next].category_id.clone();
        self.select_category(&category_id)
    }

    /// Ask the knowledge endpoint for the answer to the `index`th preset
    /// question. Does not look at the in-flight flag.
    pub fn invoke_preset(&mut self, index: usize) -> Option<Request> {
        let question = self.preset_questions.get(index)?.clone();
        self.transcript.push(ChatMessage::user(question.preset_question));
        self.in_flight = true;
        info!(knowledge_id = %question.knowledge_id, "asking preset question");
        Some(Request::Knowledge {
            knowledge_id: question.knowledge_id,
        })
    }

    /// Free-text submission. Blank input or a pending call makes this a no-op.
    pub fn submit_chat(&mut self) -> Option<Request> {
        if self.input.trim().is_empty() || self.in_flight {
            return None;
        }

        let prompt = std::mem::take(&mut self.input);
        self.cursor = 0;
        let history = self.transcript.clone();
        self.transcript.push(ChatMessage::user(prompt.clone()));
        self.in_flight = true;
        info!(history_len = history.len(), "sending chat");
        Some(Request::Chat { history, prompt })
    }

    /// Fold a settled call back into the view-state.
    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Categories(Ok(categories)) => {
                info!(count = categories.len(), "categories loaded");
                self.categories = categories;
                self.error = None;
                self.in_flight = false;
            }
            Outcome::Categories(Err(e)) => {
                warn!(error = %e, "category load failed");
                self.categories.clear();
                self.error = Some(CATEGORIES_ERROR.to_string());
                self.in_flight = false;
            }
            Outcome::PresetQuestions { category_id, result } => {
                // The tab moved on while this was in flight.
                if category_id != self.active_category {
                    debug!(category_id = %category_id, active = %self.active_category, "dropping stale preset questions");
                    return;
                }
                match result {
                    Ok(questions) => {
                        info!(category_id = %category_id, count = questions.len(), "preset questions loaded");
                        self.preset_questions = questions;
                    }
                    Err(e) => {
                        warn!(category_id = %category_id, error = %e, "preset question load failed");
                        self.error = Some(format!("Failed to load preset questions: {e}"));
                        self.preset_questions.clear();
                    }
                }
            }
            Outcome::Knowledge(result) => {
                self.settle_reply(result, "Knowledge API error");
            }
            Outcome::Chat(result) => {
                self.settle_reply(result, "Chat API error");
            }
        }
    }

    fn settle_reply(&mut self, result: Result<Option<String>, String>, label: &str) {
        match result {
            Ok(reply) => {
                let reply = reply
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                self.transcript.push(ChatMessage::assistant(reply));
            }
            Err(e) => {
                warn!(error = %e, "{label}");
                self.error = Some(format!("{label}: {e}"));
            }
        }
        self.in_flight = false;
    }

    // Input editing. `cursor` counts chars, not bytes.

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.cursor = self.input.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;

    fn category(id: &str, name: &str) -> Category {
        Category {
            category_id: id.to_string(),
            category_name: name.to_string(),
        }
    }

    fn question(id: &str, text: &str) -> PresetQuestion {
        PresetQuestion {
            knowledge_id: id.to_string(),
            preset_question: text.to_string(),
        }
    }

    fn loaded_session() -> Session {
        let mut session = Session::new("Ken");
        session.start();
        session.apply(Outcome::Categories(Ok(vec![
            category("general", "Chat"),
            category("money", "Money"),
            category("food", "Food"),
        ])));
        session
    }

    fn session_with_presets() -> Session {
        let mut session = loaded_session();
        session.select_category("money");
        session.apply(Outcome::PresetQuestions {
            category_id: "money".to_string(),
            result: Ok(vec![
                question("k1", "How do I budget?"),
                question("k2", "Cheapest phone plan?"),
            ]),
        });
        session
    }

    #[test]
    fn test_new_session_has_greeting_only() {
        let session = Session::new("Ken");
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].role, ChatRole::Assistant);
        assert_eq!(session.active_category(), GENERAL_CATEGORY);
        assert!(!session.in_flight());
        assert!(session.error().is_none());
    }

    #[test]
    fn test_start_requests_categories_and_marks_busy() {
        let mut session = Session::new("Ken");
        assert_eq!(session.start(), Request::Categories);
        assert!(session.in_flight());
    }

    #[test]
    fn test_categories_loaded_keeps_general_and_clears_error() {
        let mut session = Session::new("Ken");
        session.start();
        session.apply(Outcome::Chat(Err("boom".to_string())));
        assert!(session.error().is_some());

        let fetched = vec![category("general", "Chat"), category("money", "Money")];
        session.apply(Outcome::Categories(Ok(fetched.clone())));

        assert_eq!(session.categories(), fetched.as_slice());
        assert_eq!(session.active_category(), GENERAL_CATEGORY);
        assert_eq!(session.active_category_index(), Some(0));
        assert!(session.error().is_none());
        assert!(!session.in_flight());
    }

    #[test]
    fn test_categories_failure_sets_error_and_empties() {
        let mut session = Session::new("Ken");
        session.set_input("hello?");
        session.submit_chat();
        session.apply(Outcome::Chat(Ok(Some("hi Ken".to_string()))));
        let before = session.transcript().to_vec();
        assert_eq!(before.len(), 3);

        session.start();
        session.apply(Outcome::Categories(Err("connection refused".to_string())));

        assert!(session.categories().is_empty());
        assert_eq!(session.error(), Some(CATEGORIES_ERROR));
        assert!(!session.in_flight());
        assert_eq!(session.transcript(), before.as_slice());
    }

    #[test]
    fn test_switch_to_general_clears_presets_without_request() {
        let mut session = session_with_presets();
        assert_eq!(session.preset_questions().len(), 2);

        assert_eq!(session.select_category(GENERAL_CATEGORY), None);
        assert!(session.preset_questions().is_empty());
        assert_eq!(session.active_category(), GENERAL_CATEGORY);
    }

    #[test]
    fn test_switch_to_category_issues_one_fetch() {
        let mut session = loaded_session();
        let request = session.select_category("food");
        assert_eq!(
            request,
            Some(Request::PresetQuestions {
                category_id: "food".to_string()
            })
        );
        assert_eq!(session.active_category(), "food");

        // Same tab again is not a change.
        assert_eq!(session.select_category("food"), None);
    }

    #[test]
    fn test_switch_with_no_categories_issues_nothing() {
        let mut session = Session::new("Ken");
        assert_eq!(session.select_category("money"), None);
        assert_eq!(session.active_category(), GENERAL_CATEGORY);
    }

    #[test]
    fn test_preset_response_without_questions_empties_list() {
        let mut session = session_with_presets();
        session.select_category("food");
        session.apply(Outcome::PresetQuestions {
            category_id: "food".to_string(),
            result: Ok(Vec::new()),
        });
        assert!(session.preset_questions().is_empty());
    }

    #[test]
    fn test_preset_failure_sets_error_and_empties() {
        let mut session = loaded_session();
        session.set_input("what should I eat?");
        session.submit_chat();
        session.apply(Outcome::Chat(Ok(Some("rice".to_string()))));
        let before = session.transcript().to_vec();
        assert_eq!(before.len(), 3);

        session.select_category("money");
        session.apply(Outcome::PresetQuestions {
            category_id: "money".to_string(),
            result: Err("request failed with status code 500".to_string()),
        });
        assert!(session.preset_questions().is_empty());
        assert!(session
            .error()
            .is_some_and(|e| e.starts_with("Failed to load preset questions")));
        assert!(!session.in_flight());
        assert_eq!(session.transcript(), before.as_slice());
    }

    #[test]
    fn test_stale_preset_response_is_dropped() {
        let mut session = loaded_session();
        session.select_category("money");
        session.select_category("food");

        session.apply(Outcome::PresetQuestions {
            category_id: "money".to_string(),
            result: Ok(vec![question("k1", "How do I budget?")]),
        });
        assert!(session.preset_questions().is_empty());

        session.apply(Outcome::PresetQuestions {
            category_id: "food".to_string(),
            result: Ok(vec![question("k9", "Quick dinner?")]),
        });
        assert_eq!(session.preset_questions().len(), 1);
    }

    #[test]
    fn test_cycle_category_wraps() {
        let mut session = loaded_session();
        assert_eq!(
            session.cycle_category(-1),
            Some(Request::PresetQuestions {
                category_id: "food".to_string()
            })
        );
        assert_eq!(
            session.cycle_category(1),
            None,
            "wrapping onto general makes no request"
        );
        assert_eq!(session.active_category(), GENERAL_CATEGORY);
    }

    #[test]
    fn test_invoke_preset_appends_question_and_answer() {
        let mut session = session_with_presets();
        let request = session.invoke_preset(1);

        assert_eq!(
            request,
            Some(Request::Knowledge {
                knowledge_id: "k2".to_string()
            })
        );
        assert!(session.in_flight());
        assert_eq!(
            session.transcript().last(),
            Some(&ChatMessage::user("Cheapest phone plan?"))
        );

        session.apply(Outcome::Knowledge(Ok(Some("Go prepaid.".to_string()))));
        assert_eq!(
            session.transcript().last(),
            Some(&ChatMessage::assistant("Go prepaid."))
        );
        assert!(!session.in_flight());
    }

    #[test]
    fn test_invoke_preset_out_of_range() {
        let mut session = session_with_presets();
        assert_eq!(session.invoke_preset(7), None);
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn test_invoke_preset_ignores_busy_flag() {
        let mut session = session_with_presets();
        session.invoke_preset(0);
        assert!(session.invoke_preset(1).is_some());
    }

    #[test]
    fn test_knowledge_failure_leaves_question_unanswered() {
        let mut session = session_with_presets();
        session.invoke_preset(0);
        session.apply(Outcome::Knowledge(Err("timed out".to_string())));

        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.transcript()[1].role, ChatRole::User);
        assert_eq!(session.error(), Some("Knowledge API error: timed out"));
        assert!(!session.in_flight());
    }

    #[test]
    fn test_missing_answer_uses_fallback() {
        let mut session = session_with_presets();
        session.invoke_preset(0);
        session.apply(Outcome::Knowledge(Ok(None)));
        assert_eq!(
            session.transcript().last(),
            Some(&ChatMessage::assistant(FALLBACK_REPLY))
        );
    }

    #[test]
    fn test_blank_submit_is_noop() {
        let mut session = loaded_session();
        session.set_input("   \t ");
        let before = session.clone();

        assert_eq!(session.submit_chat(), None);
        assert_eq!(session.input(), before.input());
        assert_eq!(session.transcript(), before.transcript());
        assert!(!session.in_flight());
    }

    #[test]
    fn test_submit_while_pending_is_noop() {
        let mut session = loaded_session();
        session.set_input("first");
        assert!(session.submit_chat().is_some());

        session.set_input("second");
        assert_eq!(session.submit_chat(), None);
        assert_eq!(session.input(), "second");
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn test_submit_sends_prior_transcript() {
        let mut session = loaded_session();
        session.set_input("what's for dinner?");

        let request = session.submit_chat();

        assert_eq!(
            request,
            Some(Request::Chat {
                history: vec![greeting("Ken")],
                prompt: "what's for dinner?".to_string(),
            })
        );
        assert_eq!(session.input(), "");
        assert_eq!(session.cursor(), 0);
        assert!(session.in_flight());
    }

    #[test]
    fn test_successful_chat_adds_two_entries_in_order() {
        let mut session = loaded_session();
        let before = session.transcript().len();
        session.set_input("hi");
        session.submit_chat();
        session.apply(Outcome::Chat(Ok(Some("hey!".to_string()))));

        let transcript = session.transcript();
        assert_eq!(transcript.len(), before + 2);
        assert_eq!(transcript[before], ChatMessage::user("hi"));
        assert_eq!(transcript[before + 1], ChatMessage::assistant("hey!"));
        assert!(!session.in_flight());
    }

    #[test]
    fn test_chat_failure_keeps_transcript() {
        let mut session = loaded_session();
        session.set_input("hi");
        session.submit_chat();
        let before = session.transcript().to_vec();

        session.apply(Outcome::Chat(Err("request failed with status code 502".to_string())));

        assert_eq!(session.transcript(), before.as_slice());
        assert!(session.error().is_some_and(|e| e.starts_with("Chat API error")));
        assert!(!session.in_flight());
    }

    #[test]
    fn test_input_editing_is_char_based() {
        let mut session = Session::new("Ken");
        for c in "añb".chars() {
            session.insert_char(c);
        }
        session.cursor_left();
        session.backspace();
        assert_eq!(session.input(), "ab");
        assert_eq!(session.cursor(), 1);

        session.cursor_home();
        session.delete();
        assert_eq!(session.input(), "b");

        session.cursor_end();
        session.insert_char('!');
        assert_eq!(session.input(), "b!");
        session.cursor_right();
        assert_eq!(session.cursor(), 2);
    }
}
