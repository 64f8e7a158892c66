// SPDX-FileCopyrightText: 2026 Streamchat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered in-memory transcript with at most one open assistant turn.

use streamchat_core::{ChatMessage, Feedback, MessageId, MessageRecord, Turn};
use tracing::debug;

/// Conversation turns in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
    /// Index of the assistant turn currently receiving fragments.
    open: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a closed transcript from durable records, oldest first.
    ///
    /// Each record expands into a user turn and an assistant turn; either side is
    /// omitted when its text is missing or empty. The assistant turn carries the
    /// record id and feedback.
    pub fn from_records(records: &[MessageRecord]) -> Self {
        let mut turns = Vec::with_capacity(records.len() * 2);
        for record in records {
            if let Some(text) = record.user_message.as_deref().filter(|t| !t.is_empty()) {
                turns.push(Turn::user(text));
            }
            if let Some(text) = record.ai_response.as_deref().filter(|t| !t.is_empty()) {
                let mut turn = Turn::assistant(text);
                turn.id = Some(record.id.clone());
                turn.feedback = record.feedback;
                turns.push(turn);
            }
        }
        Self { turns, open: None }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Content of the open assistant turn.
    pub fn open_content(&self) -> Option<&str> {
        self.open
            .and_then(|i| self.turns.get(i))
            .map(|t| t.content.as_str())
    }

    /// Most recent assistant turn, open or closed.
    pub fn last_assistant(&self) -> Option<&Turn> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == streamchat_core::Role::Assistant)
    }

    /// Closed turns with content, as request history.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .enumerate()
            .filter(|(i, t)| Some(*i) != self.open && !t.content.is_empty())
            .map(|(_, t)| ChatMessage {
                role: t.role,
                content: t.content.clone(),
            })
            .collect()
    }

    /// Appends a user turn and an empty assistant turn, opening the latter.
    /// Any previously open turn is closed. Returns the assistant turn's index.
    pub fn append_pair(&mut self, user_text: &str) -> usize {
        self.turns.push(Turn::user(user_text));
        self.turns.push(Turn::assistant(String::new()));
        let index = self.turns.len() - 1;
        self.open = Some(index);
        index
    }

    /// Appends `text` to the open assistant turn. Returns false when none is open.
    pub fn apply_fragment(&mut self, text: &str) -> bool {
        match self.open.and_then(|i| self.turns.get_mut(i)) {
            Some(turn) => {
                turn.content.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Discards fragments accumulated by a failed attempt.
    pub fn reset_open(&mut self) {
        if let Some(turn) = self.open.and_then(|i| self.turns.get_mut(i)) {
            turn.content.clear();
        }
    }

    /// Assigns the durable id to the trailing assistant turn.
    pub fn attach_id(&mut self, id: MessageId) -> bool {
        match self.turns.last_mut() {
            Some(turn) if turn.role == streamchat_core::Role::Assistant => {
                turn.id = Some(id);
                true
            }
            _ => false,
        }
    }

    /// Sets feedback on the turn carrying `id`. Returns whether a turn matched.
    pub fn set_feedback(&mut self, id: &MessageId, value: Feedback) -> bool {
        match self.turns.iter_mut().find(|t| t.id.as_ref() == Some(id)) {
            Some(turn) => {
                turn.feedback = Some(value);
                true
            }
            None => {
                debug!(message_id = %id, "feedback for unknown turn ignored");
                false
            }
        }
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.open = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamchat_core::{Role, SessionId};

    fn record(id: &str, user: Option<&str>, ai: Option<&str>) -> MessageRecord {
        MessageRecord {
            id: MessageId::from(id),
            session_id: SessionId::from("s"),
            user_message: user.map(String::from),
            ai_response: ai.map(String::from),
            feedback: None,
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn append_pair_opens_assistant_turn() {
        let mut t = Transcript::new();
        let index = t.append_pair("hello");
        assert_eq!(index, 1);
        assert_eq!(t.turns()[0].role, Role::User);
        assert_eq!(t.turns()[0].content, "hello");
        assert_eq!(t.turns()[1].role, Role::Assistant);
        assert_eq!(t.open_content(), Some(""));
    }

    #[test]
    fn fragments_concatenate_in_order() {
        let mut t = Transcript::new();
        t.append_pair("hello");
        assert!(t.apply_fragment("Hi"));
        assert!(t.apply_fragment(" there"));
        assert_eq!(t.open_content(), Some("Hi there"));
    }

    #[test]
    fn fragment_without_open_turn_is_noop() {
        let mut t = Transcript::new();
        assert!(!t.apply_fragment("stray"));
        t.append_pair("hello");
        t.close();
        assert!(!t.apply_fragment("late"));
        assert_eq!(t.turns()[1].content, "");
    }

    #[test]
    fn new_pair_closes_previous_one() {
        let mut t = Transcript::new();
        t.append_pair("one");
        t.apply_fragment("first");
        t.append_pair("two");
        t.apply_fragment("second");
        assert_eq!(t.turns()[1].content, "first");
        assert_eq!(t.turns()[3].content, "second");
    }

    #[test]
    fn reset_open_discards_partial_attempt() {
        let mut t = Transcript::new();
        t.append_pair("hello");
        t.apply_fragment("partial");
        t.reset_open();
        t.apply_fragment("full");
        assert_eq!(t.open_content(), Some("full"));
    }

    #[test]
    fn feedback_matches_by_id_only() {
        let mut t = Transcript::new();
        t.append_pair("hello");
        assert!(t.attach_id(MessageId::from("m-1")));
        t.close();

        assert!(!t.set_feedback(&MessageId::from("unknown"), Feedback::Good));
        assert_eq!(t.turns()[1].feedback, None);
        assert!(t.set_feedback(&MessageId::from("m-1"), Feedback::Bad));
        assert_eq!(t.turns()[1].feedback, Some(Feedback::Bad));
    }

    #[test]
    fn history_excludes_open_and_empty_turns() {
        let mut t = Transcript::new();
        t.append_pair("a");
        t.apply_fragment("b");
        t.append_pair("failed");
        t.close();
        t.append_pair("c");

        let history: Vec<(Role, String)> =
            t.history().into_iter().map(|m| (m.role, m.content)).collect();
        assert_eq!(
            history,
            vec![
                (Role::User, "a".to_string()),
                (Role::Assistant, "b".to_string()),
                (Role::User, "failed".to_string()),
                (Role::User, "c".to_string()),
            ]
        );
    }

    #[test]
    fn from_records_expands_pairs() {
        let records = vec![
            record("r1", Some("a"), Some("b")),
            record("r2", Some("c"), Some("d")),
        ];
        let t = Transcript::from_records(&records);
        let flat: Vec<(Role, &str)> = t
            .turns()
            .iter()
            .map(|turn| (turn.role, turn.content.as_str()))
            .collect();
        assert_eq!(
            flat,
            vec![
                (Role::User, "a"),
                (Role::Assistant, "b"),
                (Role::User, "c"),
                (Role::Assistant, "d"),
            ]
        );
        assert_eq!(t.turns()[1].id, Some(MessageId::from("r1")));
        assert_eq!(t.turns()[0].id, None);
        assert!(!t.is_open());
    }

    #[test]
    fn from_records_skips_empty_sides() {
        let records = vec![record("r1", Some("a"), Some("")), record("r2", None, Some("x"))];
        let t = Transcript::from_records(&records);
        assert_eq!(t.len(), 2);
        assert_eq!(t.turns()[0].content, "a");
        assert_eq!(t.turns()[1].content, "x");
    }
}
