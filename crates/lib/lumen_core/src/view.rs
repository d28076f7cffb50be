//! View seam between the chat session and whatever renders it.
//!
//! A browser page, a terminal or a test transcript all implement
//! [`ChatView`]. Message elements are created once per turn and then
//! re-rendered in place; they are never removed.

use crate::models::chat::ChatRole;

/// Handle of a rendered message element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub usize);

/// Everything the chat session needs from its user interface.
pub trait ChatView: Send {
    /// Current raw value of the input field.
    fn input_value(&self) -> String;

    fn clear_input(&mut self);

    fn set_input_enabled(&mut self, enabled: bool);

    fn focus_input(&mut self);

    fn set_typing_indicator(&mut self, visible: bool);

    /// Append a message element holding already-formatted `html`.
    fn append_message(&mut self, role: ChatRole, html: &str) -> MessageId;

    /// Replace the content of an existing message element.
    fn render_message(&mut self, id: MessageId, html: &str);

    fn scroll_to_bottom(&mut self);
}

/// A message element as held by [`Transcript`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub role: ChatRole,
    pub html: String,
}

/// In-memory view that records everything rendered into it.
#[derive(Debug, Clone)]
pub struct Transcript {
    input: String,
    input_enabled: bool,
    input_focused: bool,
    typing_visible: bool,
    messages: Vec<RenderedMessage>,
    renders: usize,
    scrolls: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            input_enabled: true,
            input_focused: false,
            typing_visible: false,
            messages: Vec::new(),
            renders: 0,
            scrolls: 0,
        }
    }

    /// Simulate the user typing into the input field.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn messages(&self) -> &[RenderedMessage] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&RenderedMessage> {
        self.messages.last()
    }

    /// Most recent assistant message, if any.
    pub fn last_assistant(&self) -> Option<&RenderedMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant)
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn typing_visible(&self) -> bool {
        self.typing_visible
    }

    /// Number of in-place re-renders performed so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView for Transcript {
    fn input_value(&self) -> String {
        self.input.clone()
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        if !enabled {
            self.input_focused = false;
        }
    }

    fn focus_input(&mut self) {
        self.input_focused = self.input_enabled;
    }

    fn set_typing_indicator(&mut self, visible: bool) {
        self.typing_visible = visible;
    }

    fn append_message(&mut self, role: ChatRole, html: &str) -> MessageId {
        self.messages.push(RenderedMessage {
            role,
            html: html.to_string(),
        });
        MessageId(self.messages.len() - 1)
    }

    fn render_message(&mut self, id: MessageId, html: &str) {
        if let Some(message) = self.messages.get_mut(id.0) {
            message.html.clear();
            message.html.push_str(html);
            self.renders += 1;
        }
    }

    fn scroll_to_bottom(&mut self) {
        self.scrolls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_transcript_accepts_input() {
        let t = Transcript::new();
        assert!(t.input_enabled());
        assert!(!t.typing_visible());
        assert!(t.messages().is_empty());
    }

    #[test]
    fn render_replaces_content_in_place() {
        let mut t = Transcript::new();
        let id = t.append_message(ChatRole::Assistant, "");
        t.render_message(id, "partial");
        t.render_message(id, "partial text");
        assert_eq!(t.messages().len(), 1);
        assert_eq!(t.messages()[0].html, "partial text");
        assert_eq!(t.render_count(), 2);
    }

    #[test]
    fn render_of_unknown_id_is_ignored() {
        let mut t = Transcript::new();
        t.render_message(MessageId(3), "x");
        assert!(t.messages().is_empty());
        assert_eq!(t.render_count(), 0);
    }

    #[test]
    fn disabled_input_cannot_be_focused() {
        let mut t = Transcript::new();
        t.set_input_enabled(false);
        t.focus_input();
        assert!(!t.input_focused());
        t.set_input_enabled(true);
        t.focus_input();
        assert!(t.input_focused());
    }

    #[test]
    fn last_assistant_skips_user_messages() {
        let mut t = Transcript::new();
        t.append_message(ChatRole::Assistant, "a1");
        t.append_message(ChatRole::User, "u1");
        assert_eq!(t.last_assistant().map(|m| m.html.as_str()), Some("a1"));
    }
}
