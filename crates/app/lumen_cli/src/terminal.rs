// @zen-component: CLI-TerminalView
//
//! Chat view that writes the transcript to a terminal.
//!
//! Messages are shown as plain text. A reveal normally only appends, so
//! each render prints the new suffix. When a code fence closes, the text
//! already printed changes shape; the view then moves the cursor back to
//! where the two versions diverge and reprints from there.

use std::io::Write;

use lumen_core::markup::to_plain_text;
use lumen_core::models::chat::ChatRole;
use lumen_core::view::{ChatView, MessageId};

pub const TYPING_INDICATOR: &str = "lumen is typing...";

const CLEAR_LINE: &str = "\r\x1b[2K";
const CLEAR_BELOW: &str = "\x1b[J";

struct ActiveMessage {
    id: MessageId,
    prefix_width: usize,
    printed: String,
}

/// [`ChatView`] over any writer, normally stdout.
pub struct TerminalView<W> {
    out: W,
    input: String,
    next_id: usize,
    active: Option<ActiveMessage>,
    typing: bool,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            input: String::new(),
            next_id: 0,
            active: None,
            typing: false,
        }
    }

    /// Put a line typed at the prompt into the input field.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            log::warn!("terminal write failed: {e}");
        }
    }

    fn end_line(&mut self) {
        if self.active.take().is_some() {
            self.write("\n");
        }
    }

    fn clear_indicator(&mut self) {
        if self.typing {
            self.typing = false;
            self.write(CLEAR_LINE);
        }
    }
}

impl<W: Write + Send> ChatView for TerminalView<W> {
    fn input_value(&self) -> String {
        self.input.clone()
    }

    fn clear_input(&mut self) {
        self.input.clear();
    }

    fn set_input_enabled(&mut self, _enabled: bool) {
        // The prompt is only printed between turns.
    }

    fn focus_input(&mut self) {
        self.end_line();
    }

    fn set_typing_indicator(&mut self, visible: bool) {
        if visible {
            self.end_line();
            if !self.typing {
                self.typing = true;
                self.write(TYPING_INDICATOR);
            }
        } else {
            self.clear_indicator();
        }
    }

    fn append_message(&mut self, role: ChatRole, html: &str) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;

        // The prompt line already shows what the user typed.
        if role == ChatRole::User {
            return id;
        }

        self.clear_indicator();
        self.end_line();

        let prefix = match role {
            ChatRole::Assistant => "lumen> ",
            _ => "system> ",
        };
        let text = to_plain_text(html);
        self.write(&format!("{prefix}{text}"));
        self.active = Some(ActiveMessage {
            id,
            prefix_width: prefix.chars().count(),
            printed: text,
        });
        id
    }

    fn render_message(&mut self, id: MessageId, html: &str) {
        let update = {
            let Some(active) = self.active.as_mut().filter(|a| a.id == id) else {
                return;
            };
            let text = to_plain_text(html);
            let common = common_prefix_len(&active.printed, &text);

            let mut update = String::new();
            if common < active.printed.len() {
                update.push_str(&rewind(
                    &active.printed[..common],
                    &active.printed[common..],
                    active.prefix_width,
                ));
            }
            update.push_str(&text[common..]);
            active.printed = text;
            update
        };
        if !update.is_empty() {
            self.write(&update);
        }
    }

    fn scroll_to_bottom(&mut self) {
        // Terminals follow the cursor.
    }
}

/// Byte length of the longest shared prefix, on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map_or_else(|| a.len().min(b.len()), |((i, _), _)| i)
}

/// Cursor movement from the end of `kept + dropped` back to the end of
/// `kept`, clearing everything below.
fn rewind(kept: &str, dropped: &str, prefix_width: usize) -> String {
    let lines_up = dropped.matches('\n').count();
    let column = match kept.rfind('\n') {
        Some(i) => kept[i + 1..].chars().count(),
        None => prefix_width + kept.chars().count(),
    };

    let mut seq = if lines_up > 0 {
        format!("\x1b[{lines_up}F")
    } else {
        "\r".to_string()
    };
    if column > 0 {
        seq.push_str(&format!("\x1b[{column}C"));
    }
    seq.push_str(CLEAR_BELOW);
    seq
}
