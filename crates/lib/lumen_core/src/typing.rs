// @zen-component: CHAT-TypingAnimator
//
//! Typing reveal — replays a buffered reply one character at a time.
//!
//! Each step re-renders the revealed prefix through the markup formatter,
//! scrolls to the bottom and sleeps a fixed delay, so total duration grows
//! linearly with reply length. The reveal is cancellable through a
//! [`CancellationToken`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::markup::format_message;

/// Default per-character delay.
pub const DEFAULT_TYPING_DELAY: Duration = Duration::from_millis(15);

/// Target of a reveal: one message element.
pub trait RevealSink {
    /// Replace the element's content with `html`.
    fn render(&mut self, html: &str);

    fn scroll_to_bottom(&mut self);
}

/// How a reveal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    Cancelled,
}

/// Character-by-character revealer with a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct Typewriter {
    delay: Duration,
}

impl Typewriter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Reveal `full_text` into `sink`.
    ///
    /// Renders once per character (Unicode scalar value). An empty text is
    /// rendered once as empty and completes immediately.
    pub async fn reveal<S>(
        &self,
        sink: &mut S,
        full_text: &str,
        cancel: &CancellationToken,
    ) -> RevealOutcome
    where
        S: RevealSink + ?Sized,
    {
        if cancel.is_cancelled() {
            return RevealOutcome::Cancelled;
        }
        if full_text.is_empty() {
            sink.render("");
            return RevealOutcome::Completed;
        }

        let mut revealed = String::with_capacity(full_text.len());
        for ch in full_text.chars() {
            revealed.push(ch);
            sink.render(&format_message(&revealed));
            sink.scroll_to_bottom();

            tokio::select! {
                _ = cancel.cancelled() => return RevealOutcome::Cancelled,
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
        RevealOutcome::Completed
    }
}

impl Default for Typewriter {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_DELAY)
    }
}
