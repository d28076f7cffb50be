// @zen-component: CHAT-SessionController
//
//! Chat session — owns one conversation and drives a turn end to end.
//!
//! A turn moves `idle → sending → awaiting → rendering | error-display →
//! idle`. At most one turn is in flight per session: a second
//! [`ChatSession::send_message`] while one is running is a silent no-op.
//! The view is locked only between awaits, never across one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::ChatBackend;
use crate::markup::format_message;
use crate::models::chat::{ChatMessage, ChatRole};
use crate::typing::{DEFAULT_TYPING_DELAY, RevealOutcome, RevealSink, Typewriter};
use crate::view::{ChatView, MessageId};

/// Shown in the transcript when a turn fails. Never added to history.
pub const DEFAULT_ERROR_MESSAGE: &str = "Terjadi kesalahan saat memproses AI.";

/// Tunables for a [`ChatSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Per-character delay of the typing reveal.
    pub typing_delay: Duration,
    /// Transcript text for a failed turn.
    pub error_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            typing_delay: DEFAULT_TYPING_DELAY,
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Result of one [`ChatSession::send_message`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Empty input or a turn already in flight; nothing happened.
    Skipped,
    /// The reply was revealed and recorded in history.
    Replied,
    /// The backend failed; the error text was shown but not recorded.
    Failed,
}

/// One chat conversation bound to a backend and a view.
pub struct ChatSession<B, V> {
    backend: B,
    view: Mutex<V>,
    history: Mutex<Vec<ChatMessage>>,
    in_flight: AtomicBool,
    typewriter: Typewriter,
    error_message: String,
    cancel: CancellationToken,
}

impl<B, V> ChatSession<B, V>
where
    B: ChatBackend,
    V: ChatView,
{
    pub fn new(backend: B, view: V) -> Self {
        Self::with_config(backend, view, SessionConfig::default())
    }

    pub fn with_config(backend: B, view: V, config: SessionConfig) -> Self {
        Self {
            backend,
            view: Mutex::new(view),
            history: Mutex::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            typewriter: Typewriter::new(config.typing_delay),
            error_message: config.error_message,
            cancel: CancellationToken::new(),
        }
    }

    /// Send the current input as a user turn.
    pub async fn send_message(&self) -> SendOutcome {
        let message = self.with_view(|view| view.input_value()).trim().to_string();
        if message.is_empty() {
            return SendOutcome::Skipped;
        }
        let Some(turn) = TurnGuard::acquire(&self.in_flight, &self.view) else {
            debug!("send ignored, a turn is already in flight");
            return SendOutcome::Skipped;
        };

        self.with_view(|view| {
            view.set_input_enabled(false);
            view.append_message(ChatRole::User, &format_message(&message));
            view.clear_input();
            view.set_typing_indicator(true);
            view.scroll_to_bottom();
        });
        let outgoing = {
            let mut history = self.lock_history();
            history.push(ChatMessage::user(message));
            history.clone()
        };

        let outcome = match self.backend.complete(&outgoing).await {
            Ok(reply) => {
                self.reveal_reply(&reply).await;
                SendOutcome::Replied
            }
            Err(e) => {
                warn!(error = %e, "chat turn failed");
                let error_html = format_message(&self.error_message);
                self.with_view(|view| {
                    view.append_message(ChatRole::Assistant, &error_html);
                    view.scroll_to_bottom();
                });
                SendOutcome::Failed
            }
        };

        drop(turn);
        outcome
    }

    async fn reveal_reply(&self, reply: &str) {
        let id = self.with_view(|view| view.append_message(ChatRole::Assistant, ""));
        let mut sink = ViewSink {
            view: &self.view,
            id,
        };
        let outcome = self.typewriter.reveal(&mut sink, reply, &self.cancel).await;
        if outcome == RevealOutcome::Cancelled {
            debug!("reply reveal cancelled");
        }
        // History keeps the full reply even if the reveal was cut short.
        self.lock_history().push(ChatMessage::assistant(reply));
    }

    /// Snapshot of the conversation so far.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.lock_history().clone()
    }

    /// Whether a turn is currently in flight.
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run `f` with exclusive access to the view.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut V) -> R) -> R {
        f(&mut lock(&self.view))
    }

    /// Abort any running reveal. The session stays usable for display but
    /// later reveals end immediately.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn lock_history(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        lock(&self.history)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the in-flight flag for one turn and restores the idle view state
/// when dropped, including when the turn future is dropped mid-await.
struct TurnGuard<'a, V: ChatView> {
    in_flight: &'a AtomicBool,
    view: &'a Mutex<V>,
}

impl<'a, V: ChatView> TurnGuard<'a, V> {
    fn acquire(in_flight: &'a AtomicBool, view: &'a Mutex<V>) -> Option<Self> {
        if in_flight.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(Self { in_flight, view })
    }
}

impl<V: ChatView> Drop for TurnGuard<'_, V> {
    fn drop(&mut self) {
        let mut view = lock(self.view);
        view.set_typing_indicator(false);
        self.in_flight.store(false, Ordering::SeqCst);
        view.set_input_enabled(true);
        view.focus_input();
    }
}

/// Reveal target bound to one message element.
struct ViewSink<'a, V> {
    view: &'a Mutex<V>,
    id: MessageId,
}

impl<V: ChatView> RevealSink for ViewSink<'_, V> {
    fn render(&mut self, html: &str) {
        lock(self.view).render_message(self.id, html);
    }

    fn scroll_to_bottom(&mut self) {
        lock(self.view).scroll_to_bottom();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::backend::ClientError;
    use crate::markup::code_block;
    use crate::view::Transcript;

    /// Backend that answers with a fixed reply and records each call.
    struct FixedBackend {
        reply: String,
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl FixedBackend {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for FixedBackend {
        async fn complete(&self, history: &[ChatMessage]) -> Result<String, ClientError> {
            self.calls.lock().unwrap().push(history.to_vec());
            Ok(self.reply.clone())
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl ChatBackend for FailingBackend {
        async fn complete(&self, _history: &[ChatMessage]) -> Result<String, ClientError> {
            Err(ClientError::Status(502))
        }
    }

    /// Backend that blocks until released, to hold a turn in flight.
    #[derive(Default)]
    struct GatedBackend {
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ChatBackend for GatedBackend {
        async fn complete(&self, _history: &[ChatMessage]) -> Result<String, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok("done".to_string())
        }
    }

    fn session<B: ChatBackend>(backend: B) -> ChatSession<B, Transcript> {
        ChatSession::with_config(
            backend,
            Transcript::new(),
            SessionConfig {
                typing_delay: Duration::from_millis(1),
                ..SessionConfig::default()
            },
        )
    }

    fn type_input<B: ChatBackend>(session: &ChatSession<B, Transcript>, text: &str) {
        session.with_view(|view| view.set_input(text));
    }

    #[tokio::test(start_paused = true)]
    async fn successful_turn_records_both_messages() {
        let session = session(FixedBackend::new("hello there"));
        type_input(&session, "  hi  ");

        assert_eq!(session.send_message().await, SendOutcome::Replied);

        assert_eq!(
            session.history(),
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello there")]
        );
        session.with_view(|view| {
            let roles: Vec<ChatRole> = view.messages().iter().map(|m| m.role).collect();
            assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
            assert_eq!(view.messages()[1].html, "hello there");
            assert_eq!(view.input_value(), "");
        });
    }

    #[tokio::test(start_paused = true)]
    async fn backend_receives_history_including_new_turn() {
        let session = session(FixedBackend::new("r"));
        type_input(&session, "first");
        session.send_message().await;
        type_input(&session, "second");
        session.send_message().await;

        let calls = session.backend().calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], vec![ChatMessage::user("first")]);
        assert_eq!(
            calls[1],
            vec![
                ChatMessage::user("first"),
                ChatMessage::assistant("r"),
                ChatMessage::user("second"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reply_is_revealed_incrementally() {
        let session = session(FixedBackend::new("abc"));
        type_input(&session, "go");
        session.send_message().await;

        session.with_view(|view| {
            assert_eq!(view.render_count(), 3);
            assert_eq!(view.last_message().map(|m| m.html.as_str()), Some("abc"));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn code_in_reply_is_copyable_from_transcript() {
        let session = session(FixedBackend::new("Use:\n```js\nconsole.log(1)\n```"));
        type_input(&session, "how?");
        session.send_message().await;

        let html = session.with_view(|view| view.last_message().map(|m| m.html.clone()));
        let html = html.expect("assistant message");
        assert!(html.contains("<code>console.log(1)</code>"));
        assert_eq!(code_block(&html, 0).as_deref(), Some("console.log(1)"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_is_ignored() {
        let session = session(FixedBackend::new("r"));
        type_input(&session, "   \n\t ");

        assert_eq!(session.send_message().await, SendOutcome::Skipped);
        assert!(session.history().is_empty());
        assert!(session.backend().calls.lock().unwrap().is_empty());
        session.with_view(|view| assert!(view.messages().is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_turn_shows_error_but_keeps_history_clean() {
        let session = session(FailingBackend);
        type_input(&session, "hi");

        assert_eq!(session.send_message().await, SendOutcome::Failed);

        assert_eq!(session.history(), vec![ChatMessage::user("hi")]);
        session.with_view(|view| {
            assert_eq!(view.messages().len(), 2);
            let last = view.last_message().expect("error message");
            assert_eq!(last.role, ChatRole::Assistant);
            assert_eq!(last.html, DEFAULT_ERROR_MESSAGE);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_runs_after_success_and_failure() {
        let ok = session(FixedBackend::new("r"));
        type_input(&ok, "hi");
        ok.send_message().await;

        let failed = session(FailingBackend);
        type_input(&failed, "hi");
        failed.send_message().await;

        for s in [&ok.view, &failed.view] {
            let view = s.lock().unwrap();
            assert!(view.input_enabled());
            assert!(view.input_focused());
            assert!(!view.typing_visible());
        }
        assert!(!ok.is_processing());
        assert!(!failed.is_processing());
    }

    #[tokio::test]
    async fn second_send_while_in_flight_is_dropped() {
        let session = session(GatedBackend::default());
        type_input(&session, "first");

        let first = session.send_message();
        let second = async {
            session.backend().entered.notified().await;

            assert!(session.is_processing());
            session.with_view(|view| {
                assert!(view.typing_visible());
                assert!(!view.input_enabled());
            });

            type_input(&session, "second");
            let outcome = session.send_message().await;

            assert_eq!(session.history().len(), 1);
            session.with_view(|view| assert_eq!(view.messages().len(), 1));
            session.backend().release.notify_one();
            outcome
        };

        let (first, second) = tokio::join!(first, second);
        assert_eq!(first, SendOutcome::Replied);
        assert_eq!(second, SendOutcome::Skipped);
        assert_eq!(session.backend().calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn dropped_turn_still_releases_the_flag() {
        let session = session(GatedBackend::default());
        type_input(&session, "hi");

        {
            let turn = session.send_message();
            tokio::pin!(turn);
            tokio::select! {
                _ = &mut turn => panic!("turn should still be waiting"),
                _ = session.backend().entered.notified() => {}
            }
            assert!(session.is_processing());
        }

        assert!(!session.is_processing());
        session.with_view(|view| {
            assert!(view.input_enabled());
            assert!(!view.typing_visible());
        });
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cuts_reveal_short_but_records_full_reply() {
        let session = session(FixedBackend::new("a long reply"));
        session.shutdown();
        type_input(&session, "hi");

        assert_eq!(session.send_message().await, SendOutcome::Replied);
        assert_eq!(
            session.history().last(),
            Some(&ChatMessage::assistant("a long reply"))
        );
        session.with_view(|view| assert_eq!(view.render_count(), 0));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_error_message_is_used() {
        let session = ChatSession::with_config(
            FailingBackend,
            Transcript::new(),
            SessionConfig {
                error_message: "Something went wrong.".into(),
                ..SessionConfig::default()
            },
        );
        type_input(&session, "hi");
        session.send_message().await;

        session.with_view(|view| {
            assert_eq!(
                view.last_message().map(|m| m.html.as_str()),
                Some("Something went wrong.")
            );
        });
    }
}
