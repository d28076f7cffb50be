// @zen-component: CHAT-ClipboardHelper
//
//! Clipboard helper — copies a rendered code block to the system clipboard.
//!
//! The primary path is the platform clipboard API ([`SystemClipboard`]).
//! When it is unavailable the helper falls back to piping the text into the
//! platform copy command ([`CommandClipboard`]). Failure of both paths is
//! logged and otherwise silent.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::markup::{COPIED_LABEL, COPY_LABEL, code_block};

/// How long a copy button shows its acknowledgement label.
pub const COPY_ACK_DURATION: Duration = Duration::from_millis(1200);

#[cfg(target_os = "macos")]
const COPY_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(windows)]
const COPY_COMMANDS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(all(unix, not(target_os = "macos")))]
const COPY_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

#[cfg(not(any(unix, windows)))]
const COPY_COMMANDS: &[(&str, &[&str])] = &[];

/// Errors from a single clipboard path.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Copy command failed: {0}")]
    Command(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One way of putting text on the clipboard.
pub trait ClipboardBackend: Send {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Platform clipboard API via `arboard`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardBackend for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

/// Fallback that pipes text into an external copy command.
///
/// Candidates are tried in order; the first one that runs and exits
/// successfully wins.
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    commands: Vec<(String, Vec<String>)>,
}

impl CommandClipboard {
    /// Platform defaults (`pbcopy`, `wl-copy`/`xclip`/`xsel`, `clip`).
    pub fn new() -> Self {
        Self {
            commands: COPY_COMMANDS
                .iter()
                .map(|(program, args)| {
                    (
                        (*program).to_string(),
                        args.iter().map(|a| (*a).to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Use a single explicit command instead of the platform defaults.
    pub fn with_command(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            commands: vec![(
                program.into(),
                args.iter().map(|a| (*a).to_string()).collect(),
            )],
        }
    }

    fn run(program: &str, args: &[String], text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Command(format!(
                "{program} exited with {}",
                status.code().unwrap_or(-1)
            )))
        }
    }
}

impl Default for CommandClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipboardBackend for CommandClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut last_error = None;
        for (program, args) in &self.commands {
            match Self::run(program, args, text) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!(program = %program, error = %e, "copy command failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| ClipboardError::Unavailable("no copy command available".into())))
    }
}

/// Which path ended up writing the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPath {
    Primary,
    Fallback,
    /// Both paths failed.
    None,
}

/// Copy with primary/fallback semantics.
pub struct ClipboardHelper {
    primary: Box<dyn ClipboardBackend>,
    fallback: Box<dyn ClipboardBackend>,
}

impl ClipboardHelper {
    pub fn new(primary: Box<dyn ClipboardBackend>, fallback: Box<dyn ClipboardBackend>) -> Self {
        Self { primary, fallback }
    }

    /// System clipboard with the platform copy command as fallback.
    pub fn system() -> Self {
        Self::new(Box::new(SystemClipboard), Box::new(CommandClipboard::new()))
    }

    /// Best-effort copy of `text`.
    pub fn copy(&mut self, text: &str) -> CopyPath {
        match self.primary.write_text(text) {
            Ok(()) => return CopyPath::Primary,
            Err(e) => debug!(error = %e, "clipboard API failed, trying fallback"),
        }
        match self.fallback.write_text(text) {
            Ok(()) => CopyPath::Fallback,
            Err(e) => {
                warn!(error = %e, "copy to clipboard failed");
                CopyPath::None
            }
        }
    }

    /// Copy the visible text of the `index`-th code block in `html`.
    ///
    /// Returns `None` when there is no such block.
    pub fn copy_code_block(&mut self, html: &str, index: usize) -> Option<CopyPath> {
        let code = code_block(html, index)?;
        Some(self.copy(&code))
    }

    /// Handle a click on a copy button: copy the block, then toggle the
    /// button label regardless of which path succeeded.
    pub fn activate(
        &mut self,
        button: &CopyButton,
        html: &str,
        index: usize,
    ) -> Option<CopyPath> {
        let path = self.copy_code_block(html, index)?;
        let _revert = button.acknowledge();
        Some(path)
    }
}

#[derive(Debug)]
struct ButtonState {
    label: &'static str,
    clicks: u64,
}

/// Label state of a copy button.
///
/// [`acknowledge`](Self::acknowledge) shows [`COPIED_LABEL`] and schedules
/// the revert to [`COPY_LABEL`] after [`COPY_ACK_DURATION`]. Only the
/// timer of the latest click reverts the label.
#[derive(Debug, Clone)]
pub struct CopyButton {
    state: Arc<Mutex<ButtonState>>,
}

impl CopyButton {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ButtonState {
                label: COPY_LABEL,
                clicks: 0,
            })),
        }
    }

    pub fn label(&self) -> &'static str {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .label
    }

    /// Switch to the acknowledgement label. Must run inside a tokio runtime.
    pub fn acknowledge(&self) -> JoinHandle<()> {
        let click = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.label = COPIED_LABEL;
            state.clicks += 1;
            state.clicks
        };

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(COPY_ACK_DURATION).await;
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.clicks == click {
                state.label = COPY_LABEL;
            }
        })
    }
}

impl Default for CopyButton {
    fn default() -> Self {
        Self::new()
    }
}
