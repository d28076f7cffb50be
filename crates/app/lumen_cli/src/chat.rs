//! Interactive chat loop and one-shot ask.

use std::io::{self, Write};
use std::time::Duration;

use log::{debug, info};
use tokio::io::{AsyncBufReadExt, BufReader};

use lumen_core::backend::{ChatBackend, HttpChatBackend};
use lumen_core::clipboard::{ClipboardHelper, CopyButton, CopyPath};
use lumen_core::markup::{format_message, to_plain_text};
use lumen_core::models::chat::{ChatMessage, ChatRole};
use lumen_core::session::{ChatSession, SessionConfig};

use crate::{Error, Result};
use crate::cli::{ChatArgs, RelayArgs};
use crate::commands::{HELP, Input};
use crate::terminal::TerminalView;

const PROMPT: &str = "> ";

pub async fn run(args: ChatArgs) -> Result<()> {
    let backend = HttpChatBackend::new(&args.relay.url);
    info!("chatting with {}", backend.endpoint());

    let config = SessionConfig {
        typing_delay: Duration::from_millis(args.delay_ms),
        error_message: args.error_message,
    };
    let session = ChatSession::with_config(backend, TerminalView::new(io::stdout()), config);
    let mut clipboard = ClipboardHelper::system();
    let button = CopyButton::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Type a message, or /help for commands.");
    loop {
        print!("{PROMPT}");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match Input::parse(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::History => print!("{}", history_lines(&session.history())),
            Input::Invalid(reason) => println!("{reason}"),
            Input::Copy(n) => {
                println!(
                    "{}",
                    copy_block(&session.history(), &mut clipboard, &button, n)
                );
            }
            Input::Message(text) => {
                session.with_view(|view| view.set_input(text));
                tokio::select! {
                    outcome = session.send_message() => debug!("turn finished: {outcome:?}"),
                    _ = tokio::signal::ctrl_c() => {
                        session.shutdown();
                        println!();
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Send a single message and print the reply as plain text.
pub async fn ask(relay: RelayArgs, message: String) -> Result<()> {
    let backend = HttpChatBackend::new(&relay.url);
    let reply = backend.complete(&[ChatMessage::user(message)]).await?;
    if reply.is_empty() {
        return Err(Error::Custom("relay returned an empty reply".into()));
    }
    println!("{}", to_plain_text(&format_message(&reply)));
    Ok(())
}

/// One `role: text` entry per message.
fn history_lines(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| format!("{}: {}\n", m.role, m.content))
        .collect()
}

/// Copy the `n`-th (1-based) code block of the last reply and describe
/// what happened.
fn copy_block(
    history: &[ChatMessage],
    clipboard: &mut ClipboardHelper,
    button: &CopyButton,
    n: usize,
) -> String {
    let Some(reply) = history.iter().rev().find(|m| m.role == ChatRole::Assistant) else {
        return "no reply yet".to_string();
    };
    let html = format_message(&reply.content);
    match clipboard.activate(button, &html, n.saturating_sub(1)) {
        Some(CopyPath::None) => format!("[{}] clipboard unavailable", button.label()),
        Some(_) => format!("[{}] code block {n}", button.label()),
        None => format!("no code block {n} in the last reply"),
    }
}
