use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use lumen_core::session::DEFAULT_ERROR_MESSAGE;

#[derive(Parser, Debug)]
#[command(name = "lumen", about = "Terminal chat client for a Lumen relay", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat session.
    Chat(ChatArgs),
    /// Send one message and print the reply.
    Ask {
        #[command(flatten)]
        relay: RelayArgs,
        /// Message text.
        message: String,
    },
    /// Render a file through the markup formatter.
    Format {
        /// File holding raw model text.
        file: PathBuf,
        /// Print the terminal rendering instead of HTML.
        #[arg(long)]
        plain: bool,
    },
    /// Print the version.
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct RelayArgs {
    /// Base URL of the relay server.
    #[arg(long, env = "LUMEN_URL", default_value = "http://127.0.0.1:8787")]
    pub url: String,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    #[command(flatten)]
    pub relay: RelayArgs,

    /// Delay between revealed characters, in milliseconds.
    #[arg(long, default_value_t = 15)]
    pub delay_ms: u64,

    /// Text shown when a turn fails.
    #[arg(long, default_value = DEFAULT_ERROR_MESSAGE)]
    pub error_message: String,
}
