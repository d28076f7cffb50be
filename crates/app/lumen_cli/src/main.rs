// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use lumen_core::markup::{format_message, to_plain_text};

mod chat;
mod cli;
mod commands;
mod logging;
mod terminal;

fn main() -> Result<()> {
    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<()> {
    logging::init()?;

    let args = Cli::parse();

    match args.command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Commands::Format { file, plain } => {
            let text = std::fs::read_to_string(&file)?;
            let html = format_message(&text);
            if plain {
                println!("{}", to_plain_text(&html));
            } else {
                println!("{html}");
            }
        }
        Commands::Chat(chat_args) => runtime()?.block_on(chat::run(chat_args))?,
        Commands::Ask { relay, message } => runtime()?.block_on(chat::ask(relay, message))?,
    }

    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
