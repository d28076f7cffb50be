//! Interpretation of one line typed at the chat prompt.

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Nothing but whitespace.
    Empty,
    /// Regular chat text.
    Message(String),
    /// `/copy N` — copy the N-th code block (1-based) of the last reply.
    Copy(usize),
    /// `/history`
    History,
    /// `/help`
    Help,
    /// `/quit` or `/exit`
    Quit,
    /// A slash command that could not be understood.
    Invalid(String),
}

pub const HELP: &str = "\
/copy N    copy the N-th code block of the last reply
/history   print the conversation
/help      show this help
/quit      leave the chat";

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Input::Message(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("quit" | "exit"), None, None) => Input::Quit,
            (Some("history"), None, None) => Input::History,
            (Some("help"), None, None) => Input::Help,
            (Some("copy"), None, None) => Input::Copy(1),
            (Some("copy"), Some(n), None) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Input::Copy(n),
                _ => Input::Invalid(format!("not a code block number: {n}")),
            },
            _ => Input::Invalid(format!("unknown command: {line}")),
        }
    }
}
