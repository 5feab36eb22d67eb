//! Interactive operator input for volume swaps.

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Source of operator replies. `None` means input is closed (treated as abort by the copier).
pub trait Prompt: Send {
    fn input(&mut self, message: &str) -> Result<Option<String>>;
}

/// Reads one line from stdin after printing `message` to stderr.
#[derive(Default)]
pub struct CommandlinePrompt;

impl Prompt for CommandlinePrompt {
    fn input(&mut self, message: &str) -> Result<Option<String>> {
        let label = format!("[{}]", env!("CARGO_PKG_NAME")).cyan().bold();
        let mut stderr = std::io::stderr();
        write!(stderr, "{} {}", label, message).context("write prompt")?;
        stderr.flush().context("flush prompt")?;

        let mut line = String::new();
        let n = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("read reply")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Replies from a fixed script, in order; closed once exhausted. Useful for unattended runs.
#[derive(Default)]
pub struct ScriptedPrompt {
    replies: VecDeque<String>,
    asked: usize,
}

impl ScriptedPrompt {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            asked: 0,
        }
    }

    /// How many times input was requested.
    pub fn asked(&self) -> usize {
        self.asked
    }
}

impl Prompt for ScriptedPrompt {
    fn input(&mut self, _message: &str) -> Result<Option<String>> {
        self.asked += 1;
        Ok(self.replies.pop_front())
    }
}

/// Reply to the volume-swap prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapReply {
    Continue,
    Abort,
}

/// `c`/`C` continue, `q`/`Q` abort, anything else is not an answer.
pub fn parse_swap_reply(reply: &str) -> Option<SwapReply> {
    match reply {
        "c" | "C" => Some(SwapReply::Continue),
        "q" | "Q" => Some(SwapReply::Abort),
        _ => None,
    }
}
