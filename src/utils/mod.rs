pub mod config;
pub mod logger;
pub mod mvcopy_toml;
pub mod prompt;
pub mod tempfiles;

pub use config::*;
pub use logger::setup_logging;
pub use prompt::{CommandlinePrompt, Prompt, ScriptedPrompt, SwapReply, parse_swap_reply};
pub use tempfiles::{remove_if_exists, rename_temp_to_final, temp_path_for, write_atomic};
