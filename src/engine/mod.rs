//! Engine: CLI surface and the filesystem, hashing and progress helpers the copier uses.

pub mod arg_parser;
pub mod cli;
pub mod filesystem;
pub mod hashing;
pub mod progress;
pub mod tools;

pub use arg_parser::Cli;
pub use cli::handle_run;
pub use filesystem::{files_different, size_to_bytes};
pub use hashing::hash_file;
pub use tools::path_relative_to;
