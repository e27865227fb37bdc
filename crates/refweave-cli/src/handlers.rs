//! Command handlers for CLI subcommands
//!
//! Each handler loads its inputs from disk, runs the core engine and hands
//! the resulting document to [`utils::write_result`], which prints it, saves
//! it or checks it against a golden file.
//!
//! Copyright (c) 2025 Refweave Team
//! Licensed under the Apache-2.0 license

mod compose;
mod embed;
mod utils;

pub use compose::handle_compose;
pub use embed::handle_embed;
