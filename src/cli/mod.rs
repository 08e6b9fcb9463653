//! Terminal output for the administrative subcommands

mod console;

pub use console::Console;
