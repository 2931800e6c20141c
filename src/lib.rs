//! A tiny busybox-style multi-command utility.
//!
//! A single binary dispatches to one of several built-in commands, either once from
//! the process arguments (batch mode) or repeatedly from an interactive loop. The
//! interesting commands are the OS-introspection ones: `ls`/`lt` read directory
//! metadata and `ps` parses the kernel's process table.
//!
//! The main entry point is [`Interpreter`], which owns a [`CommandRegistry`] and an
//! [`Environment`]. The public modules [`command`] and [`env`] expose the traits and
//! types needed to implement and run your own commands.

mod builtin;
pub mod command;
pub mod env;
mod interpreter;
mod listing;
mod procfs;
mod registry;

/// Just a convenient re-export of the command runner.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::{BufLines, EditorLines, Interpreter, LineReader, ReplError};
pub use registry::CommandRegistry;

pub use listing::{DirEntryInfo, EntryMeta, permission_string, read_listing, sort_by_mtime};
pub use procfs::{ProcessRecord, StatusRecord, parse_status_record, read_process_table};
