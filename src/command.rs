use crate::env::Environment;
use crate::registry::CommandRegistry;
use std::io::{self, Write};

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// What the caller should do after a command returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command finished with this status; an interactive session continues.
    Done(ExitCode),
    /// The session must end with this status.
    Terminate(ExitCode),
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Done(code) | Outcome::Terminate(code) => code,
        }
    }
}

/// A failure that aborts the whole invocation.
///
/// Handlers return it instead of exiting the process; the [`Interpreter`](crate::Interpreter)
/// prints it to standard error and terminates with [`CommandError::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{command}: cannot access '{path}': {source}")]
    CannotAccess {
        command: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("write error: {0}")]
    Io(#[from] io::Error),
}

impl CommandError {
    pub fn exit_code(&self) -> ExitCode {
        1
    }
}

/// Object-safe trait for a command instance that is ready to run.
///
/// Implemented by built-ins via a blanket impl and by the argument-error command.
pub trait ExecutableCommand {
    /// Executes the command.
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
        registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError>;
}

/// A named entry in the [`CommandRegistry`](crate::CommandRegistry).
///
/// The factory turns raw arguments into an [`ExecutableCommand`]; argument parsing
/// happens here so that `--help` and usage errors never reach the handler.
pub trait CommandFactory {
    /// Unique key the command is registered and looked up under.
    fn name(&self) -> &'static str;

    /// One-line description for `help`.
    fn description(&self) -> &'static str;

    /// Create a command instance for the provided arguments.
    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannot_access_display() {
        let e = CommandError::CannotAccess {
            command: "ls",
            path: "/nope".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            e.to_string(),
            "ls: cannot access '/nope': No such file or directory"
        );
        assert_eq!(e.exit_code(), 1);
    }

    #[test]
    fn outcome_exit_code() {
        assert_eq!(Outcome::Done(3).exit_code(), 3);
        assert_eq!(Outcome::Terminate(0).exit_code(), 0);
    }
}
