use crate::command::{CommandError, CommandFactory, ExecutableCommand, Outcome};
use crate::env::Environment;
use crate::registry::CommandRegistry;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::marker::PhantomData;

/// Built-in commands known to the tool at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process. They never exit the process themselves: failures are returned as
/// [`CommandError`] and session termination as [`Outcome::Terminate`].
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "ls" or "ps".
    fn name() -> &'static str;

    /// One-line description shown by `help`.
    fn description() -> &'static str;

    /// Executes the command, writing its output to `stdout`.
    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
        registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError> {
        T::execute(*self, stdout, env, registry)
    }
}

/// Stands in for a command whose arguments failed to parse, or that was asked for `--help`.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        _registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(Outcome::Done(if self.is_error { 1 } else { 0 }))
    }
}

/// Registry entry for any [`BuiltinCommand`].
pub(crate) struct Factory<T> {
    _phantom: PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn description(&self) -> &'static str {
        T::description()
    }

    fn create(&self, args: &[&str]) -> Box<dyn ExecutableCommand> {
        match T::from_args(&[T::name()], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        }
    }
}

#[derive(FromArgs)]
/// Show the available commands.
pub struct Help {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn description() -> &'static str {
        "Show this help message"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError> {
        writeln!(stdout, "I am gosybox, a replacement for busybox written in Rust.")?;
        writeln!(stdout, "Available commands:")?;
        for cmd in registry.commands() {
            writeln!(stdout, "  {:<8} {}", cmd.name(), cmd.description())?;
        }
        Ok(Outcome::Done(0))
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn description() -> &'static str {
        "Shows current path to working directory"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError> {
        match env.get_var("PWD").filter(|wd| !wd.is_empty()) {
            Some(wd) => writeln!(stdout, "{wd}")?,
            None => writeln!(stdout, "{}", env.current_dir.to_string_lossy())?,
        }
        Ok(Outcome::Done(0))
    }
}

#[derive(FromArgs)]
/// Exit the tool.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn description() -> &'static str {
        "Exit interactive mode (alias: quit)"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _env: &mut Environment,
        _registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError> {
        writeln!(stdout, "Goodbye!")?;
        Ok(Outcome::Terminate(0))
    }
}
