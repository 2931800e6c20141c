use crate::command::{CommandError, ExitCode, Outcome};
use crate::env::Environment;
use crate::registry::CommandRegistry;
use anyhow::Context;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, IsTerminal, Write};

const PROMPT: &str = "gosybox> ";

/// Failure of the interactive session itself, as opposed to a command.
#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Readline(#[from] ReadlineError),
}

/// Source of input lines for the interactive loop.
pub trait LineReader {
    /// Show `prompt` and read one line without its terminator.
    ///
    /// Returns `Ok(None)` at end of input.
    fn read_line(&mut self, prompt: &str, stdout: &mut dyn Write)
    -> Result<Option<String>, ReplError>;
}

/// Reads lines from any buffered reader, e.g. piped standard input.
pub struct BufLines<R> {
    input: R,
}

impl<R: BufRead> BufLines<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> LineReader for BufLines<R> {
    fn read_line(
        &mut self,
        prompt: &str,
        stdout: &mut dyn Write,
    ) -> Result<Option<String>, ReplError> {
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        // Raw bytes: invalid UTF-8 in the input is not a read error.
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let mut line = String::from_utf8_lossy(&buf).into_owned();
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }
}

/// Line editor with history for terminals.
pub struct EditorLines {
    editor: DefaultEditor,
}

impl EditorLines {
    pub fn new() -> anyhow::Result<Self> {
        let editor = DefaultEditor::new().context("failed to initialise line editor")?;
        Ok(Self { editor })
    }
}

impl LineReader for EditorLines {
    fn read_line(
        &mut self,
        prompt: &str,
        _stdout: &mut dyn Write,
    ) -> Result<Option<String>, ReplError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            // Ctrl-C abandons the current line.
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Command runner: resolves names through a [`CommandRegistry`] and executes them
/// against an [`Environment`], once (batch mode) or in an interactive loop.
///
/// Example
/// ```no_run
/// use gosybox::Interpreter;
/// let mut sh = Interpreter::default();
/// let code = sh.run("ls", &["/tmp"]);
/// std::process::exit(code);
/// ```
pub struct Interpreter {
    env: Environment,
    registry: CommandRegistry,
}

impl Interpreter {
    pub fn new(env: Environment, registry: CommandRegistry) -> Self {
        Self { env, registry }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Look up `name` and run it synchronously.
    ///
    /// Returns `Ok(None)` after printing `Unknown command: <name>` when nothing is
    /// registered under `name`; no handler runs in that case.
    pub fn dispatch(
        &mut self,
        name: &str,
        args: &[&str],
        stdout: &mut dyn Write,
    ) -> Result<Option<Outcome>, CommandError> {
        let Some(factory) = self.registry.lookup(name) else {
            log::debug!("no command registered as '{name}'");
            writeln!(stdout, "Unknown command: {name}")?;
            return Ok(None);
        };

        log::debug!("dispatching {name} {args:?}");
        let cmd = factory.create(args);
        let outcome = cmd.execute(stdout, &mut self.env, &self.registry)?;
        Ok(Some(outcome))
    }

    /// Batch mode on the process's standard streams.
    pub fn run(&mut self, name: &str, args: &[&str]) -> ExitCode {
        let mut stdout = io::stdout().lock();
        let mut stderr = io::stderr().lock();
        let code = self.run_with(name, args, &mut stdout, &mut stderr);
        let _ = stdout.flush();
        code
    }

    /// Run a single command and return the status the process should exit with.
    pub fn run_with(
        &mut self,
        name: &str,
        args: &[&str],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> ExitCode {
        match self.dispatch(name, args, stdout) {
            Ok(Some(outcome)) => outcome.exit_code(),
            Ok(None) => {
                let _ = writeln!(stdout, "Use 'help' to see available commands.");
                let _ = writeln!(
                    stdout,
                    "Run without arguments or with '-i' to enter interactive mode."
                );
                1
            }
            Err(e) => report(&e, stderr),
        }
    }

    /// Interactive loop on the process's standard streams.
    ///
    /// Uses a line editor when standard input is a terminal and plain buffered reads
    /// otherwise.
    pub fn repl(&mut self) -> ExitCode {
        let mut stdout = io::stdout();
        let mut stderr = io::stderr();

        if io::stdin().is_terminal() {
            match EditorLines::new() {
                Ok(mut editor) => return self.repl_with(&mut editor, &mut stdout, &mut stderr),
                Err(e) => log::warn!("{e:#}; falling back to plain input"),
            }
        }
        let mut lines = BufLines::new(io::stdin().lock());
        self.repl_with(&mut lines, &mut stdout, &mut stderr)
    }

    /// Read-eval loop over `reader` until `exit`/`quit`, end of input, or a fatal error.
    pub fn repl_with(
        &mut self,
        reader: &mut dyn LineReader,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> ExitCode {
        match self.session(reader, stdout, stderr) {
            Ok(code) => code,
            Err(e) => {
                let _ = writeln!(stderr, "Error reading input: {e}");
                1
            }
        }
    }

    fn session(
        &mut self,
        reader: &mut dyn LineReader,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
    ) -> Result<ExitCode, ReplError> {
        writeln!(stdout, "gosybox interactive mode")?;
        writeln!(
            stdout,
            "Type 'help' for available commands, 'exit' or 'quit' to exit"
        )?;

        while let Some(line) = reader.read_line(PROMPT, stdout)? {
            let mut parts = line.split_whitespace();
            let Some(name) = parts.next() else {
                continue;
            };
            let args: Vec<&str> = parts.collect();

            if name == "exit" || name == "quit" {
                writeln!(stdout, "Goodbye!")?;
                return Ok(0);
            }

            match self.dispatch(name, &args, stdout) {
                Ok(Some(Outcome::Done(_))) => {}
                Ok(Some(Outcome::Terminate(code))) => return Ok(code),
                Ok(None) => writeln!(stdout, "Type 'help' to see available commands.")?,
                Err(e) => return Ok(report(&e, stderr)),
            }
        }

        // End of input.
        writeln!(stdout)?;
        Ok(0)
    }
}

impl Default for Interpreter {
    /// An interpreter over the current process environment with every built-in command.
    fn default() -> Self {
        Self::new(Environment::new(), CommandRegistry::default())
    }
}

fn report(err: &CommandError, stderr: &mut dyn Write) -> ExitCode {
    let _ = writeln!(stderr, "{err}");
    err.exit_code()
}
