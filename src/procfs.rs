//! `ps`: process listing read from the kernel's process pseudo-filesystem.

use crate::builtin::BuiltinCommand;
use crate::command::{CommandError, Outcome};
use crate::env::Environment;
use crate::registry::CommandRegistry;
use argh::FromArgs;
use regex::Regex;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::LazyLock;

/// Everything between the first `(` and the last `)` is the command name.
static STAT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^[^(]*\((.*)\)([^)]*)$").expect("valid stat regex"));

/// One row of `ps` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    pub command: String,
}

/// Fields extracted from a `<pid>/stat` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRecord {
    /// `None` when the record has no parenthesized command name.
    pub command: Option<String>,
    pub ppid: u32,
}

/// Parse a status record of the form `<pid> (<comm>) <state> <ppid> ...`.
///
/// Returns `None` when the parent PID is missing or not a number.
pub fn parse_status_record(text: &str) -> Option<StatusRecord> {
    if let Some(caps) = STAT_LINE.captures(text) {
        let ppid = caps[2].split_whitespace().nth(1)?.parse().ok()?;
        return Some(StatusRecord {
            command: Some(caps[1].to_string()),
            ppid,
        });
    }

    let ppid = text.split_whitespace().nth(3)?.parse().ok()?;
    Some(StatusRecord {
        command: None,
        ppid,
    })
}

/// Command names may hold arbitrary bytes; invalid UTF-8 is replaced, not rejected.
fn read_lossy(path: &Path) -> io::Result<String> {
    fs::read(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

fn fallback_command(pid_dir: &Path) -> String {
    read_lossy(&pid_dir.join("comm"))
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Read every process under `root`, sorted by PID.
///
/// Entries that are not numeric directories are ignored. Processes whose status
/// record is unreadable or unparseable are skipped: they usually exited between
/// enumeration and the read.
pub fn read_process_table(root: &Path) -> io::Result<Vec<ProcessRecord>> {
    let mut records = Vec::new();

    for entry in fs::read_dir(root)? {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let Some(pid) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) else {
            continue;
        };

        let pid_dir = entry.path();
        let stat = match read_lossy(&pid_dir.join("stat")) {
            Ok(stat) => stat,
            Err(e) => {
                log::debug!("skipping pid {pid}: {e}");
                continue;
            }
        };
        let Some(status) = parse_status_record(&stat) else {
            log::debug!("skipping pid {pid}: malformed stat record");
            continue;
        };

        let command = status
            .command
            .unwrap_or_else(|| fallback_command(&pid_dir));
        records.push(ProcessRecord {
            pid,
            ppid: status.ppid,
            command,
        });
    }

    records.sort_by_key(|r| r.pid);
    Ok(records)
}

#[derive(FromArgs)]
/// Display process status.
pub struct Ps {}

impl BuiltinCommand for Ps {
    fn name() -> &'static str {
        "ps"
    }

    fn description() -> &'static str {
        "Display process status"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError> {
        writeln!(stdout, "{:<8} {:<8} {}", "PID", "PPID", "CMD")?;
        writeln!(stdout, "{}", "-".repeat(60))?;

        let records =
            read_process_table(&env.proc_root).map_err(|source| CommandError::CannotAccess {
                command: Self::name(),
                path: env.proc_root.display().to_string(),
                source,
            })?;

        for r in records {
            writeln!(stdout, "{:<8} {:<8} {}", r.pid, r.ppid, r.command)?;
        }
        Ok(Outcome::Done(0))
    }
}
