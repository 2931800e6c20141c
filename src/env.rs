use std::collections::HashMap;
use std::env as stdenv;
use std::path::{Path, PathBuf};

/// Default location of the kernel's process pseudo-filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Runtime view of the process environment handed to every command.
///
/// The environment contains:
/// - `vars`: a snapshot of the process environment variables.
/// - `current_dir`: the directory `ls`/`lt` list by default and resolve relative paths against.
/// - `proc_root`: the process table root read by `ps`.
///
/// Fields are public so tests can point commands at fixtures directly.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub proc_root: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
        }
    }

    /// An environment with no variables rooted at `current_dir`.
    pub fn with_dir(current_dir: impl Into<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            current_dir: current_dir.into(),
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
        }
    }

    /// Get the value of an environment variable from the snapshot.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override an environment variable in the snapshot.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Resolve `path` against `current_dir` unless it is already absolute.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.current_dir.join(p)
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
