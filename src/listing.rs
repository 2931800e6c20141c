//! `ls` and `lt`: directory listings with per-entry metadata.

use crate::builtin::BuiltinCommand;
use crate::command::{CommandError, Outcome};
use crate::env::Environment;
use crate::registry::CommandRegistry;
use argh::FromArgs;
use chrono::{DateTime, Local};
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use std::time::SystemTime;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One directory entry as seen by the lister.
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    /// `None` when the metadata lookup failed, e.g. the entry vanished after enumeration.
    pub meta: Option<EntryMeta>,
}

#[derive(Debug, Clone)]
pub struct EntryMeta {
    pub size: u64,
    pub modified: SystemTime,
    pub permissions: String,
    pub uid: u32,
    pub gid: u32,
}

impl DirEntryInfo {
    /// Name as printed: directories get a trailing `/`.
    pub fn display_name(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn modified(&self) -> Option<SystemTime> {
        self.meta.as_ref().map(|m| m.modified)
    }
}

/// Render unix mode bits the way `ls -l` does, e.g. `drwxr-xr-x`.
pub fn permission_string(mode: u32) -> String {
    let kind = match mode & 0o170000 {
        0o040000 => 'd',
        0o120000 => 'l',
        0o020000 => 'c',
        0o060000 => 'b',
        0o010000 => 'p',
        0o140000 => 's',
        _ => '-',
    };

    let mut s = String::with_capacity(10);
    s.push(kind);
    // (read, write, exec, special bit, char when special+exec, char when special only)
    let triads = [
        (0o400, 0o200, 0o100, 0o4000, 's', 'S'),
        (0o040, 0o020, 0o010, 0o2000, 's', 'S'),
        (0o004, 0o002, 0o001, 0o1000, 't', 'T'),
    ];
    for (r, w, x, special, on, off) in triads {
        s.push(if mode & r != 0 { 'r' } else { '-' });
        s.push(if mode & w != 0 { 'w' } else { '-' });
        s.push(match (mode & x != 0, mode & special != 0) {
            (true, true) => on,
            (false, true) => off,
            (true, false) => 'x',
            (false, false) => '-',
        });
    }
    s
}

fn entry_meta(md: &fs::Metadata) -> io::Result<EntryMeta> {
    Ok(EntryMeta {
        size: md.len(),
        modified: md.modified()?,
        permissions: permission_string(md.permissions().mode()),
        uid: md.uid(),
        gid: md.gid(),
    })
}

/// Read every entry of `dir` in enumeration order.
///
/// Only opening the directory can fail. An entry the iterator cannot yield is
/// skipped; per-entry metadata failures are recorded in [`DirEntryInfo::meta`].
pub fn read_listing(dir: &Path) -> io::Result<Vec<DirEntryInfo>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let meta = match entry.metadata().and_then(|md| entry_meta(&md)) {
            Ok(meta) => Some(meta),
            Err(e) => {
                log::debug!("metadata for {} unavailable: {e}", entry.path().display());
                None
            }
        };
        entries.push(DirEntryInfo { name, is_dir, meta });
    }
    Ok(entries)
}

/// Stable sort, oldest first. Entries without a timestamp go first.
pub fn sort_by_mtime(entries: &mut [DirEntryInfo]) {
    entries.sort_by_key(DirEntryInfo::modified);
}

fn format_time(t: SystemTime) -> String {
    DateTime::<Local>::from(t).format(TIME_FORMAT).to_string()
}

fn render_table(entries: &[DirEntryInfo], stdout: &mut dyn Write) -> io::Result<()> {
    let header = format!(
        "{:<32} {:>10} {:<19} {:<10} {:>6} {:>6}",
        "Name", "Size", "ModTime", "Perms", "Owner", "Group"
    );
    writeln!(stdout, "{header}")?;
    writeln!(stdout, "{}", "-".repeat(header.len()))?;

    for entry in entries {
        let name = entry.display_name();
        match &entry.meta {
            Some(m) => writeln!(
                stdout,
                "{:<32} {:>10} {:<19} {:<10} {:>6} {:>6}",
                name,
                m.size,
                format_time(m.modified),
                m.permissions,
                m.uid,
                m.gid
            )?,
            None => writeln!(stdout, "{name} (error reading info)")?,
        }
    }
    Ok(())
}

fn render_names(entries: &[DirEntryInfo], stdout: &mut dyn Write) -> io::Result<()> {
    for entry in entries {
        writeln!(stdout, "{}", entry.display_name())?;
    }
    Ok(())
}

fn list(
    command: &'static str,
    path: Option<String>,
    short: bool,
    by_mtime: bool,
    stdout: &mut dyn Write,
    env: &Environment,
) -> Result<Outcome, CommandError> {
    let (shown, dir) = match path {
        Some(p) => {
            let dir = env.resolve(&p);
            (p, dir)
        }
        None => (".".to_string(), env.current_dir.clone()),
    };

    let mut entries = read_listing(&dir).map_err(|source| CommandError::CannotAccess {
        command,
        path: shown,
        source,
    })?;
    if by_mtime {
        sort_by_mtime(&mut entries);
    }

    if short {
        render_names(&entries, stdout)?;
    } else {
        render_table(&entries, stdout)?;
    }
    Ok(Outcome::Done(0))
}

#[derive(FromArgs)]
/// List directory contents.
pub struct Ls {
    #[argh(switch, short = 's')]
    /// print names only, without the metadata table.
    pub short: bool,

    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub path: Option<String>,
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn description() -> &'static str {
        "List directory contents"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError> {
        list(Self::name(), self.path, self.short, false, stdout, env)
    }
}

#[derive(FromArgs)]
/// List directory contents ordered by modification time, oldest first.
pub struct Lt {
    #[argh(switch, short = 's')]
    /// print names only, without the metadata table.
    pub short: bool,

    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub path: Option<String>,
}

impl BuiltinCommand for Lt {
    fn name() -> &'static str {
        "lt"
    }

    fn description() -> &'static str {
        "List directory contents and order by modification time"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        env: &mut Environment,
        _registry: &CommandRegistry,
    ) -> Result<Outcome, CommandError> {
        list(Self::name(), self.path, self.short, true, stdout, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn run_ls(cmd: impl BuiltinCommand, env: &mut Environment) -> Result<String, CommandError> {
        let registry = CommandRegistry::new();
        let mut out = Vec::new();
        cmd.execute(&mut out, env, &registry)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn touch(dir: &Path, name: &str, secs: u64) {
        let f = File::create(dir.join(name)).unwrap();
        f.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn rows(out: &str) -> Vec<&str> {
        out.lines().skip(2).collect()
    }

    fn row_names(out: &str) -> Vec<&str> {
        rows(out)
            .into_iter()
            .map(|l| l.split_whitespace().next().unwrap())
            .collect()
    }

    #[test]
    fn test_permission_string() {
        assert_eq!(permission_string(0o100644), "-rw-r--r--");
        assert_eq!(permission_string(0o040755), "drwxr-xr-x");
        assert_eq!(permission_string(0o120777), "lrwxrwxrwx");
        assert_eq!(permission_string(0o104755), "-rwsr-xr-x");
        assert_eq!(permission_string(0o041777), "drwxrwxrwt");
        assert_eq!(permission_string(0o102640), "-rw-r-S---");
    }

    #[test]
    fn test_ls_one_row_per_entry() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.txt", 1_000);
        touch(tmp.path(), "b.txt", 2_000);
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let mut env = Environment::with_dir(tmp.path());
        let out = run_ls(Ls { short: false, path: None }, &mut env).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("Name"));
        for col in ["Size", "ModTime", "Perms", "Owner", "Group"] {
            assert!(lines[0].contains(col));
        }
        assert!(lines[1].chars().all(|c| c == '-'));

        let mut names = row_names(&out);
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub/"]);

        let sub = rows(&out).into_iter().find(|l| l.starts_with("sub/")).unwrap();
        let fields: Vec<&str> = sub.split_whitespace().collect();
        // name, size, date, time, perms, owner, group
        assert_eq!(fields.len(), 7);
        assert!(fields[4].starts_with('d'));
        assert_eq!(fields[2].len(), "YYYY-MM-DD".len());
        assert_eq!(fields[3].len(), "HH:MM:SS".len());
    }

    #[test]
    fn test_ls_empty_directory_prints_header_only() {
        let tmp = TempDir::new().unwrap();
        let mut env = Environment::with_dir("/");
        let path = tmp.path().to_string_lossy().into_owned();
        let out = run_ls(Ls { short: false, path: Some(path) }, &mut env).unwrap();
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_ls_short_marks_directories() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "file", 0);
        fs::create_dir(tmp.path().join("dir")).unwrap();

        let mut env = Environment::with_dir(tmp.path());
        let out = run_ls(Ls { short: true, path: None }, &mut env).unwrap();
        let mut names: Vec<&str> = out.lines().collect();
        names.sort();
        assert_eq!(names, vec!["dir/", "file"]);
    }

    #[test]
    fn test_ls_relative_path_resolves_against_current_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("inner")).unwrap();
        touch(&tmp.path().join("inner"), "x", 0);

        let mut env = Environment::with_dir(tmp.path());
        let out = run_ls(Ls { short: true, path: Some("inner".into()) }, &mut env).unwrap();
        assert_eq!(out, "x\n");
    }

    #[test]
    fn test_ls_missing_directory_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut env = Environment::with_dir(tmp.path());
        let err = run_ls(Ls { short: false, path: Some("missing".into()) }, &mut env).unwrap_err();
        assert!(matches!(err, CommandError::CannotAccess { command: "ls", .. }));
        assert!(err.to_string().starts_with("ls: cannot access 'missing': "));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_lt_sorts_oldest_first() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "newest", 30_000);
        touch(tmp.path(), "oldest", 10_000);
        touch(tmp.path(), "middle", 20_000);

        let mut env = Environment::with_dir(tmp.path());
        let out = run_ls(Lt { short: false, path: None }, &mut env).unwrap();
        assert_eq!(row_names(&out), vec!["oldest", "middle", "newest"]);
    }

    #[test]
    fn test_lt_is_stable_for_equal_mtimes() {
        let tmp = TempDir::new().unwrap();
        for name in ["c", "a", "e", "b", "d"] {
            touch(tmp.path(), name, 5_000);
        }
        touch(tmp.path(), "old", 1_000);

        let enumerated: Vec<String> = read_listing(tmp.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .filter(|n| n != "old")
            .collect();

        let mut env = Environment::with_dir(tmp.path());
        let out = run_ls(Lt { short: true, path: None }, &mut env).unwrap();
        let names: Vec<String> = out.lines().map(String::from).collect();
        assert_eq!(names[0], "old");
        assert_eq!(names[1..].to_vec(), enumerated);
    }

    #[test]
    fn test_lt_missing_directory_names_lt() {
        let mut env = Environment::with_dir("/");
        let err = run_ls(
            Lt { short: false, path: Some("/definitely/not/here".into()) },
            &mut env,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("lt: cannot access '/definitely/not/here': "));
    }

    #[test]
    fn test_unreadable_entry_gets_error_line() {
        let entries = vec![
            DirEntryInfo {
                name: "gone".into(),
                is_dir: true,
                meta: None,
            },
            DirEntryInfo {
                name: "here".into(),
                is_dir: false,
                meta: Some(EntryMeta {
                    size: 12,
                    modified: SystemTime::UNIX_EPOCH,
                    permissions: "-rw-r--r--".into(),
                    uid: 1000,
                    gid: 100,
                }),
            },
        ];
        let mut out = Vec::new();
        render_table(&entries, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let rows = rows(&out);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "gone/ (error reading info)");
        let fields: Vec<&str> = rows[1].split_whitespace().collect();
        assert_eq!(fields[0], "here");
        assert_eq!(fields[1], "12");
        assert_eq!(&fields[4..], ["-rw-r--r--", "1000", "100"]);
    }

    #[test]
    fn test_ls_keeps_a_row_for_entries_without_metadata() {
        let tmp = TempDir::new().unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        touch(&locked, "one", 0);
        fs::create_dir(locked.join("two")).unwrap();

        // Readable but not searchable: names enumerate, stat fails.
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o444)).unwrap();
        let stat_blocked = fs::symlink_metadata(locked.join("one")).is_err();

        let mut env = Environment::with_dir(tmp.path());
        let out = run_ls(Ls { short: false, path: Some("locked".into()) }, &mut env);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let out = out.unwrap();
        let mut rows = rows(&out);
        assert_eq!(rows.len(), 2);
        // Privileged users bypass the permission check.
        if stat_blocked {
            rows.sort();
            assert_eq!(rows, vec!["one (error reading info)", "two/ (error reading info)"]);
        }
    }

    #[test]
    fn test_sort_puts_unreadable_entries_first() {
        let with_time = |name: &str, secs: u64| DirEntryInfo {
            name: name.into(),
            is_dir: false,
            meta: Some(EntryMeta {
                size: 0,
                modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
                permissions: String::new(),
                uid: 0,
                gid: 0,
            }),
        };
        let mut entries = vec![
            with_time("b", 2),
            DirEntryInfo { name: "x".into(), is_dir: false, meta: None },
            with_time("a", 1),
        ];
        sort_by_mtime(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["x", "a", "b"]);
    }
}
