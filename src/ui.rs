// UI layer: the start screen (login/quit) and the interactive browse
// prompt, built on `dialoguer`. Command execution itself lives in `shell`.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::{Completion, History, Input, Password, Select};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::auth;
use crate::command::{Command, COMMANDS};
use crate::config::Config;
use crate::cursor::DirectoryCursor;
use crate::entry::DirectoryListing;
use crate::remote::RemoteClient;
use crate::shell::{self, Flow, SessionEnd};

const MAX_HISTORY: usize = 500;

/// Run the program until the user quits: log in (or reuse a stored token),
/// browse, and come back to the start screen after `switch`.
pub fn run(mut config: Config) -> Result<()> {
    let mut history = FileHistory::open(config.history_path.clone());

    loop {
        let token = match auth::current_token(&config)? {
            Some(token) => token,
            None => match start_screen(&config)? {
                Some(token) => token,
                None => return Ok(()),
            },
        };

        let client = ApiClient::new(&config, &token).context("Failed to build HTTP client")?;
        let mut cursor = match DirectoryCursor::open(client) {
            Ok(cursor) => cursor,
            Err(e) => {
                // usually an expired or revoked token
                println!("Could not open drive: {e}");
                warn!(error = %e, "opening root folder failed");
                auth::remove_token(&config.token_path)?;
                config.access_token = None;
                continue;
            }
        };

        match browse(&mut cursor, &mut history)? {
            SessionEnd::Quit => return Ok(()),
            SessionEnd::LoggedOut => {
                auth::remove_token(&config.token_path)?;
                config.access_token = None;
                info!("logged out");
            }
        }
    }
}

/// Start screen shown while logged out. Returns the new token, or `None`
/// when the user chose to quit.
fn start_screen(config: &Config) -> Result<Option<String>> {
    let items = ["login", "quit"];
    loop {
        let selection = Select::new()
            .with_prompt("GDrive ∞")
            .items(&items)
            .default(0)
            .interact()?;
        if selection != 0 {
            return Ok(None);
        }

        let token: String = Password::new()
            .with_prompt("Access token")
            .interact()?;
        let token = token.trim().to_string();
        if token.is_empty() {
            println!("Invalid input");
            continue;
        }
        auth::persist_token(&config.token_path, &token)?;
        return Ok(Some(token));
    }
}

/// Prompt, parse and execute until the session ends.
fn browse<C: RemoteClient>(
    cursor: &mut DirectoryCursor<C>,
    history: &mut FileHistory,
) -> Result<SessionEnd> {
    let stdout = io::stdout();
    loop {
        let completer = NameCompleter::new(cursor.current_listing());
        let line: String = Input::new()
            .with_prompt(format!("GDrive ∞/{}", cursor.current_path()))
            .allow_empty(true)
            .history_with(&mut *history)
            .completion_with(&completer)
            .interact_text()?;

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let mut out = stdout.lock();
        if let Flow::End(end) = shell::execute(cursor, command, &mut out)? {
            return Ok(end);
        }
        out.flush()?;
    }
}

/// Prompt history kept in memory and appended to a file, so earlier
/// sessions' commands are available with the arrow keys. The file is
/// compacted to the newest `MAX_HISTORY` lines on open and whenever it
/// grows past twice that.
pub struct FileHistory {
    path: PathBuf,
    /// Newest first.
    entries: VecDeque<String>,
    file_lines: usize,
}

impl FileHistory {
    /// Load history from `path`. A missing or unreadable file starts empty.
    pub fn open(path: PathBuf) -> Self {
        let lines: Vec<String> = fs::read_to_string(&path)
            .map(|data| {
                data.lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let file_lines = lines.len();
        let entries: VecDeque<String> = lines.into_iter().rev().take(MAX_HISTORY).collect();

        let mut history = Self {
            path,
            entries,
            file_lines,
        };
        if file_lines > MAX_HISTORY {
            history.compact();
        }
        history
    }

    /// Rewrite the file with just the in-memory entries, oldest first.
    fn compact(&mut self) {
        let mut content = String::new();
        for entry in self.entries.iter().rev() {
            content.push_str(entry);
            content.push('\n');
        }
        match fs::write(&self.path, content) {
            Ok(()) => self.file_lines = self.entries.len(),
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not compact history"),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl History<String> for FileHistory {
    fn read(&self, pos: usize) -> Option<String> {
        self.entries.get(pos).cloned()
    }

    fn write(&mut self, val: &String) {
        if val.trim().is_empty() || self.entries.front() == Some(val) {
            return;
        }
        self.entries.push_front(val.clone());
        self.entries.truncate(MAX_HISTORY);

        let appended = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{val}"));
        match appended {
            Ok(()) => self.file_lines += 1,
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not save history"),
        }
        if self.file_lines > 2 * MAX_HISTORY {
            self.compact();
        }
    }
}

/// Tab completion over command words (first word) and the current
/// folder's entry names (arguments).
pub struct NameCompleter {
    names: Vec<String>,
}

impl NameCompleter {
    pub fn new(listing: &DirectoryListing) -> Self {
        Self {
            names: listing.names().map(str::to_string).collect(),
        }
    }
}

impl Completion for NameCompleter {
    fn get(&self, input: &str) -> Option<String> {
        match input.split_once(' ') {
            None => COMMANDS
                .iter()
                .map(|(word, _, _)| *word)
                .find(|word| word.starts_with(input) && *word != input)
                .map(str::to_string),
            Some((word, partial)) => {
                let partial = partial.trim_start();
                self.names
                    .iter()
                    .find(|name| name.starts_with(partial) && name.as_str() != partial)
                    .map(|name| format!("{word} {name}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use tempfile::TempDir;

    #[test]
    fn completes_command_words() {
        let completer = NameCompleter::new(&DirectoryListing::new());
        assert_eq!(completer.get("dow").as_deref(), Some("download"));
        assert_eq!(completer.get("ls"), None);
        assert_eq!(completer.get("zzz"), None);
    }

    #[test]
    fn completes_entry_names() {
        let listing: DirectoryListing = vec![
            Entry::new("1", "Quarterly Report", "application/pdf"),
            Entry::new("2", "Photos", "application/vnd.google-apps.folder"),
        ]
        .into_iter()
        .collect();
        let completer = NameCompleter::new(&listing);

        assert_eq!(completer.get("cd Ph").as_deref(), Some("cd Photos"));
        assert_eq!(
            completer.get("download Quar").as_deref(),
            Some("download Quarterly Report")
        );
        assert_eq!(completer.get("cd Photos"), None);
    }

    #[test]
    fn history_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");

        let mut history = FileHistory::open(path.clone());
        assert_eq!(history.len(), 0);
        history.write(&"ls".to_string());
        history.write(&"cd Reports".to_string());
        history.write(&"cd Reports".to_string());
        history.write(&"  ".to_string());

        let reopened = FileHistory::open(path);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.read(0).as_deref(), Some("cd Reports"));
        assert_eq!(reopened.read(1).as_deref(), Some("ls"));
        assert_eq!(reopened.read(2), None);
    }

    fn file_line_count(path: &std::path::Path) -> usize {
        fs::read_to_string(path).unwrap().lines().count()
    }

    #[test]
    fn oversized_history_file_is_trimmed_on_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        let lines: Vec<String> = (0..MAX_HISTORY + 100).map(|i| format!("cd f{i}")).collect();
        fs::write(&path, lines.join("\n")).unwrap();

        let history = FileHistory::open(path.clone());

        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(file_line_count(&path), MAX_HISTORY);
        let newest = format!("cd f{}", MAX_HISTORY + 99);
        assert_eq!(history.read(0).as_deref(), Some(newest.as_str()));
        assert_eq!(fs::read_to_string(&path).unwrap().lines().last(), Some(newest.as_str()));
    }

    #[test]
    fn history_file_stays_bounded_while_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        let mut history = FileHistory::open(path.clone());

        for i in 0..3 * MAX_HISTORY {
            history.write(&format!("typeof n{i}"));
            assert!(file_line_count(&path) <= 2 * MAX_HISTORY);
        }

        let reopened = FileHistory::open(path);
        let newest = format!("typeof n{}", 3 * MAX_HISTORY - 1);
        assert_eq!(reopened.read(0).as_deref(), Some(newest.as_str()));
        assert_eq!(reopened.len(), MAX_HISTORY);
    }
}
